use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Run the real extractors against the uploaded bytes.
    Native,
    /// Skip extraction and synthesize text from the file metadata.
    Placeholder,
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "local" => Ok(Self::Native),
            "placeholder" | "production" => Ok(Self::Placeholder),
            other => Err(format!("unknown extraction mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub exam_language: String,
    pub extraction_mode: ExtractionMode,
    pub pdftotext_path: String,
    pub extraction_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub max_content_chars: usize,
    pub generation_max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub shuffle_options: bool,
    pub grading_concurrency: usize,
    pub public_rps: u32,
    pub static_dir: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8000".to_string(),
            llm_api_key: None,
            llm_base_url: "https://api.groq.com/openai/v1".to_string(),
            llm_model: "llama-3.3-70b-versatile".to_string(),
            llm_timeout_secs: 120,
            exam_language: "Spanish".to_string(),
            extraction_mode: ExtractionMode::Native,
            pdftotext_path: "pdftotext".to_string(),
            extraction_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
            max_content_chars: 6000,
            generation_max_attempts: 3,
            retry_backoff_ms: 250,
            shuffle_options: false,
            grading_concurrency: 4,
            public_rps: 20,
            static_dir: None,
            log_format: LogFormat::Pretty,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let llm_api_key = get_env_opt("LLM_API_KEY").or_else(|| get_env_opt("GROQ_API_KEY"));

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", defaults.server_address),
            llm_api_key,
            llm_base_url: get_env_or("LLM_BASE_URL", defaults.llm_base_url),
            llm_model: get_env_or("LLM_MODEL", defaults.llm_model),
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            exam_language: get_env_or("EXAM_LANGUAGE", defaults.exam_language),
            extraction_mode: get_env_parse_or("EXTRACTION_MODE", defaults.extraction_mode)?,
            pdftotext_path: get_env_or("PDFTOTEXT_PATH", defaults.pdftotext_path),
            extraction_timeout_secs: get_env_parse_or(
                "EXTRACTION_TIMEOUT_SECS",
                defaults.extraction_timeout_secs,
            )?,
            max_upload_bytes: get_env_parse_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_content_chars: get_env_parse_or("MAX_CONTENT_CHARS", defaults.max_content_chars)?,
            generation_max_attempts: get_env_parse_or(
                "GENERATION_MAX_ATTEMPTS",
                defaults.generation_max_attempts,
            )?
            .max(1),
            retry_backoff_ms: get_env_parse_or("RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
            shuffle_options: get_env_parse_or("SHUFFLE_OPTIONS", defaults.shuffle_options)?,
            grading_concurrency: get_env_parse_or(
                "GRADING_CONCURRENCY",
                defaults.grading_concurrency,
            )?
            .max(1),
            public_rps: get_env_parse_or("PUBLIC_RPS", defaults.public_rps)?,
            static_dir: get_env_opt("STATIC_DIR"),
            log_format: get_env_parse_or("LOG_FORMAT", defaults.log_format)?,
        })
    }

    pub fn has_llm_key(&self) -> bool {
        self.llm_api_key.is_some()
    }
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_or(name: &str, default: String) -> String {
    get_env_opt(name).unwrap_or(default)
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<&'static Config> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    get_config()
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
