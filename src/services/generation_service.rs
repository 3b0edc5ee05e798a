use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::exam::ExamType;
use crate::models::question::{Question, QuestionType};
use crate::prompts::generation_prompt;
use crate::services::ai_service::{AIService, ChatOptions};
use crate::utils::json_repair;
use crate::utils::seed::rng_from_seed;
use crate::utils::text::truncate_chars;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub questions: Vec<Question>,
    pub source: QuestionSource,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct GenerationService {
    ai: AIService,
    language: String,
    max_attempts: u32,
    backoff: Duration,
    shuffle_options: bool,
}

impl GenerationService {
    pub fn new(config: &Config, ai: AIService) -> Self {
        Self {
            ai,
            language: config.exam_language.clone(),
            max_attempts: config.generation_max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
            shuffle_options: config.shuffle_options,
        }
    }

    /// Asks the LLM for questions, retrying malformed replies, and falls back
    /// to placeholder questions once every attempt has failed.
    pub async fn generate(
        &self,
        exam_type: ExamType,
        content: &str,
        seed: &str,
    ) -> Result<GenerationOutput> {
        if !self.ai.is_configured() {
            return Err(Error::MissingApiKey);
        }

        let count = exam_type.question_count();
        let prompt = generation_prompt(exam_type, count, seed, &self.language, content);

        for attempt in 1..=self.max_attempts {
            if attempt > 1 && !self.backoff.is_zero() {
                let wait = backoff_delay(self.backoff, attempt);
                tracing::info!(attempt, max = self.max_attempts, ?wait, "Retrying question generation");
                tokio::time::sleep(wait).await;
            }

            match self.attempt(&prompt, exam_type, count, attempt).await {
                Ok(mut questions) => {
                    if self.shuffle_options {
                        shuffle_options(&mut questions, seed);
                    }
                    tracing::info!(attempt, questions = questions.len(), "Questions generated");
                    return Ok(GenerationOutput {
                        questions,
                        source: QuestionSource::Llm,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt, max = self.max_attempts, error = %e, "Generation attempt failed");
                }
            }
        }

        tracing::warn!(?exam_type, "All generation attempts failed, using fallback questions");
        Ok(GenerationOutput {
            questions: fallback_questions(exam_type),
            source: QuestionSource::Fallback,
            attempts: self.max_attempts,
        })
    }

    async fn attempt(
        &self,
        prompt: &str,
        exam_type: ExamType,
        count: usize,
        attempt: u32,
    ) -> Result<Vec<Question>> {
        let text = self.ai.chat(prompt, ChatOptions::GENERATION).await?;
        tracing::debug!(attempt, preview = %truncate_chars(&text, 500), "Raw generation reply");
        parse_questions(&text, exam_type, count)
    }
}

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Wait before `attempt`: `base` doubled per retry after the second attempt,
/// capped at [`MAX_BACKOFF`].
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(2));
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

/// Repairs and coerces a raw reply. An empty result counts as a failure.
pub fn parse_questions(raw: &str, exam_type: ExamType, count: usize) -> Result<Vec<Question>> {
    let value = json_repair::parse_value(raw)?;
    let questions = sanitize_questions(&value, exam_type, count);
    if questions.is_empty() {
        return Err(Error::Upstream(
            "LLM reply contained no usable questions".to_string(),
        ));
    }
    Ok(questions)
}

pub fn sanitize_questions(raw: &JsonValue, exam_type: ExamType, count: usize) -> Vec<Question> {
    let items: &[JsonValue] = match raw.get("questions").and_then(|a| a.as_array()) {
        Some(arr) => arr,
        None => raw.as_array().map(Vec::as_slice).unwrap_or(&[]),
    };

    let mut questions: Vec<Question> = items
        .iter()
        .filter_map(|v| coerce_question(v, exam_type.question_type()))
        .take(count)
        .collect();

    for (idx, q) in questions.iter_mut().enumerate() {
        q.id = (idx as i32) + 1;
    }
    questions
}

fn coerce_question(v: &JsonValue, default_type: QuestionType) -> Option<Question> {
    let text = v.get("question").and_then(|s| s.as_str())?.trim();
    if text.is_empty() {
        return None;
    }

    let question_type = match v.get("type").and_then(|s| s.as_str()) {
        Some(raw) => parse_type(raw)?,
        None if v.get("options").map_or(false, JsonValue::is_array) => QuestionType::MultipleChoice,
        None => default_type,
    };

    let explanation = string_field(v, &["explanation"]).unwrap_or_default();

    match question_type {
        QuestionType::MultipleChoice => {
            let options: Vec<String> = v
                .get("options")
                .and_then(|o| o.as_array())?
                .iter()
                .map(|o| match o {
                    JsonValue::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|o| !o.is_empty())
                .collect();
            if options.len() < 2 {
                return None;
            }

            let raw_correct = v.get("correctAnswer").or_else(|| v.get("correct_answer"));
            let correct = raw_correct
                .and_then(|c| resolve_correct_index(c, &options))
                .unwrap_or(0);

            Some(Question::multiple_choice(0, text, options, correct, explanation))
        }
        QuestionType::Development => {
            let expected = string_field(v, &["expectedAnswer", "expected_answer", "correct_answer", "correctAnswer"]);
            Some(Question {
                id: 0,
                question: text.to_string(),
                question_type: QuestionType::Development,
                options: None,
                correct_answer: None,
                explanation,
                expected_answer: expected,
            })
        }
        QuestionType::Unknown => None,
    }
}

fn parse_type(raw: &str) -> Option<QuestionType> {
    match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "multiple-choice" | "test" | "mcq" => Some(QuestionType::MultipleChoice),
        "development" | "open-ended" | "short-answer" | "essay" => Some(QuestionType::Development),
        _ => None,
    }
}

fn string_field(v: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(*k).and_then(|s| s.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts an index, a numeric string, a letter (`"B"`, `"B) ..."`), or the
/// option text itself. Out-of-range answers resolve to `None`.
fn resolve_correct_index(raw: &JsonValue, options: &[String]) -> Option<i32> {
    let idx = match raw {
        JsonValue::Number(n) => n.as_i64()?,
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                n
            } else if let Some(pos) = options.iter().position(|o| o.eq_ignore_ascii_case(s)) {
                pos as i64
            } else {
                let mut chars = s.chars();
                let letter = chars.next()?.to_ascii_uppercase();
                let rest = chars.next();
                if !letter.is_ascii_uppercase() || !matches!(rest, None | Some(')') | Some('.')) {
                    return None;
                }
                (letter as u8 - b'A') as i64
            }
        }
        _ => return None,
    };

    (0..options.len() as i64).contains(&idx).then_some(idx as i32)
}

fn shuffle_options(questions: &mut [Question], seed: &str) {
    let mut rng = rng_from_seed(seed);
    for q in questions.iter_mut() {
        let Some(correct_text) = q.correct_answer.and_then(|c| q.option(c)).map(str::to_string) else {
            continue;
        };
        if let Some(options) = q.options.as_mut() {
            options.shuffle(&mut rng);
            q.correct_answer = options
                .iter()
                .position(|o| *o == correct_text)
                .map(|p| p as i32);
        }
    }
}

pub fn fallback_questions(exam_type: ExamType) -> Vec<Question> {
    let count = exam_type.question_count() as i32;
    match exam_type {
        ExamType::Test => (1..=count)
            .map(|i| {
                Question::multiple_choice(
                    i,
                    format!("Sample question {}: Which of the following statements is correct?", i),
                    vec![
                        "First answer option".to_string(),
                        "Second answer option".to_string(),
                        "Third answer option".to_string(),
                        "Fourth answer option".to_string(),
                    ],
                    0,
                    "This is a sample question generated automatically.",
                )
            })
            .collect(),
        ExamType::Development => (1..=count)
            .map(|i| {
                Question::development(
                    i,
                    format!(
                        "Open question {}: Analyze and explain in detail the main concepts of the document.",
                        i
                    ),
                    "A suitable answer should include clear definitions, relevant examples and connections between concepts.",
                    "A complete, well-founded answer that shows understanding of the topic is expected.",
                )
            })
            .collect(),
    }
}
