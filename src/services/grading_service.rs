use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::answer::UserAnswer;
use crate::models::grade_result::GradeResult;
use crate::models::question::{Question, QuestionType};
use crate::prompts::grading_prompt;
use crate::services::ai_service::{AIService, ChatOptions};
use crate::utils::json_repair;
use crate::utils::text::word_count;
use futures::stream::{self, StreamExt};
use serde_json::Value as JsonValue;

pub const PASS_SCORE: u8 = 60;

const NO_ANSWER: &str = "No answer";
const CAUSAL_MARKERS: &[&str] = &["porque", "debido", "because", "due to"];
const EXAMPLE_MARKERS: &[&str] = &["ejemplo", "example"];

#[derive(Clone)]
pub struct GradingService {
    ai: AIService,
    language: String,
    concurrency: usize,
}

impl GradingService {
    pub fn new(config: &Config, ai: AIService) -> Self {
        Self {
            ai,
            language: config.exam_language.clone(),
            concurrency: config.grading_concurrency.max(1),
        }
    }

    /// Grades every question in order. Open-ended answers are evaluated
    /// concurrently; results keep the question order.
    pub async fn grade_exam(&self, questions: &[Question], answers: &[UserAnswer]) -> Vec<GradeResult> {
        let pending: Vec<_> = questions
            .iter()
            .map(|q| {
                let answer = answers.iter().find(|a| a.question_id == q.id);
                self.grade_question(q, answer)
            })
            .collect();

        stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn grade_question(&self, question: &Question, answer: Option<&UserAnswer>) -> GradeResult {
        match question.question_type {
            QuestionType::MultipleChoice => {
                grade_multiple_choice(question, answer).unwrap_or_else(|| unrecognized(question))
            }
            QuestionType::Development => self.grade_development(question, answer).await,
            QuestionType::Unknown => unrecognized(question),
        }
    }

    async fn grade_development(&self, question: &Question, answer: Option<&UserAnswer>) -> GradeResult {
        let text = answer.map(UserAnswer::text).unwrap_or("");
        if text.trim().is_empty() {
            return GradeResult {
                question_id: question.id,
                is_correct: false,
                user_answer: NO_ANSWER.to_string(),
                correct_answer: question
                    .expected_answer
                    .clone()
                    .unwrap_or_else(|| "Expected answer not available".to_string()),
                explanation: question.explanation.clone(),
                score: 0,
            };
        }

        if !self.ai.is_configured() {
            tracing::debug!(question_id = question.id, "No LLM key, grading heuristically");
            return heuristic_grade(question, text);
        }

        match self.evaluate(question, text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(question_id = question.id, error = %e, "LLM grading failed, using heuristic");
                heuristic_grade(question, text)
            }
        }
    }

    async fn evaluate(&self, question: &Question, text: &str) -> Result<GradeResult> {
        let reference = question
            .expected_answer
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&question.explanation);
        let prompt = grading_prompt(&question.question, reference, text, &self.language);

        let reply = self.ai.chat(&prompt, ChatOptions::GRADING).await?;
        let evaluation = json_repair::parse_value(&reply)?;
        let (score, is_correct, explanation) = read_evaluation(&evaluation)?;

        Ok(GradeResult {
            question_id: question.id,
            is_correct,
            user_answer: text.to_string(),
            correct_answer: question
                .expected_answer
                .clone()
                .unwrap_or_else(|| "See feedback".to_string()),
            explanation,
            score,
        })
    }
}

/// `None` when the question lacks options or a valid correct index.
pub fn grade_multiple_choice(question: &Question, answer: Option<&UserAnswer>) -> Option<GradeResult> {
    let correct_idx = question.correct_answer?;
    let correct_text = question.option(correct_idx)?;

    let selected = answer.and_then(|a| a.selected_option);
    let is_correct = selected == Some(correct_idx);
    let user_answer = selected
        .and_then(|s| question.option(s))
        .unwrap_or(NO_ANSWER)
        .to_string();

    Some(GradeResult {
        question_id: question.id,
        is_correct,
        user_answer,
        correct_answer: correct_text.to_string(),
        explanation: question.explanation.clone(),
        score: if is_correct { 100 } else { 0 },
    })
}

fn read_evaluation(v: &JsonValue) -> Result<(u8, bool, String)> {
    let raw_score = match v.get("score") {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Upstream("Grading reply has no score".to_string()))?;
    let score = raw_score.clamp(0.0, 100.0).round() as u8;

    let is_correct = v
        .get("isCorrect")
        .or_else(|| v.get("is_correct"))
        .and_then(JsonValue::as_bool)
        .unwrap_or(score >= PASS_SCORE);

    let feedback = v
        .get("feedback")
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .trim();
    let areas = v
        .get("areas_improvement")
        .or_else(|| v.get("areasImprovement"))
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .trim();

    let explanation = if areas.is_empty() {
        feedback.to_string()
    } else {
        format!("{}\n\nAreas for improvement: {}", feedback, areas)
    };
    Ok((score, is_correct, explanation))
}

/// Length and keyword score used when the LLM cannot grade.
pub fn heuristic_score(text: &str) -> u8 {
    let words = word_count(text);
    let lower = text.to_lowercase();
    let mut score = 0u8;

    if words >= 100 {
        score += 40;
    }
    if words >= 50 {
        score += 20;
    }
    if CAUSAL_MARKERS.iter().any(|m| lower.contains(m)) {
        score += 15;
    }
    if EXAMPLE_MARKERS.iter().any(|m| lower.contains(m)) {
        score += 15;
    }
    if text.chars().count() > 200 {
        score += 10;
    }
    score
}

pub fn heuristic_grade(question: &Question, text: &str) -> GradeResult {
    let score = heuristic_score(text);
    let is_correct = score >= PASS_SCORE;
    GradeResult {
        question_id: question.id,
        is_correct,
        user_answer: text.to_string(),
        correct_answer: question
            .expected_answer
            .clone()
            .unwrap_or_else(|| "See feedback".to_string()),
        explanation: format!(
            "Automatic evaluation: {}. The answer was assessed mainly on its length and structure.",
            if is_correct {
                "acceptable answer"
            } else {
                "needs more development"
            }
        ),
        score,
    }
}

fn unrecognized(question: &Question) -> GradeResult {
    GradeResult {
        question_id: question.id,
        is_correct: false,
        user_answer: "Unrecognized question type".to_string(),
        correct_answer: "Invalid question type".to_string(),
        explanation: "There was a problem processing this question.".to_string(),
        score: 0,
    }
}
