//! Prompt templates sent to the LLM.
//!
//! Every prompt lives here so handlers and services only pass data in.
//! Generation and grading prompts demand a bare JSON reply; the repair step
//! in [`crate::utils::json_repair`] copes with models that ignore that.

use crate::models::exam::ExamType;
use serde_json::json;

pub fn generation_prompt(
    exam_type: ExamType,
    count: usize,
    seed: &str,
    language: &str,
    content: &str,
) -> String {
    match exam_type {
        ExamType::Test => {
            let example = json!({
                "questions": [
                    {
                        "id": 1,
                        "question": "Which of the following...?",
                        "options": ["Option A", "Option B", "Option C", "Option D"],
                        "correctAnswer": 0,
                        "explanation": "This answer is correct because...",
                        "type": "multiple-choice"
                    },
                    {
                        "id": 2,
                        "question": "What is...?",
                        "options": ["First", "Second", "Third", "Fourth"],
                        "correctAnswer": 1,
                        "explanation": "The second option is correct because...",
                        "type": "multiple-choice"
                    }
                ]
            });
            format!(
                r#"Based on the following content extracted from a PDF, generate exactly {count} multiple-choice questions for a test-style exam.

IMPORTANT:
- Use this random seed to vary the questions: {seed}
- Generate different questions each time, covering different aspects of the content.
- Write every question, option and explanation in {language}.
- Reply ONLY with valid JSON, with no text before or after it.
- Do not use markdown, comments or extra explanations.

PDF content:
{content}

For each question provide:
1. The question
2. 4 answer options
3. The index of the correct option (0-3), varying its position between questions
4. An explanation of why that answer is correct
5. The type, which must be "multiple-choice"

Required JSON format (example with 2 questions, generate {count}):
{example}"#
            )
        }
        ExamType::Development => {
            let example = json!({
                "questions": [
                    {
                        "id": 1,
                        "question": "Analyze and explain in detail...",
                        "explanation": "The student is expected to develop...",
                        "expectedAnswer": "A complete answer must include...",
                        "type": "development"
                    },
                    {
                        "id": 2,
                        "question": "Build an argument about...",
                        "explanation": "The answer must show understanding of...",
                        "expectedAnswer": "An explanation covering...",
                        "type": "development"
                    }
                ]
            });
            format!(
                r#"Based on the following content extracted from a PDF, generate exactly {count} open-ended (essay) questions for an exam.

IMPORTANT:
- Use this random seed to vary the questions: {seed}
- Generate different questions each time that require elaborate, reflective answers.
- Write every question, answer and explanation in {language}.
- Reply ONLY with valid JSON, with no text before or after it.
- Do not use markdown, comments or extra explanations.

PDF content:
{content}

For each question provide:
1. The open-ended question (requiring an extended explanation)
2. A complete expected answer (used as a grading reference)
3. An explanation of the key points the answer must include
4. The type, which must be "development"

The questions should encourage critical analysis, synthesis of information,
application of concepts and development of arguments.

Required JSON format (example with 2 questions, generate {count}):
{example}"#
            )
        }
    }
}

pub fn grading_prompt(question: &str, reference: &str, answer: &str, language: &str) -> String {
    let example = json!({
        "score": 85,
        "isCorrect": true,
        "feedback": "Excellent answer that shows...",
        "areas_improvement": "To improve you could..."
    });
    format!(
        r#"You are an expert teacher grading an open-ended exam question.

QUESTION: {question}

EXPECTED ANSWER: {reference}

STUDENT ANSWER: {answer}

Evaluate the student's answer considering:
1. Conceptual accuracy (40%)
2. Completeness of the answer (30%)
3. Clarity and organization (20%)
4. Examples or applications (10%)

Provide:
- A score from 0 to 100
- Constructive feedback written in {language}
- Whether it is correct (score >= 60)

Reply ONLY with valid JSON:
{example}"#
    )
}

pub fn commentary_prompt(text: &str, language: &str) -> String {
    format!(
        r#"You are an expert in East Asian literature (China, Japan, Korea, Southeast Asia). Your task is to write a deep, academic literary commentary on the following text.

TEXT TO ANALYZE:
"{text}"

Write a complete literary commentary, in {language}, that covers:

1. THEMATIC ANALYSIS: the main and secondary themes and how they develop.
2. STYLE AND NARRATIVE TECHNIQUE: tone, register, literary devices, structure.
3. CULTURAL AND HISTORICAL CONTEXT: the Asian cultural setting and any historical, philosophical or cultural references.
4. INTERPRETATION AND MEANING: symbolism, allegory and the message of the text.
5. SPECIFIC FEATURES: traits typical of the country or region and philosophical influences (Confucianism, Buddhism, Taoism, etc.).

STYLE:
- Write naturally and fluently, like a teacher passionate about literature.
- Use academic but accessible language with smooth transitions between ideas.
- Vary sentence length and avoid formulaic repetition.

The commentary should be roughly 400-600 words."#
    )
}
