use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::dto::exam_dto::{GradeExamRequest, GradeExamResponse};
use crate::error::{Error, Result};
use crate::utils::validation::validate;
use crate::AppState;

pub async fn grade_exam(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GradeExamRequest>, JsonRejection>,
) -> Result<Json<GradeExamResponse>> {
    let Json(payload) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    validate(&payload)?;

    tracing::info!(
        questions = payload.questions.len(),
        answers = payload.user_answers.len(),
        "Grading exam"
    );

    let results = state
        .grading_service
        .grade_exam(&payload.questions, &payload.user_answers)
        .await;

    let correct = results.iter().filter(|r| r.is_correct).count();
    tracing::info!(correct, total = results.len(), "Exam graded");

    Ok(Json(GradeExamResponse { results }))
}
