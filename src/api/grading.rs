//! 判分接口

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::{AppResult, RequestError};
use crate::services::{ExamAnswers, ExamScore, GradeRequest};

#[derive(Debug, Serialize)]
pub struct GradeResponse {
    pub ok: bool,
}

/// POST /api/grade
pub async fn grade(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GradeRequest>, JsonRejection>,
) -> AppResult<Json<GradeResponse>> {
    let Json(request) = payload?;
    let ok = state.grader.grade(&request).await?;
    Ok(Json(GradeResponse { ok }))
}

/// POST /api/exam/score
pub async fn score_exam(payload: Result<Json<ExamAnswers>, JsonRejection>) -> AppResult<Json<ExamScore>> {
    let Json(answers) = payload?;
    if !answers.is_complete() {
        return Err(RequestError::IncompleteSubmission.into());
    }

    let result = answers.score();
    info!("📝 测验评分: {}/{}", result.score, result.total);
    Ok(Json(result))
}
