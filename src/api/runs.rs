//! 运行记录与看板接口（均需 Bearer 凭证）

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::Utc;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::AppResult;
use crate::models::{Run, RunPayload};
use crate::utils::logging::log_totals;
use crate::workflow::{view_stream, DashboardView};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RunsResponse {
    pub runs: Vec<Run>,
}

/// POST /api/runs
///
/// 同一 id 重复上传会覆盖原记录
pub async fn upload_run(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RunPayload>, JsonRejection>,
) -> AppResult<Json<UploadResponse>> {
    let user = state.authenticate(&headers)?;
    let Json(payload) = payload?;
    let run = payload.into_run(Utc::now())?;

    state.store.upsert(&user, &run).await?;
    info!("✓ 收到运行记录: 用户 {} | {} | {:?}", user, run.id, run.status);

    Ok(Json(UploadResponse { ok: true, id: run.id }))
}

/// GET /api/runs
pub async fn list_runs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<RunsResponse>> {
    let user = state.authenticate(&headers)?;
    let runs = state.store.list_recent(&user, state.recent_limit).await?;
    Ok(Json(RunsResponse { runs }))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<DashboardView>> {
    let user = state.authenticate(&headers)?;
    let runs = state.store.list_recent(&user, state.recent_limit).await?;
    let view = DashboardView::build(&state.test_cases.cases, &runs);
    log_totals(&user, &view.correlation.totals);
    Ok(Json(view))
}

/// GET /api/dashboard/stream
///
/// 每次该用户的运行记录变化时推送一个完整的看板视图
pub async fn dashboard_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let user = state.authenticate(&headers)?;
    let receiver = state.store.subscribe(&user).await?;
    info!("📡 看板订阅建立: 用户 {}", user);

    let stream = view_stream(receiver, state.test_cases.cases.clone())
        .map(|view| Event::default().event("dashboard").json_data(view));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
