//! HTTP 接口层
//!
//! 所有路由共享一个只读的 `AppState`；写入都经由 `RunStore`

mod error;
mod grading;
mod runs;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::error::AppResult;
use crate::models::TestCaseCatalog;
use crate::services::{AnswerGrader, CredentialStore, RunStore};

pub use error::ErrorBody;

/// 路由共享状态
pub struct AppState {
    pub grader: AnswerGrader,
    pub store: RunStore,
    pub credentials: CredentialStore,
    pub test_cases: TestCaseCatalog,
    /// 列表与看板使用的最近运行记录数量
    pub recent_limit: usize,
}

impl AppState {
    /// 从请求头中解析出当前用户
    fn authenticate(&self, headers: &HeaderMap) -> AppResult<String> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.credentials.authenticate(authorization)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/grade", post(grading::grade))
        .route("/api/exam/score", post(grading::score_exam))
        .route("/api/runs", get(runs::list_runs).post(runs::upload_run))
        .route("/api/dashboard", get(runs::dashboard))
        .route("/api/dashboard/stream", get(runs::dashboard_stream))
        .route("/api/test-cases", get(test_cases))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// 原样返回测试用例文件
async fn test_cases(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.test_cases.raw.clone(),
    )
}
