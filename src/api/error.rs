use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{AppError, RequestError};

/// 内部错误统一展示的提示
const RETRY_MESSAGE: &str = "服务暂时不可用，请稍后重试";

/// 错误响应体：`{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Request(e) => {
                warn!("⚠️ 拒绝请求: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Auth(e) => {
                warn!("⚠️ 鉴权失败: {}", e);
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            other => {
                error!("❌ 请求处理失败: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Request(RequestError::MalformedBody {
            message: rejection.body_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::missing_field("answer").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthError::ExpiredCredential)
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::llm_api_failed("gpt", "timeout")
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
