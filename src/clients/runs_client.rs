/// 运行记录上传客户端
///
/// 供 agent 执行器把运行结果上传到看板服务
use crate::error::{ApiError, AppError, AppResult, AuthError};
use crate::models::{Run, RunPayload};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RunsResponse {
    runs: Vec<Run>,
}

/// 运行记录客户端
pub struct RunsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RunsClient {
    /// 创建新的客户端
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/runs", self.base_url)
    }

    /// 上传（或覆盖）一条运行记录
    pub async fn upload_run(&self, payload: &RunPayload) -> AppResult<()> {
        let endpoint = self.endpoint();
        debug!("上传运行记录 {:?} -> {}", payload.id, endpoint);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        check_status(&endpoint, response).await?;
        info!("✓ 运行记录已上传: {}", payload.id.as_deref().unwrap_or("<无ID>"));
        Ok(())
    }

    /// 获取最近的运行记录
    pub async fn list_runs(&self) -> AppResult<Vec<Run>> {
        let endpoint = self.endpoint();
        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(&endpoint, response).await?;
        let body: RunsResponse = response.json().await?;
        Ok(body.runs)
    }
}

async fn check_status(endpoint: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(AuthError::InvalidCredential.into());
    }

    let message = response.text().await.ok().filter(|body| !body.is_empty());
    Err(AppError::Api(ApiError::BadResponse {
        endpoint: endpoint.to_string(),
        code: Some(status.as_u16()),
        message,
    }))
}
