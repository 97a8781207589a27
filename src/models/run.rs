use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failure,
    #[serde(alias = "in-progress")]
    InProgress,
    Queued,
}

impl RunStatus {
    /// 根据 agent 调用 finish 工具时给出的 reason 推断状态
    ///
    /// 以 "task success" / "success" 开头视为成功，以 "failure" 开头视为失败，
    /// 其余情况保持进行中
    pub fn from_finish_reason(reason: &str) -> Self {
        let reason = reason.trim().to_lowercase();
        if reason.starts_with("task success") || reason.starts_with("success") {
            RunStatus::Success
        } else if reason.starts_with("failure") {
            RunStatus::Failure
        } else {
            RunStatus::InProgress
        }
    }
}

/// 对话步骤的发言方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    User,
    Tool,
    #[serde(alias = "assistant", alias = "ai")]
    Model,
}

/// 多段内容中的单个片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base64: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// 无法识别的片段类型，原样忽略
    #[serde(other)]
    Unknown,
}

/// 步骤内容：纯文本或多段内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl StepContent {
    /// 拼接所有文本片段
    pub fn plain_text(&self) -> String {
        match self {
            StepContent::Text(text) => text.clone(),
            StepContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn image_count(&self) -> usize {
        match self {
            StepContent::Text(_) => 0,
            StepContent::Parts(parts) => parts
                .iter()
                .filter(|part| matches!(part, ContentPart::Image { .. }))
                .count(),
        }
    }
}

/// 工具调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// 对话记录中的一步
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptStep {
    pub role: StepRole,
    pub content: StepContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// 一次 agent 运行记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: String,
    pub url: String,
    pub prompt: String,
    pub status: RunStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub transcript: Vec<TranscriptStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

/// 上传接口的请求体，除 id/url/prompt/status 外均可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl RunPayload {
    /// 校验必填字段并转换为运行记录，未提供时间戳时使用 `now`
    pub fn into_run(self, now: DateTime<Utc>) -> AppResult<Run> {
        let id = required(self.id, "id")?;
        validate_document_id(&id, "id")?;
        let url = required(self.url, "url")?;
        let prompt = required(self.prompt, "prompt")?;
        let status = self.status.ok_or_else(|| AppError::missing_field("status"))?;

        Ok(Run {
            id,
            url,
            prompt,
            status,
            timestamp: self.timestamp.unwrap_or(now),
            transcript: self.transcript.unwrap_or_default(),
            project_id: non_blank(self.project_id),
            project_name: non_blank(self.project_name),
            repo_url: non_blank(self.repo_url),
        })
    }
}

impl From<&Run> for RunPayload {
    fn from(run: &Run) -> Self {
        Self {
            id: Some(run.id.clone()),
            url: Some(run.url.clone()),
            prompt: Some(run.prompt.clone()),
            status: Some(run.status),
            transcript: Some(run.transcript.clone()),
            timestamp: Some(run.timestamp),
            project_id: run.project_id.clone(),
            project_name: run.project_name.clone(),
            repo_url: run.repo_url.clone(),
        }
    }
}

/// 校验可用作文档文件名的标识符
///
/// 只允许 ASCII 字母数字与 `-` `_` `.`，且不能以 `.` 开头
pub fn validate_document_id(value: &str, field: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::missing_field(field));
    }
    if value.starts_with('.') {
        return Err(AppError::invalid_field(field, "不能以 '.' 开头"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(AppError::invalid_field(field, format!("包含非法字符 '{}'", c)));
    }
    Ok(())
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    non_blank(value).ok_or_else(|| AppError::missing_field(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
