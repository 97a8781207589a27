//! 答案评分服务 - 业务能力层
//!
//! 根据 taskId 查出参考答案，交给 LLM 判断提交的答案与参考答案是否等价

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, RequestError};
use crate::models::AnswerKey;
use crate::services::llm_service::ChatModel;
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "You are a strict grader. You decide whether a submitted answer \
is semantically equivalent to a reference answer. Ignore differences in formatting, casing, \
word order and units spelled differently, but do not accept answers that change the meaning.";

/// 评分请求（对应答题表单）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

impl GradeRequest {
    pub fn new(answer: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            task_id: Some(task_id.into()),
        }
    }

    /// 两个字段都非空时才允许提交
    pub fn is_complete(&self) -> bool {
        filled(&self.answer).is_some() && filled(&self.task_id).is_some()
    }
}

/// LLM 结构化判定结果
#[derive(Debug, Deserialize)]
struct Verdict {
    #[serde(alias = "ok", alias = "match")]
    equivalent: bool,
}

/// 答案评分服务
pub struct AnswerGrader {
    answers: AnswerKey,
    model: Arc<dyn ChatModel>,
}

impl AnswerGrader {
    pub fn new(answers: AnswerKey, model: Arc<dyn ChatModel>) -> Self {
        Self { answers, model }
    }

    /// 评分
    ///
    /// # 返回
    /// - `Ok(true)` / `Ok(false)`: LLM 的判定
    /// - `Err(AppError::Request)`: 缺少字段或 taskId 未知
    /// - `Err(AppError::Llm)`: LLM 调用失败
    pub async fn grade(&self, request: &GradeRequest) -> AppResult<bool> {
        let answer = filled(&request.answer).ok_or_else(|| AppError::missing_field("answer"))?;
        let task_id = filled(&request.task_id).ok_or_else(|| AppError::missing_field("taskId"))?;

        let reference = self.answers.get(task_id).ok_or_else(|| {
            warn!("⚠️ 未知的题目ID: {}", task_id);
            AppError::Request(RequestError::UnknownTask {
                task_id: task_id.to_string(),
            })
        })?;

        debug!(
            "评分题目 {}: 提交答案 '{}'",
            task_id,
            truncate_text(answer, 80)
        );

        let prompt = build_prompt(task_id, reference, answer);
        let response = self
            .model
            .complete(SYSTEM_MESSAGE, &prompt)
            .await
            .map_err(|e| {
                error!("❌ 评分失败，LLM 调用出错: {}", e);
                AppError::llm_api_failed(self.model.model_name(), e)
            })?;

        let verdict = parse_verdict(&response);
        info!("✓ 题目 {} 评分完成: {}", task_id, if verdict { "正确" } else { "错误" });
        Ok(verdict)
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 构建比较提示词
fn build_prompt(task_id: &str, reference: &str, answer: &str) -> String {
    format!(
        r#"Task: {task_id}

Reference answer:
{reference}

Submitted answer:
{answer}

Is the submitted answer semantically equivalent to the reference answer?
Reply with a single JSON object and nothing else:
{{"equivalent": true or false, "reason": "<one short sentence>"}}"#
    )
}

/// 解析 LLM 回复中的判定
///
/// 优先读取回复中的 JSON 对象；解析失败时按关键词判断，否定词优先，
/// 单独的 "no" 只在回复开头时算作否定
pub fn parse_verdict(response: &str) -> bool {
    if let Some(verdict) = structured_verdict(response) {
        return verdict;
    }

    debug!("无法解析结构化判定，回退到关键词匹配: '{}'", truncate_text(response, 120));

    let matches = |re: Option<&Regex>| re.is_some_and(|re| re.is_match(response));
    !matches(negative_re()) && matches(positive_re())
}

fn structured_verdict(response: &str) -> Option<bool> {
    static LAZY: OnceLock<Option<Regex>> = OnceLock::new();
    static GREEDY: OnceLock<Option<Regex>> = OnceLock::new();
    let lazy = LAZY.get_or_init(|| Regex::new(r"(?s)\{.*?\}").ok());
    let greedy = GREEDY.get_or_init(|| Regex::new(r"(?s)\{.*\}").ok());

    [lazy, greedy]
        .into_iter()
        .filter_map(|re| re.as_ref()?.find(response))
        .find_map(|m| serde_json::from_str::<Verdict>(m.as_str()).ok())
        .map(|v| v.equivalent)
}

fn negative_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*no\b|\b(not\s+equivalent|false|incorrect|different)\b").ok())
        .as_ref()
}

fn positive_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(equivalent|true|yes|correct|same)\b").ok())
        .as_ref()
}
