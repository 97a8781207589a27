use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 测试用例：起始页面 + 任务提示词
///
/// 输出为 camelCase；测试用例文件沿用 snake_case 字段名，两种写法都能读取
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "starting_url")]
    pub starting_url: String,
    #[serde(default, alias = "task_prompt")]
    pub task_prompt: String,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TestCase {
    pub fn new(id: impl Into<String>, starting_url: impl Into<String>, task_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            starting_url: starting_url.into(),
            task_prompt: task_prompt.into(),
            created_at: None,
        }
    }

    /// 拼接完整的起始 URL
    ///
    /// 绝对地址原样返回，相对路径拼接到 `base` 之后
    pub fn resolve_url(&self, base: &str) -> String {
        let url = self.starting_url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", base.trim_end_matches('/'), url)
        }
    }
}
