use crate::models::test_case::TestCase;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// 题目参考答案表（taskId -> 参考答案），启动时加载一次
#[derive(Debug, Clone, Default)]
pub struct AnswerKey {
    answers: HashMap<String, String>,
}

impl AnswerKey {
    pub fn new(answers: HashMap<String, String>) -> Self {
        Self { answers }
    }

    pub fn get(&self, task_id: &str) -> Option<&str> {
        self.answers.get(task_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(String, String)> for AnswerKey {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// 测试用例目录：原始文件内容（列表接口原样返回）+ 解析后的用例
#[derive(Debug, Clone, Default)]
pub struct TestCaseCatalog {
    pub raw: String,
    pub cases: Vec<TestCase>,
}

impl TestCaseCatalog {
    /// 从 JSON 文本解析
    ///
    /// 起始 URL 或提示词为空的条目会被跳过；缺少 id 的条目按位置编号为 `case-<n>`
    pub fn parse(raw: String) -> Result<Self> {
        let entries: Vec<TestCase> =
            serde_json::from_str(&raw).context("测试用例文件必须是 JSON 数组")?;

        let mut cases = Vec::with_capacity(entries.len());
        for (idx, mut case) in entries.into_iter().enumerate() {
            case.starting_url = case.starting_url.trim().to_string();
            case.task_prompt = case.task_prompt.trim().to_string();
            if case.starting_url.is_empty() || case.task_prompt.is_empty() {
                tracing::warn!("跳过第 {} 个测试用例: 缺少 starting_url 或 task_prompt", idx + 1);
                continue;
            }
            if case.id.trim().is_empty() {
                case.id = format!("case-{}", idx + 1);
            }
            cases.push(case);
        }

        Ok(Self { raw, cases })
    }
}

/// 从 JSON 文件加载参考答案表
pub async fn load_answer_key(path: &Path) -> Result<AnswerKey> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取答案文件: {}", path.display()))?;

    let answers: HashMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析答案文件: {}", path.display()))?;

    tracing::info!("成功加载 {} 道题目的参考答案", answers.len());
    Ok(AnswerKey::new(answers))
}

/// 从 JSON 文件加载测试用例
pub async fn load_test_cases(path: &Path) -> Result<TestCaseCatalog> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取测试用例文件: {}", path.display()))?;

    let catalog = TestCaseCatalog::parse(raw)
        .with_context(|| format!("无法解析测试用例文件: {}", path.display()))?;

    tracing::info!("成功加载 {} 个测试用例", catalog.cases.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_skips_incomplete_entries_and_numbers_ids() {
        let raw = r#"[
            {"starting_url": "/cases/cart.html", "task_prompt": "Add an item"},
            {"starting_url": "", "task_prompt": "no url"},
            {"id": "quiz", "starting_url": "/cases/quiz.html", "task_prompt": "Score 5/5"}
        ]"#
        .to_string();

        let catalog = TestCaseCatalog::parse(raw.clone()).unwrap();
        assert_eq!(catalog.raw, raw);
        assert_eq!(catalog.cases.len(), 2);
        assert_eq!(catalog.cases[0].id, "case-1");
        assert_eq!(catalog.cases[1].id, "quiz");
    }

    #[test]
    fn test_catalog_rejects_non_array() {
        assert!(TestCaseCatalog::parse("{\"a\": 1}".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_load_answer_key_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, r#"{"capital": "Paris", "sum": "42"}"#).unwrap();

        let key = load_answer_key(&path).await.unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(key.get("capital"), Some("Paris"));
        assert_eq!(key.get("missing"), None);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_test_cases(&dir.path().join("nope.json")).await.is_err());
    }
}
