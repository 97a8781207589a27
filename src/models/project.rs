use serde::{Deserialize, Serialize};

use crate::models::run::Run;

/// 未指定项目时归属的默认项目ID
pub const DEFAULT_PROJECT_ID: &str = "default";

/// 项目（仅从运行记录推断，不单独持久化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl Project {
    pub fn default_project() -> Self {
        Self {
            id: DEFAULT_PROJECT_ID.to_string(),
            name: "Default".to_string(),
            repo_url: None,
        }
    }

    /// 从运行记录推断所属项目
    pub fn from_run(run: &Run) -> Self {
        match project_id_of(run) {
            DEFAULT_PROJECT_ID => Self {
                repo_url: run.repo_url.clone(),
                ..Self::default_project()
            },
            id => Self {
                id: id.to_string(),
                name: run.project_name.clone().unwrap_or_else(|| id.to_string()),
                repo_url: run.repo_url.clone(),
            },
        }
    }
}

/// 运行记录所属项目ID，缺省时回落到默认项目
pub fn project_id_of(run: &Run) -> &str {
    run.project_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_PROJECT_ID)
}
