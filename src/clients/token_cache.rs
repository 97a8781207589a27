/// 命令行凭证缓存
///
/// 在本地 JSON 文件中保存 `{ "token": "..." }`，读取时跳过已过期的凭证
use crate::error::{AppError, AppResult};
use crate::services::auth::token_expired;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    token: String,
}

/// 凭证缓存
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取未过期的凭证；文件缺失、损坏或凭证过期时返回 `None`
    pub fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let cached: CachedToken = match serde_json::from_str(&content) {
            Ok(cached) => cached,
            Err(e) => {
                warn!("⚠️ 凭证文件格式错误，需要重新登录: {}", e);
                return None;
            }
        };

        if cached.token.is_empty() {
            return None;
        }
        if token_expired(&cached.token, Utc::now().timestamp()) {
            warn!("⚠️ 已保存的凭证已过期，需要重新登录");
            return None;
        }
        Some(cached.token)
    }

    /// 保存凭证
    pub fn save(&self, token: &str) -> AppResult<()> {
        let content = serde_json::to_string_pretty(&CachedToken {
            token: token.to_string(),
        })
        .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        std::fs::write(&self.path, content)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        info!("凭证已保存至: {}", self.path.display());
        Ok(())
    }
}
