//! Bearer 凭证校验
//!
//! 凭证文件为 TOML：
//!
//! ```toml
//! [[tokens]]
//! token = "..."
//! user_id = "alice"
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, AuthError};

/// 判定为过期前预留的秒数
const EXPIRY_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    tokens: Vec<CredentialEntry>,
}

#[derive(Debug, Deserialize)]
struct CredentialEntry {
    token: String,
    user_id: String,
}

/// 已签发凭证表（token -> 用户ID）
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    tokens: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// 从 TOML 文本解析
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let file: CredentialsFile =
            toml::from_str(content).map_err(|e| AppError::file_parse_failed("credentials", e))?;
        Ok(Self::new(
            file.tokens
                .into_iter()
                .map(|entry| (entry.token, entry.user_id))
                .collect(),
        ))
    }

    /// 从 TOML 文件加载
    pub async fn load(path: &Path) -> AppResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let store = Self::from_toml(&content)?;
        info!("成功加载 {} 个访问凭证", store.tokens.len());
        Ok(store)
    }

    /// 校验 Authorization 头，返回对应的用户ID
    pub fn authenticate(&self, authorization: Option<&str>) -> AppResult<String> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::MissingCredential)?;

        let user_id = self.tokens.get(token).ok_or_else(|| {
            warn!("⚠️ 拒绝无效凭证");
            AuthError::InvalidCredential
        })?;

        if is_jwt_shaped(token) && token_expired(token, Utc::now().timestamp()) {
            warn!("⚠️ 用户 {} 的凭证已过期", user_id);
            return Err(AuthError::ExpiredCredential.into());
        }

        debug!("鉴权通过: 用户 {}", user_id);
        Ok(user_id.clone())
    }
}

/// 提取 `Bearer <token>` 中的 token，scheme 不区分大小写
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn is_jwt_shaped(token: &str) -> bool {
    token.split('.').count() == 3
}

/// 检查 JWT 是否过期
///
/// 不是三段式、payload 无法解码、缺少 `exp` 都视为过期；
/// 距离 `exp` 不足 30 秒也视为过期
pub fn token_expired(token: &str, now_secs: i64) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return true;
    }

    let payload = parts[1].trim_end_matches('=');
    let Ok(decoded) = URL_SAFE_NO_PAD.decode(payload) else {
        return true;
    };
    let Ok(claims) = serde_json::from_slice::<serde_json::Value>(&decoded) else {
        return true;
    };

    match claims.get("exp").and_then(|exp| exp.as_f64()) {
        Some(exp) => now_secs as f64 > exp - EXPIRY_LEEWAY_SECS as f64,
        None => true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 构造一个未签名的 JWT，只用于测试过期判断
    pub(crate) fn jwt_with_exp(exp: Option<i64>) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = match exp {
            Some(exp) => format!(r#"{{"sub":"alice","exp":{}}}"#, exp),
            None => r#"{"sub":"alice"}"#.to_string(),
        };
        format!("{}.{}.sig", header, URL_SAFE_NO_PAD.encode(claims))
    }

    fn store() -> CredentialStore {
        CredentialStore::from_toml(
            r#"
            [[tokens]]
            token = "static-token"
            user_id = "alice"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_authenticate() {
        let store = store();
        assert_eq!(store.authenticate(Some("Bearer static-token")).unwrap(), "alice");
        assert!(matches!(
            store.authenticate(None),
            Err(AppError::Auth(AuthError::MissingCredential))
        ));
        assert!(matches!(
            store.authenticate(Some("Bearer other")),
            Err(AppError::Auth(AuthError::InvalidCredential))
        ));
    }

    #[test]
    fn test_authenticate_rejects_expired_jwt() {
        let expired = jwt_with_exp(Some(Utc::now().timestamp() - 60));
        let valid = jwt_with_exp(Some(Utc::now().timestamp() + 3600));
        let store = CredentialStore::new(
            [
                (expired.clone(), "alice".to_string()),
                (valid.clone(), "bob".to_string()),
            ]
            .into_iter()
            .collect(),
        );

        assert!(matches!(
            store.authenticate(Some(&format!("Bearer {}", expired))),
            Err(AppError::Auth(AuthError::ExpiredCredential))
        ));
        assert_eq!(store.authenticate(Some(&format!("Bearer {}", valid))).unwrap(), "bob");
    }

    #[test]
    fn test_token_expired() {
        let now = 1_700_000_000;
        assert!(!token_expired(&jwt_with_exp(Some(now + 120)), now));
        assert!(token_expired(&jwt_with_exp(Some(now + 10)), now));
        assert!(token_expired(&jwt_with_exp(Some(now - 1)), now));
        assert!(token_expired(&jwt_with_exp(None), now));
        assert!(token_expired("not-a-jwt", now));
        assert!(token_expired("a.!!!.c", now));
    }
}
