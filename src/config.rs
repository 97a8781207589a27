use std::net::SocketAddr;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 运行记录存放目录
    pub data_dir: String,
    /// 题目参考答案文件（JSON: taskId -> 参考答案）
    pub answer_key_file: String,
    /// 测试用例文件（JSON 数组）
    pub test_cases_file: String,
    /// Bearer 凭证文件（TOML）
    pub credentials_file: String,
    /// 列表接口返回的最近运行记录数量
    pub recent_runs_limit: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            data_dir: "data".to_string(),
            answer_key_file: "config/answers.json".to_string(),
            test_cases_file: "tests/test_cases.json".to_string(),
            credentials_file: "config/credentials.toml".to_string(),
            recent_runs_limit: 50,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(default.bind_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(default.data_dir),
            answer_key_file: std::env::var("ANSWER_KEY_FILE").unwrap_or(default.answer_key_file),
            test_cases_file: std::env::var("TEST_CASES_FILE").unwrap_or(default.test_cases_file),
            credentials_file: std::env::var("CREDENTIALS_FILE").unwrap_or(default.credentials_file),
            recent_runs_limit: std::env::var("RECENT_RUNS_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.recent_runs_limit),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 解析监听地址
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.bind_addr.parse().map_err(|_| {
            AppError::Config(ConfigError::InvalidBindAddr {
                value: self.bind_addr.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lists_fifty_recent_runs() {
        assert_eq!(Config::default().recent_runs_limit, 50);
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8000);

        let bad = Config {
            bind_addr: "not-an-addr".to_string(),
            ..Config::default()
        };
        assert!(matches!(bad.socket_addr(), Err(AppError::Config(_))));
    }
}
