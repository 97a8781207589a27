use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::config::Config;
use crate::models::{load_answer_key, load_test_cases};
use crate::services::{AnswerGrader, ChatModel, CredentialStore, LlmService, RunStore};
use crate::utils::logging::{log_shutdown, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    state: Arc<AppState>,
}

impl App {
    /// 初始化应用：加载答案、测试用例、凭证，打开运行记录存储
    pub async fn initialize(config: Config) -> Result<Self> {
        if config.llm_api_key.is_empty() {
            warn!("⚠️ 未设置 LLM_API_KEY，判分接口将无法调用模型");
        }
        let model: Arc<dyn ChatModel> = Arc::new(LlmService::new(&config));
        Self::with_model(config, model).await
    }

    /// 使用指定的判分模型初始化
    pub async fn with_model(config: Config, model: Arc<dyn ChatModel>) -> Result<Self> {
        let answers = load_answer_key(Path::new(&config.answer_key_file)).await?;
        let test_cases = load_test_cases(Path::new(&config.test_cases_file)).await?;
        let credentials = CredentialStore::load(Path::new(&config.credentials_file))
            .await
            .context("无法加载凭证文件")?;
        let store = RunStore::open(&config.data_dir, config.recent_runs_limit)
            .await
            .context("无法打开运行记录目录")?;

        log_startup(&config, answers.len(), test_cases.cases.len());

        let state = Arc::new(AppState {
            grader: AnswerGrader::new(answers, model),
            store,
            credentials,
            test_cases,
            recent_limit: config.recent_runs_limit,
        });

        Ok(Self { config, state })
    }

    /// 共享状态（供测试直接挂载路由）
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// 启动 HTTP 服务，收到 Ctrl-C 后优雅退出
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("无法监听地址: {}", addr))?;
        info!("✓ 服务已就绪: http://{}", listener.local_addr()?);

        axum::serve(listener, api::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        log_shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
}
