//! # Agent Testbed
//!
//! 浏览器 agent 测试台：提供答题判分、测验评分，并收集 agent 的运行记录生成看板
//!
//! ## 架构设计
//!
//! ### ① 数据模型层（Models）
//! - `models/` - 运行记录、测试用例、项目，以及 JSON 文件加载器
//!
//! ### ② 业务能力层（Services）
//! - `AnswerGrader` - 借助 LLM 判断答案是否等价
//! - `ExamAnswers` - 五题测验的纯函数评分
//! - `correlator` - 按起始 URL 把运行记录归入测试用例
//! - `RunStore` - 按用户隔离的运行记录存储与快照订阅
//! - `CredentialStore` - Bearer 凭证校验
//! - `ClientStore` - 测试页面的键值状态（会话 / 持久）
//!
//! ### ③ 流程层（Workflow）
//! - `DashboardView` - 每次快照变化时重算看板
//!
//! ### ④ 接口层（API / Clients）
//! - `api/` - axum 路由
//! - `clients/` - agent 执行器使用的上传客户端与凭证缓存
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::{router, AppState};
pub use app::App;
pub use clients::{RunsClient, TokenCache};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Run, RunPayload, RunStatus, TestCase};
pub use services::{AnswerGrader, ChatModel, ExamAnswers, RunStore};
pub use workflow::DashboardView;
