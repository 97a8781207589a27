use agent_testbed::{logger, App, Config};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(&config);

    // 初始化并运行服务
    App::initialize(config).await?.run().await
}
