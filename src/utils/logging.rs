/// 日志工具模块
///
/// 提供启动横幅、统计输出和文本截断等辅助函数
use tracing::info;

use crate::config::Config;
use crate::services::correlator::Totals;

/// 记录服务启动信息
///
/// # 参数
/// - `config`: 当前配置
/// - `answers`: 已加载的参考答案数量
/// - `cases`: 已加载的测试用例数量
pub fn log_startup(config: &Config, answers: usize, cases: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 服务启动 - agent 测试台");
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("📁 数据目录: {}", config.data_dir);
    info!("📋 参考答案: {} 道 | 测试用例: {} 个", answers, cases);
    info!("🤖 判分模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录服务关闭信息
pub fn log_shutdown() {
    info!("\n{}", "─".repeat(60));
    info!("👋 收到退出信号，服务已停止");
    info!(
        "停止时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 打印运行统计
pub fn log_totals(user: &str, totals: &Totals) {
    info!(
        "📊 用户 {} | 共 {} 次运行 | ✅ 成功 {} | ❌ 失败 {} | 成功率 {}%",
        user, totals.total, totals.success, totals.failure, totals.success_rate
    );
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
