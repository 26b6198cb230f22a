/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::AppResult;

/// 初始化 tracing
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info。
/// 重复调用（例如多个测试）时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n出品自动填写记录 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 出品表单自动填写");
    info!("🌐 浏览器调试端口: {}", config.browser_debug_port);
    info!("📊 每次运行最多处理: {} 行", config.max_jobs);
    info!("📝 出品页面: {}", config.form_url);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
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
