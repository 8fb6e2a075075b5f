/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use anyhow::Result;
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::models::{DownloadOutcome, SearchResults};

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先；否则默认 `info`，详细模式下为 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n下载日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(base_url: &str, download_dir: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动");
    info!("🌐 站点: {}", base_url);
    info!("📁 下载目录: {}", download_dir);
    info!("{}", "=".repeat(60));
}

/// 记录搜索结果
pub fn log_search_results(query: &str, results: &SearchResults) {
    if !results.container_found {
        warn!("⚠️ 搜索 '{}' 的结果页上没有找到结果表格", query);
        return;
    }
    if results.skipped > 0 {
        info!("跳过了 {} 个无法解析的行", results.skipped);
    }
    info!("✓ 搜索 '{}' 找到 {} 个结果", query, results.len());
    for (i, record) in results.records.iter().enumerate() {
        info!("  {}. {}", i + 1, truncate_text(&record.title, 80));
    }
}

/// 记录下载结果
pub fn log_outcome(outcome: &DownloadOutcome) {
    if outcome.succeeded {
        info!(
            "✅ 下载完成: {}",
            outcome.file_name().unwrap_or_default()
        );
    } else {
        warn!(
            "❌ 下载失败: {}",
            outcome.reason.as_deref().unwrap_or("unknown")
        );
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
