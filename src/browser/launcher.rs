use std::path::Path;

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use tracing::{debug, error, info};

use crate::browser::drive_events;
use crate::config::Config;

/// 启动浏览器并打开空白页
///
/// 下载目录会被写入浏览器的下载设置，下载时不再弹出保存对话框
pub async fn launch_browser(config: &Config) -> Result<(Browser, Page)> {
    info!("🚀 启动浏览器...");

    let mut builder = BrowserConfig::builder().args(vec![
        "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-dev-shm-usage", // 防止共享内存不足
        "--disable-gpu",
    ]);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        // 有界面模式，便于人工处理验证码
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("浏览器路径: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    drive_events(handler).await;

    allow_downloads(&browser, &config.download_dir).await?;

    let page = browser
        .new_page("about:blank")
        .await
        .context("创建页面失败")?;

    Ok((browser, page))
}

/// 允许下载并指定下载目录（CDP `Browser.setDownloadBehavior`）
pub async fn allow_downloads(browser: &Browser, download_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(download_dir)
        .await
        .with_context(|| format!("无法创建下载目录: {}", download_dir.display()))?;
    let download_dir = download_dir
        .canonicalize()
        .with_context(|| format!("无法解析下载目录: {}", download_dir.display()))?;

    let params = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(download_dir.to_string_lossy().to_string())
        .build()
        .map_err(|e| anyhow::anyhow!("构造下载设置失败: {}", e))?;
    browser.execute(params).await.context("设置下载目录失败")?;

    info!("📁 浏览器下载目录: {}", download_dir.display());
    Ok(())
}
