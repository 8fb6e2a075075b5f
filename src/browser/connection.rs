use anyhow::Result;
use chromiumoxide::{Browser, Page};
use std::path::Path;
use tracing::{debug, error, info};

use crate::browser::drive_events;
use crate::browser::launcher::allow_downloads;

/// 连接到已启动的浏览器（远程调试端口）并打开新页面
pub async fn connect_to_browser_and_page(port: u16, download_dir: &Path) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    drive_events(handler).await;

    allow_downloads(&browser, download_dir).await?;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;

    Ok((browser, page))
}
