pub mod connection;
pub mod launcher;

use std::time::Duration;

use anyhow::Result;
use chromiumoxide::handler::Handler;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tracing::warn;

use crate::config::Config;

pub use connection::connect_to_browser_and_page;
pub use launcher::{allow_downloads, launch_browser};

/// 按配置连接已有浏览器或自行启动
pub async fn open_browser(config: &Config) -> Result<(Browser, Page)> {
    if config.browser_debug_port == 0 {
        launch_browser(config).await
    } else {
        connect_to_browser_and_page(config.browser_debug_port, &config.download_dir).await
    }
}

/// 在后台驱动 CDP 事件循环，handler 停止后浏览器上的所有调用都会失败
pub(crate) async fn drive_events(mut handler: Handler) {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("浏览器事件循环退出: {}", e);
                break;
            }
        }
    });

    // 等待浏览器状态同步
    tokio::time::sleep(Duration::from_millis(300)).await;
}
