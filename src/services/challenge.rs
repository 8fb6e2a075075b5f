//! 验证码处理信号
//!
//! 登录时遇到验证码，流程会挂起，直到外部（人工）发出"已处理"信号

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::{SessionError, SessionResult};

/// 等待验证码被外部处理
///
/// 这是整个流程中唯一没有超时的等待
#[async_trait]
pub trait ChallengeSignal: Send + Sync {
    async fn wait_for_resolution(&self) -> SessionResult<()>;
}

/// 在终端提示操作员，按回车表示已完成
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSignal;

#[async_trait]
impl ChallengeSignal for ConsoleSignal {
    async fn wait_for_resolution(&self) -> SessionResult<()> {
        tokio::task::spawn_blocking(|| {
            print!("检测到验证码，请在浏览器中手动完成后按回车继续...");
            io::stdout().flush()?;
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            if read == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
            }
            Ok(())
        })
        .await
        .map_err(|e| SessionError::ChallengeAborted(e.to_string()))?
        .map_err(|e| SessionError::ChallengeAborted(e.to_string()))
    }
}

/// 通过 channel 接收信号，适合由其他组件（例如 Web 前端）通知
pub struct ChannelSignal {
    rx: Mutex<mpsc::Receiver<()>>,
}

impl ChannelSignal {
    /// 返回发送端和信号
    pub fn channel() -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(1);
        (tx, Self { rx: Mutex::new(rx) })
    }
}

#[async_trait]
impl ChallengeSignal for ChannelSignal {
    async fn wait_for_resolution(&self) -> SessionResult<()> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| SessionError::ChallengeAborted("signal channel closed".to_string()))
    }
}
