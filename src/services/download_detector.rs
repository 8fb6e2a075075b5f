//! 下载完成检测服务 - 业务能力层
//!
//! 站点不会告诉我们下载是否完成，只能通过下载目录的变化推断：
//! 触发下载前拍一次快照，之后按固定间隔重新拍快照并做差，
//! 第一个新出现（或修改时间更晚）的文件即视为下载结果。
//!
//! 已知的不精确之处：
//! - 同一目录里无关的写入也会被当成下载结果
//! - 默认不检查文件是否写完；配置 `settle` 后会在间隔前后比较一次文件大小

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::DetectError;
use crate::infrastructure::PageDriver;
use crate::models::{DownloadOutcome, PageLink};
use crate::services::snapshot::DirectorySnapshot;
use crate::utils::wait_for;

/// 在详情页上查找下载链接
#[derive(Debug, Clone)]
pub struct TriggerLocator {
    download: Regex,
    with_id: Regex,
    timeout: Duration,
}

impl TriggerLocator {
    pub fn new(download_pattern: &str, id_pattern: &str, timeout: Duration) -> Result<Self, regex::Error> {
        Ok(Self {
            download: Regex::new(download_pattern)?,
            with_id: Regex::new(id_pattern)?,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, regex::Error> {
        Self::new(
            &config.site.download_pattern,
            &config.site.download_id_pattern,
            config.trigger_timeout(),
        )
    }

    /// 先立即查找一次，找不到再在限定时间内轮询
    pub async fn locate<D>(&self, driver: &D) -> Result<Url, DetectError>
    where
        D: PageDriver + ?Sized,
    {
        if let Some(url) = self.pick_from(driver).await {
            return Ok(url);
        }
        debug!("下载链接尚未出现，最多等待 {:?}", self.timeout);
        wait_for(self.timeout, move || self.pick_from(driver))
            .await
            .ok_or(DetectError::TriggerNotFound)
    }

    async fn pick_from<D>(&self, driver: &D) -> Option<Url>
    where
        D: PageDriver + ?Sized,
    {
        match driver.anchors().await {
            Ok(anchors) => self.pick(&anchors),
            Err(e) => {
                debug!("读取页面链接失败: {:#}", e);
                None
            }
        }
    }

    /// 带 id 参数的下载链接优先，其次任意匹配下载特征的链接
    pub fn pick(&self, anchors: &[PageLink]) -> Option<Url> {
        let candidates: Vec<Url> = anchors
            .iter()
            .filter(|a| self.download.is_match(&a.href))
            .filter_map(|a| Url::parse(&a.href).ok())
            .collect();

        candidates
            .iter()
            .find(|url| self.with_id.is_match(url.as_str()))
            .or_else(|| candidates.first())
            .cloned()
    }
}

/// 下载完成检测器
#[derive(Debug, Clone)]
pub struct DownloadDetector {
    poll_interval: Duration,
    budget: Duration,
    settle: Option<Duration>,
}

impl DownloadDetector {
    pub fn new(poll_interval: Duration, budget: Duration) -> Self {
        Self {
            poll_interval,
            budget,
            settle: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval(), config.download_budget()).with_settle(config.settle())
    }

    /// 接受候选文件前，间隔 `settle` 比较两次文件大小
    pub fn with_settle(mut self, settle: Option<Duration>) -> Self {
        self.settle = settle;
        self
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// 轮询目录直到出现新文件、超时、出错或被取消
    pub async fn await_completion(
        &self,
        dir: &Path,
        baseline: &DirectorySnapshot,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        match self.wait_for_new_file(dir, baseline, cancel).await {
            Ok(file) => {
                info!("✓ 检测到下载文件: {}", file.display());
                DownloadOutcome::success(file)
            }
            Err(e) => {
                warn!("下载检测失败: {}", e);
                DownloadOutcome::failure(e.to_string())
            }
        }
    }

    async fn wait_for_new_file(
        &self,
        dir: &Path,
        baseline: &DirectorySnapshot,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DetectError> {
        let deadline = Instant::now() + self.budget;
        let mut polls = 0usize;

        loop {
            polls += 1;
            let current = DirectorySnapshot::capture(dir).await?;
            let changed = baseline.changed_in(&current);

            if let Some((name, _)) = changed.first() {
                debug!("第 {} 次轮询发现 {} 个新文件，选择 {}", polls, changed.len(), name);
                let path = dir.join(name);
                if self.is_settled(&path, cancel).await? {
                    return Ok(path);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("轮询 {} 次后超时", polls);
                return Err(DetectError::Timeout);
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(DetectError::Cancelled),
                _ = sleep(self.poll_interval.min(deadline - now)) => {}
            }
        }
    }

    /// 未配置 settle 时直接接受；否则要求两次采样大小一致
    async fn is_settled(&self, path: &Path, cancel: &CancellationToken) -> Result<bool, DetectError> {
        let Some(settle) = self.settle else {
            return Ok(true);
        };

        let Some(first) = file_size(path).await? else {
            return Ok(false);
        };
        tokio::select! {
            _ = cancel.cancelled() => return Err(DetectError::Cancelled),
            _ = sleep(settle) => {}
        }
        let second = file_size(path).await?;

        let settled = second == Some(first);
        if !settled {
            debug!("{} 仍在写入 ({} -> {:?})", path.display(), first, second);
        }
        Ok(settled)
    }
}

async fn file_size(path: &Path) -> Result<Option<u64>, DetectError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata.len())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DetectError::filesystem(path.display().to_string(), e)),
    }
}
