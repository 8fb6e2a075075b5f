//! 下载流程 - 流程层
//!
//! 核心职责：按顺序编排 登录 → 搜索 → 选择 → 下载 → 确认
//!
//! 浏览器页面只有一个，所有操作在同一把锁内完成"导航 + 等待"，
//! 并发调用会被串行化。

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{DetectError, SessionResult, ValidationError, WorkflowResult};
use crate::infrastructure::{by_id, by_name, PageDriver};
use crate::models::{DownloadOutcome, DownloadRequest, ResultsPage, SearchResults};
use crate::services::{DirectorySnapshot, DownloadDetector, ResultParser, SessionDriver, TriggerLocator};
use crate::utils::logging::{log_outcome, log_search_results};
use crate::utils::wait_for;
use crate::workflow::phase::WorkflowPhase;

/// 锁内的可变状态
struct FlowState<D> {
    session: SessionDriver<D>,
    phase: WorkflowPhase,
}

impl<D> FlowState<D> {
    fn enter(&mut self, phase: WorkflowPhase) {
        debug!("workflow_phase={} (from {})", phase, self.phase);
        self.phase = phase;
    }
}

/// 下载流程
///
/// - 持有唯一的会话（以及它的页面）
/// - 校验错误不访问网络
/// - 搜索中的浏览器错误降级为空结果
/// - 下载的所有失败都以 `DownloadOutcome` 返回
pub struct Workflow<D> {
    state: Mutex<FlowState<D>>,
    parser: ResultParser,
    locator: TriggerLocator,
    detector: DownloadDetector,
    download_dir: PathBuf,
    search_timeout: Duration,
    results_wait: Duration,
}

impl<D: PageDriver> Workflow<D> {
    pub fn new(session: SessionDriver<D>, config: &Config) -> Result<Self> {
        Ok(Self {
            state: Mutex::new(FlowState {
                session,
                phase: WorkflowPhase::Idle,
            }),
            parser: ResultParser::new(&config.site.details_pattern)?,
            locator: TriggerLocator::from_config(config)?,
            detector: DownloadDetector::from_config(config),
            download_dir: config.download_dir.clone(),
            search_timeout: config.search_timeout(),
            results_wait: config.results_wait(),
        })
    }

    pub async fn phase(&self) -> WorkflowPhase {
        self.state.lock().await.phase
    }

    pub async fn is_alive(&self) -> bool {
        self.state.lock().await.session.is_alive()
    }

    /// 没有有效会话时登录，失败直接返回给调用方（不重试）
    pub async fn ensure_session(&self) -> SessionResult<()> {
        let mut state = self.state.lock().await;
        Self::ensure(&mut state).await
    }

    async fn ensure(state: &mut FlowState<D>) -> SessionResult<()> {
        if !state.session.is_alive() {
            if let Err(e) = state.session.establish().await {
                error!("❌ 登录失败: {}", e);
                state.enter(WorkflowPhase::Failed);
                return Err(e);
            }
        }
        state.enter(WorkflowPhase::SessionReady);
        Ok(())
    }

    /// 搜索
    ///
    /// 空查询立即返回校验错误；浏览器层超时或出错时返回空结果
    pub async fn search(&self, query: &str) -> WorkflowResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        let mut state = self.state.lock().await;
        Self::ensure(&mut state).await?;

        state.enter(WorkflowPhase::Searching);
        info!("🔍 搜索: {}", query);

        let page = match self.submit_search(&state.session, query).await {
            Ok(page) => page,
            Err(e) => {
                error!("搜索 '{}' 失败，返回空结果: {:#}", query, e);
                state.enter(WorkflowPhase::Failed);
                return Ok(SearchResults::default());
            }
        };

        if page.table.is_none() && state.session.is_login_page(&page.url) {
            state.session.invalidate();
        }

        let results = self.parser.report(&page);
        log_search_results(query, &results);
        state.enter(WorkflowPhase::ResultsReady);
        Ok(results)
    }

    async fn submit_search(&self, session: &SessionDriver<D>, query: &str) -> Result<ResultsPage> {
        let page = session.page();
        let layout = session.layout();
        let search_url = session.url_for(&layout.search_path)?;

        page.goto(search_url.as_str()).await?;

        // 会话过期时搜索页会被重定向到登录页，交给调用方使之失效
        let landed = page.current_url().await?;
        if session.is_login_page(&landed) {
            warn!("打开搜索页时被重定向到登录页: {}", landed);
            return Ok(ResultsPage {
                url: landed,
                table: None,
            });
        }

        let search_field = by_name(&layout.search_field);
        if !self.wait_until_present(page, &search_field, self.search_timeout).await {
            bail!("搜索框在 {:?} 内没有出现", self.search_timeout);
        }

        let before = page.current_url().await?;
        page.fill(&search_field, query).await?;
        page.click(&layout.search_submit_selector).await?;

        let before = before.as_str();
        let navigated = wait_for(self.search_timeout, move || async move {
            page.current_url().await.ok().filter(|url| url != before)
        })
        .await;
        if navigated.is_none() {
            bail!("提交搜索后页面在 {:?} 内没有跳转", self.search_timeout);
        }

        let container = by_id(&layout.results_container_id);
        if !self.wait_until_present(page, &container, self.results_wait).await {
            warn!("结果页上没有找到 #{}", layout.results_container_id);
        }

        page.results_table(&layout.results_container_id).await
    }

    async fn wait_until_present(&self, page: &D, selector: &str, timeout: Duration) -> bool {
        wait_for(timeout, move || async move {
            page.exists(selector).await.ok().filter(|found| *found)
        })
        .await
        .is_some()
    }

    /// 下载（不可取消）
    pub async fn download(&self, request: &DownloadRequest) -> DownloadOutcome {
        self.download_with_cancel(request, &CancellationToken::new()).await
    }

    /// 下载，`cancel` 被触发时停止轮询（例如调用方已断开）
    pub async fn download_with_cancel(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        // 只允许打开详情页，其他站内地址（例如退出登录）不做任何导航
        if !self.parser.is_details(request.detail_locator.as_str()) {
            let err = ValidationError::InvalidLocator(request.detail_locator.to_string());
            warn!("拒绝下载请求: {}", err);
            return DownloadOutcome::failure(err.to_string());
        }

        let mut state = self.state.lock().await;
        if let Err(e) = Self::ensure(&mut state).await {
            return DownloadOutcome::failure(e.to_string());
        }

        state.enter(WorkflowPhase::Downloading);
        info!("⬇️ 下载: {}", request.detail_locator);

        let outcome = self.run_download(&mut state.session, request, cancel).await;
        log_outcome(&outcome);
        state.enter(if outcome.succeeded {
            WorkflowPhase::Completed
        } else {
            WorkflowPhase::Failed
        });
        outcome
    }

    async fn run_download(
        &self,
        session: &mut SessionDriver<D>,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let page = session.page();
        if let Err(e) = page.goto(request.detail_locator.as_str()).await {
            return DownloadOutcome::failure(format!("Failed to open details page: {:#}", e));
        }

        let landed = match page.current_url().await {
            Ok(url) => url,
            Err(e) => return DownloadOutcome::failure(format!("Failed to read page location: {:#}", e)),
        };
        if session.is_login_page(&landed) {
            session.invalidate();
            return DownloadOutcome::failure("Session expired: redirected to the login page");
        }
        if !self.landed_on(&landed, &request.detail_locator) {
            warn!("详情页被重定向: {} -> {}", request.detail_locator, landed);
            return DownloadOutcome::failure(format!("Unexpected redirect to {}", landed));
        }

        let trigger = match self.locator.locate(page).await {
            Ok(trigger) => trigger,
            Err(e) => return DownloadOutcome::failure(e.to_string()),
        };
        debug!("下载链接: {}", trigger);

        let baseline = match prepare_directory(&self.download_dir).await {
            Ok(baseline) => baseline,
            Err(e) => return DownloadOutcome::failure(e.to_string()),
        };

        if let Err(e) = page.click_anchor(trigger.as_str()).await {
            return DownloadOutcome::failure(format!("Failed to start download: {:#}", e));
        }

        self.detector
            .await_completion(&self.download_dir, &baseline, cancel)
            .await
    }

    /// 落地页必须是详情页，且与请求的是同一个条目
    fn landed_on(&self, landed: &str, expected: &Url) -> bool {
        match Url::parse(landed) {
            Ok(url) => {
                self.parser.is_details(url.as_str())
                    && url.host_str() == expected.host_str()
                    && url.path() == expected.path()
                    && item_id(&url) == item_id(expected)
            }
            Err(_) => false,
        }
    }

    /// 关闭会话，之后不会再重新登录
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.session.close();
        state.enter(WorkflowPhase::Idle);
    }
}

fn item_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

/// 确保下载目录存在，并拍下基线快照
async fn prepare_directory(dir: &Path) -> Result<DirectorySnapshot, DetectError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DetectError::filesystem(dir.display().to_string(), e))?;
    DirectorySnapshot::capture(dir).await
}
