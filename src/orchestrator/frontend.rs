//! 前端接口
//!
//! 外部前端（终端或 Web）只需要这三个调用：初始化会话、搜索、下载

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::error::{SessionResult, WorkflowResult};
use crate::infrastructure::PageDriver;
use crate::models::{DownloadOutcome, DownloadRequest, SearchRecord};
use crate::workflow::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// 下载调用的返回，`message` 可以直接展示给用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontendResponse {
    pub status: ResponseStatus,
    pub message: String,
}

impl FrontendResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

impl From<DownloadOutcome> for FrontendResponse {
    fn from(outcome: DownloadOutcome) -> Self {
        if outcome.succeeded {
            match outcome.file_name() {
                Some(name) => Self::success(format!("Torrent downloaded: {}", name)),
                None => Self::success("Torrent downloaded"),
            }
        } else {
            Self::error(
                outcome
                    .reason
                    .unwrap_or_else(|| "Failed to download torrent".to_string()),
            )
        }
    }
}

pub struct Frontend<D> {
    workflow: Arc<Workflow<D>>,
    site: Url,
}

impl<D: PageDriver> Frontend<D> {
    pub fn new(workflow: Arc<Workflow<D>>, site: Url) -> Self {
        Self { workflow, site }
    }

    pub fn workflow(&self) -> &Arc<Workflow<D>> {
        &self.workflow
    }

    pub async fn init_session(&self) -> SessionResult<()> {
        self.workflow.ensure_session().await
    }

    pub async fn search(&self, query: &str) -> WorkflowResult<Vec<SearchRecord>> {
        Ok(self.workflow.search(query).await?.records)
    }

    pub async fn download(&self, details_url: &str) -> FrontendResponse {
        let request = match DownloadRequest::parse(details_url, &self.site) {
            Ok(request) => request,
            Err(e) => return FrontendResponse::error(e.to_string()),
        };
        self.workflow.download(&request).await.into()
    }
}
