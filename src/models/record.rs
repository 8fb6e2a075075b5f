use std::path::PathBuf;

use serde::Serialize;
use url::Url;

use crate::error::ValidationError;

/// 一条搜索结果：标题 + 详情页地址
///
/// 顺序与结果表格的行顺序一致，标题不保证唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRecord {
    pub title: String,
    #[serde(rename = "details_url")]
    pub detail_locator: Url,
}

/// 一次搜索的结果及诊断信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub records: Vec<SearchRecord>,
    /// 被跳过的数据行数量
    pub skipped: usize,
    /// 页面上是否找到了结果表格（区分"没有匹配"和"页面结构不对"）
    pub container_found: bool,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// 下载请求，只在一次调用内存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub detail_locator: Url,
}

impl DownloadRequest {
    /// 校验调用方给出的详情页地址：非空、可解析、属于配置的站点
    pub fn parse(raw: &str, site: &Url) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        let detail_locator = site
            .join(raw)
            .map_err(|_| ValidationError::InvalidLocator(raw.to_string()))?;
        if !matches!(detail_locator.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidLocator(raw.to_string()));
        }
        if detail_locator.host_str() != site.host_str() {
            return Err(ValidationError::ForeignLocator(raw.to_string()));
        }
        Ok(Self { detail_locator })
    }
}

/// 一次下载尝试的最终结果，不会自动重试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub succeeded: bool,
    pub reason: Option<String>,
    /// 检测到的新文件
    pub file: Option<PathBuf>,
}

impl DownloadOutcome {
    pub fn success(file: PathBuf) -> Self {
        Self {
            succeeded: true,
            reason: None,
            file: Some(file),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reason: Some(reason.into()),
            file: None,
        }
    }

    pub fn file_name(&self) -> Option<String> {
        self.file
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// 按用户输入的序号（从 1 开始）选择搜索结果
pub fn select_record<'a>(
    records: &'a [SearchRecord],
    choice: &str,
) -> Result<&'a SearchRecord, ValidationError> {
    let choice = choice.trim();
    if choice.is_empty() {
        return Err(ValidationError::EmptySelection);
    }
    let number: usize = choice
        .parse()
        .map_err(|_| ValidationError::InvalidSelection(choice.to_string()))?;
    number
        .checked_sub(1)
        .and_then(|idx| records.get(idx))
        .ok_or_else(|| ValidationError::InvalidSelection(choice.to_string()))
}
