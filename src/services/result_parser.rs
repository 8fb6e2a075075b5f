//! 结果解析服务 - 业务能力层
//!
//! 把结果表格快照转换为 [`SearchRecord`] 序列，单行解析失败只跳过该行

use regex::Regex;
use tracing::debug;
use url::Url;

use crate::models::{PageLink, ResultRow, ResultsPage, SearchRecord, SearchResults};

/// 数据行被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 少于两列
    TooFewCells,
    /// 第二列没有指向详情页的链接
    NoDetailsLink,
    /// 标题为空
    EmptyTitle,
}

/// 结果解析器
///
/// 无内部可变状态，同一页面解析多次结果相同
#[derive(Debug, Clone)]
pub struct ResultParser {
    details: Regex,
}

impl ResultParser {
    pub fn new(details_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            details: Regex::new(details_pattern)?,
        })
    }

    /// 地址是否指向详情页
    pub fn is_details(&self, url: &str) -> bool {
        self.details.is_match(url)
    }

    /// 逐行解析（惰性），表头行不会出现在结果中
    ///
    /// 没有结果表格时返回空序列
    pub fn rows<'a>(
        &'a self,
        page: &'a ResultsPage,
    ) -> impl Iterator<Item = Result<SearchRecord, SkipReason>> + 'a {
        let base = Url::parse(&page.url).ok();
        page.table
            .iter()
            .flatten()
            .filter(|row| !row.header)
            .map(move |row| self.parse_row(row, base.as_ref()))
    }

    /// 只保留成功解析的记录
    pub fn parse<'a>(&'a self, page: &'a ResultsPage) -> impl Iterator<Item = SearchRecord> + 'a {
        self.rows(page).filter_map(|row| match row {
            Ok(record) => Some(record),
            Err(reason) => {
                debug!("跳过结果行: {:?}", reason);
                None
            }
        })
    }

    /// 解析并统计被跳过的行数
    pub fn report(&self, page: &ResultsPage) -> SearchResults {
        let mut results = SearchResults {
            container_found: page.table.is_some(),
            ..Default::default()
        };
        for row in self.rows(page) {
            match row {
                Ok(record) => results.records.push(record),
                Err(reason) => {
                    debug!("跳过结果行: {:?}", reason);
                    results.skipped += 1;
                }
            }
        }
        results
    }

    fn parse_row(&self, row: &ResultRow, base: Option<&Url>) -> Result<SearchRecord, SkipReason> {
        let cell = row.cells.get(1).ok_or(SkipReason::TooFewCells)?;

        let (link, detail_locator) = cell
            .links
            .iter()
            .filter(|link| self.details.is_match(&link.href))
            .find_map(|link| resolve(&link.href, base).map(|url| (link, url)))
            .ok_or(SkipReason::NoDetailsLink)?;

        let title = link_title(link);
        if title.is_empty() {
            return Err(SkipReason::EmptyTitle);
        }

        Ok(SearchRecord {
            title,
            detail_locator,
        })
    }
}

/// 链接文本优先，其次 `title` 属性
fn link_title(link: &PageLink) -> String {
    let text = link.text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    link.title.as_deref().map(str::trim).unwrap_or_default().to_string()
}

pub(crate) fn resolve(href: &str, base: Option<&Url>) -> Option<Url> {
    match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}
