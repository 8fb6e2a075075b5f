//! 页面快照模型
//!
//! 浏览器端 JS 把结果表格序列化为这些结构，解析逻辑全部在 Rust 侧完成

use serde::{Deserialize, Serialize};

/// 单元格中的链接
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub href: String,
    #[serde(default)]
    pub text: String,
    /// `title` 属性，部分站点把完整名称放在这里
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCell {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub links: Vec<PageLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// 表头行（`tr.colhead` 或包含 `th`）
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub cells: Vec<ResultCell>,
}

/// 已加载的结果页
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsPage {
    /// 页面当前地址，用于解析相对链接
    pub url: String,
    /// `None` 表示页面上没有结果表格
    pub table: Option<Vec<ResultRow>>,
}
