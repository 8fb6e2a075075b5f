//! 页面驱动能力
//!
//! 服务层只依赖这个 trait，不直接接触 chromiumoxide，方便用脚本化的假页面测试

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{PageLink, ResultsPage};

/// 对一个浏览器标签页的最小操作集合
///
/// 所有操作共享同一个页面，调用方负责串行化
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定地址并等待加载
    async fn goto(&self, url: &str) -> Result<()>;

    /// 当前页面地址
    async fn current_url(&self) -> Result<String>;

    /// CSS 选择器是否匹配到元素（立即检查，不等待）
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// 清空并填写输入框
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// 提交元素所在的表单
    async fn submit(&self, selector: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// 把指定 id 的结果表格序列化为 [`ResultsPage`]
    async fn results_table(&self, container_id: &str) -> Result<ResultsPage>;

    /// 页面上所有带 href 的链接（绝对地址）
    async fn anchors(&self) -> Result<Vec<PageLink>>;

    /// 点击 href 完全一致的链接
    async fn click_anchor(&self, href: &str) -> Result<()>;
}

#[async_trait]
impl<T: PageDriver + ?Sized> PageDriver for Arc<T> {
    async fn goto(&self, url: &str) -> Result<()> {
        (**self).goto(url).await
    }

    async fn current_url(&self) -> Result<String> {
        (**self).current_url().await
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        (**self).exists(selector).await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        (**self).fill(selector, value).await
    }

    async fn submit(&self, selector: &str) -> Result<()> {
        (**self).submit(selector).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        (**self).click(selector).await
    }

    async fn results_table(&self, container_id: &str) -> Result<ResultsPage> {
        (**self).results_table(container_id).await
    }

    async fn anchors(&self) -> Result<Vec<PageLink>> {
        (**self).anchors().await
    }

    async fn click_anchor(&self, href: &str) -> Result<()> {
        (**self).click_anchor(href).await
    }
}

/// 按 `name` 属性构造选择器
pub fn by_name(name: &str) -> String {
    format!("[name=\"{}\"]", name.replace('"', "\\\""))
}

/// 按 `id` 属性构造选择器
pub fn by_id(id: &str) -> String {
    format!("[id=\"{}\"]", id.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors() {
        assert_eq!(by_name("username"), "[name=\"username\"]");
        assert_eq!(by_id("torrenttable"), "[id=\"torrenttable\"]");
        assert_eq!(by_name("a\"b"), "[name=\"a\\\"b\"]");
    }
}
