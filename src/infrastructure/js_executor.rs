//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，通过执行 JS 和元素句柄实现 [`PageDriver`]

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::infrastructure::page_driver::PageDriver;
use crate::models::{PageLink, ResultsPage};

/// 点击下载链接前给目标链接打的标记
const TRIGGER_MARKER: &str = "data-bhd-trigger";

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力和页面驱动能力
/// - 不认识 SearchRecord / 会话状态
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

#[async_trait]
impl PageDriver for JsExecutor {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) return false;
                el.focus();
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?,
        );
        if !self.eval_as::<bool>(js_code).await? {
            bail!("找不到输入框: {}", selector);
        }
        Ok(())
    }

    async fn submit(&self, selector: &str) -> Result<()> {
        // 延迟到下一个事件循环再提交，避免导航销毁当前执行上下文
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el || !el.form) return false;
                const form = el.form;
                setTimeout(() => form.requestSubmit ? form.requestSubmit() : form.submit(), 0);
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?,
        );
        if !self.eval_as::<bool>(js_code).await? {
            bail!("找不到可提交的表单: {}", selector);
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到元素: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn results_table(&self, container_id: &str) -> Result<ResultsPage> {
        let js_code = format!(
            r#"
            (() => {{
                const table = document.getElementById({});
                if (!table) return {{ url: location.href, table: null }};
                const rows = Array.from(table.querySelectorAll('tr')).map(tr => ({{
                    header: tr.classList.contains('colhead')
                        || tr.querySelector('th') !== null
                        || tr.querySelector('td.colhead') !== null,
                    cells: Array.from(tr.children)
                        .filter(c => c.tagName === 'TD' || c.tagName === 'TH')
                        .map(td => ({{
                            text: td.innerText || '',
                            links: Array.from(td.querySelectorAll('a[href]')).map(a => ({{
                                href: a.href,
                                text: a.innerText || '',
                                title: a.getAttribute('title'),
                            }})),
                        }})),
                }}));
                return {{ url: location.href, table: rows }};
            }})()
            "#,
            serde_json::to_string(container_id)?,
        );
        self.eval_as(js_code).await
    }

    async fn anchors(&self) -> Result<Vec<PageLink>> {
        let js_code = r#"
            Array.from(document.querySelectorAll('a[href]')).map(a => ({
                href: a.href,
                text: a.innerText || '',
                title: a.getAttribute('title'),
            }))
        "#;
        self.eval_as(js_code).await
    }

    async fn click_anchor(&self, href: &str) -> Result<()> {
        let js_code = format!(
            r#"
            (() => {{
                const target = Array.from(document.querySelectorAll('a[href]'))
                    .find(a => a.href === {});
                if (!target) return false;
                document.querySelectorAll('[{marker}]').forEach(a => a.removeAttribute('{marker}'));
                target.setAttribute('{marker}', '1');
                return true;
            }})()
            "#,
            serde_json::to_string(href)?,
            marker = TRIGGER_MARKER,
        );
        if !self.eval_as::<bool>(js_code).await? {
            bail!("找不到链接: {}", href);
        }
        self.click(&format!("a[{}]", TRIGGER_MARKER)).await
    }
}
