//! 脚本化的假站点，按 URL 模拟登录页 / 搜索页 / 详情页的行为

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bithumen_downloader::models::{PageLink, ResultCell, ResultRow, ResultsPage};
use bithumen_downloader::services::ChallengeSignal;
use bithumen_downloader::{Config, PageDriver, SessionDriver};

pub const BASE: &str = "https://bithumen.be";

#[derive(Debug, Clone)]
pub struct Script {
    /// 提交登录表单后跳转到的地址
    pub login_lands_on: String,
    pub login_form_present: bool,
    pub challenge: bool,
    pub search_form_present: bool,
    /// 打开搜索页时被重定向到的地址（模拟会话过期）
    pub browse_redirect: Option<String>,
    pub results: Option<Vec<ResultRow>>,
    /// 打开详情页时被重定向到的地址
    pub details_redirect: Option<String>,
    pub details_anchors: Vec<PageLink>,
    /// 点击下载链接后多久写入哪个文件
    pub download: Option<(String, Duration)>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            login_lands_on: format!("{}/my.php", BASE),
            login_form_present: true,
            challenge: false,
            search_form_present: true,
            browse_redirect: None,
            results: Some(vec![
                header_row(),
                data_row("Ubuntu 24.04 LTS", 101),
                data_row("Debian 12", 102),
            ]),
            details_redirect: None,
            details_anchors: vec![link(&format!("{}/download.php?id=101&name=ubuntu.torrent", BASE))],
            download: Some(("ubuntu.torrent".to_string(), Duration::from_millis(300))),
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    last_search: String,
    events: Vec<String>,
}

pub struct FakeSite {
    script: Mutex<Script>,
    state: Mutex<FakeState>,
    download_dir: PathBuf,
}

impl FakeSite {
    pub fn new(script: Script, download_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            state: Mutex::new(FakeState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
            download_dir,
        })
    }

    pub fn update(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    /// 记录的操作序列，例如 `goto https://...`、`results`
    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("goto ").map(str::to_string))
            .collect()
    }

    fn script(&self) -> Script {
        self.script.lock().unwrap().clone()
    }

    fn url(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }

    fn record(&self, event: String) {
        self.state.lock().unwrap().events.push(event);
    }
}

#[async_trait]
impl PageDriver for FakeSite {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(format!("goto {}", url));
        let script = self.script();
        let landed = if url.contains("details.php") {
            script.details_redirect.unwrap_or_else(|| url.to_string())
        } else if url.contains("browse.php") {
            script.browse_redirect.unwrap_or_else(|| url.to_string())
        } else {
            url.to_string()
        };
        self.state.lock().unwrap().url = landed;
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        tokio::task::yield_now().await;
        let script = self.script();
        let url = self.url();
        let on_login = url.contains("login.php");
        Ok(match selector {
            "[name=\"username\"]" | "[name=\"password\"]" => on_login && script.login_form_present,
            ".g-recaptcha" => on_login && script.challenge,
            "[name=\"search\"]" => url.contains("browse.php") && script.search_form_present,
            "[id=\"torrenttable\"]" => url.contains("search=") && script.results.is_some(),
            _ => false,
        })
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.record(format!("fill {}", selector));
        if selector == "[name=\"search\"]" {
            self.state.lock().unwrap().last_search = value.to_string();
        }
        Ok(())
    }

    async fn submit(&self, selector: &str) -> Result<()> {
        self.record(format!("submit {}", selector));
        if self.url().contains("login.php") {
            let lands_on = self.script().login_lands_on;
            self.state.lock().unwrap().url = lands_on;
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click {}", selector));
        if !self.url().contains("browse.php") {
            bail!("nothing to click");
        }
        let mut state = self.state.lock().unwrap();
        state.url = format!("{}/browse.php?search={}", BASE, state.last_search);
        Ok(())
    }

    async fn results_table(&self, _container_id: &str) -> Result<ResultsPage> {
        self.record("results".to_string());
        Ok(ResultsPage {
            url: self.url(),
            table: self.script().results,
        })
    }

    async fn anchors(&self) -> Result<Vec<PageLink>> {
        if self.url().contains("details.php") {
            Ok(self.script().details_anchors)
        } else {
            Ok(Vec::new())
        }
    }

    async fn click_anchor(&self, href: &str) -> Result<()> {
        self.record(format!("click_anchor {}", href));
        if let Some((name, delay)) = self.script().download {
            let path = self.download_dir.join(name);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = std::fs::write(path, b"d8:announce0:e");
            });
        }
        Ok(())
    }
}

/// 永远不会被调用的信号
pub struct NeverSignal;

#[async_trait]
impl ChallengeSignal for NeverSignal {
    async fn wait_for_resolution(&self) -> bithumen_downloader::error::SessionResult<()> {
        panic!("challenge signal should not be awaited");
    }
}

pub fn test_config(download_dir: PathBuf) -> Config {
    Config {
        base_url: BASE.to_string(),
        username: "tester".to_string(),
        password: "hunter2".to_string(),
        download_dir,
        login_timeout_secs: 1,
        search_timeout_secs: 1,
        results_wait_millis: 300,
        trigger_timeout_secs: 0,
        download_budget_secs: 3,
        poll_interval_millis: 100,
        ..Config::default()
    }
}

pub fn session(
    site: &Arc<FakeSite>,
    config: &Config,
    signal: Arc<dyn ChallengeSignal>,
) -> SessionDriver<Arc<FakeSite>> {
    SessionDriver::new(site.clone(), config, signal).unwrap()
}

pub fn link(href: &str) -> PageLink {
    PageLink {
        href: href.to_string(),
        text: String::new(),
        title: None,
    }
}

fn text_cell(text: &str) -> ResultCell {
    ResultCell {
        text: text.to_string(),
        links: Vec::new(),
    }
}

pub fn header_row() -> ResultRow {
    ResultRow {
        header: true,
        cells: vec![text_cell("Típus"), text_cell("Név"), text_cell("Méret")],
    }
}

pub fn data_row(title: &str, id: u32) -> ResultRow {
    ResultRow {
        header: false,
        cells: vec![
            text_cell("Linux"),
            ResultCell {
                text: title.to_string(),
                links: vec![PageLink {
                    href: format!("{}/details.php?id={}", BASE, id),
                    text: title.to_string(),
                    title: None,
                }],
            },
            text_cell("4.7 GB"),
        ],
    }
}
