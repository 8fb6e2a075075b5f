//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、浏览器、JsExecutor、会话
//! 2. **启动即登录**：登录失败直接退出，没有会话就没有继续运行的意义
//! 3. **终端交互**：输入关键字 → 列出编号结果 → 选择序号下载
//! 4. **资源管理**：唯一持有 Browser 的模块，退出时关闭会话和浏览器

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::WorkflowError;
use crate::infrastructure::JsExecutor;
use crate::models::select_record;
use crate::orchestrator::frontend::Frontend;
use crate::services::{ConsoleSignal, SessionDriver};
use crate::utils::logging::{init_log_file, log_startup, truncate_text};
use crate::workflow::Workflow;

/// 应用主结构
pub struct App {
    browser: Browser,
    frontend: Frontend<JsExecutor>,
}

impl App {
    /// 初始化应用并登录
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(log_file) = &config.log_file {
            init_log_file(log_file)?;
        }
        log_startup(&config.base_url, &config.download_dir.display().to_string());

        let (browser, page) = browser::open_browser(&config).await?;
        let executor = JsExecutor::new(page);

        let session = SessionDriver::new(executor, &config, Arc::new(ConsoleSignal))?;
        let workflow = Arc::new(Workflow::new(session, &config)?);
        let frontend = Frontend::new(workflow, config.base()?);

        frontend
            .init_session()
            .await
            .context("无法登录，程序退出")?;
        info!("✓ 已登录");

        Ok(Self { browser, frontend })
    }

    /// 终端交互主循环
    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let Some(query) = prompt(&mut lines, "\n输入搜索关键字（quit 退出）: ").await? else {
                break;
            };
            if query.trim().eq_ignore_ascii_case("quit") {
                break;
            }

            let records = match self.frontend.search(&query).await {
                Ok(records) => records,
                Err(WorkflowError::Validation(e)) => {
                    println!("{}", e);
                    continue;
                }
                Err(WorkflowError::Session(e)) => {
                    error!("会话不可用: {}", e);
                    println!("搜索失败: {}", e);
                    continue;
                }
            };

            if records.is_empty() {
                println!("没有找到结果");
                continue;
            }

            println!("\n找到 {} 个结果:", records.len());
            for (i, record) in records.iter().enumerate() {
                println!("{}. {}", i + 1, truncate_text(&record.title, 100));
            }

            loop {
                let Some(choice) = prompt(&mut lines, "\n输入序号下载（n 重新搜索）: ").await? else {
                    return self.shutdown().await;
                };
                if choice.trim().eq_ignore_ascii_case("n") {
                    break;
                }
                match select_record(&records, &choice) {
                    Ok(record) => {
                        println!("已选择: {}", record.title);
                        let response = self.frontend.download(record.detail_locator.as_str()).await;
                        println!("{}", response.message);
                        break;
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }

        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.frontend.workflow().close().await;
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        info!("再见");
        Ok(())
    }
}

/// 打印提示并读取一行，输入流结束时返回 `None`
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, message: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(message.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?)
}
