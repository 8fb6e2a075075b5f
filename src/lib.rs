//! # BitHumen Downloader
//!
//! 自动登录 BitHumen、搜索种子并下载的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面操作能力
//! - `JsExecutor` - 唯一的 page owner，基于 chromiumoxide 实现 `PageDriver`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `SessionDriver` - 登录与会话状态（含验证码人工处理）
//! - `ResultParser` - 结果表格解析
//! - `DownloadDetector` / `TriggerLocator` - 下载链接查找与完成检测
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 登录 → 搜索 → 选择 → 下载 → 确认
//! - `Workflow` - 串行化所有页面操作，失败统一为结构化结果
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 进程入口，启动即登录，终端交互
//! - `orchestrator/frontend` - 前端需要的三个调用

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{ChallengePolicy, Config, SiteLayout};
pub use error::{
    ConfigError, DetectError, SessionError, ValidationError, WorkflowError, DOWNLOAD_TIMEOUT_REASON,
};
pub use infrastructure::{JsExecutor, PageDriver};
pub use models::{DownloadOutcome, DownloadRequest, SearchRecord, SearchResults};
pub use orchestrator::{App, Frontend, FrontendResponse};
pub use services::{DirectorySnapshot, DownloadDetector, ResultParser, SessionDriver};
pub use workflow::{Workflow, WorkflowPhase};
