//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 进程级入口
//! - 管理应用生命周期（初始化、运行、清理）
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 终端交互循环
//!
//! ### `frontend` - 前端接口
//! - 初始化会话 / 搜索 / 下载 三个调用
//! - 把下载结果转换为 `{status, message}`
//!
//! ## 层次关系
//!
//! ```text
//! app (终端交互)
//!     ↓
//! frontend (前端接口)
//!     ↓
//! workflow::Workflow (登录 → 搜索 → 下载 → 确认)
//!     ↓
//! services (能力层：session / parser / detector)
//!     ↓
//! infrastructure (基础设施：PageDriver / JsExecutor)
//! ```

pub mod app;
pub mod frontend;

pub use app::App;
pub use frontend::{Frontend, FrontendResponse, ResponseStatus};
