use thiserror::Error;

/// 下载超时的固定原因文本，前端会原样展示
pub const DOWNLOAD_TIMEOUT_REASON: &str = "Timeout waiting for download to complete";

/// 会话建立错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 提交后跳转到了非登录区页面
    #[error("Login rejected: landed on {url}")]
    LoginRejected { url: String },
    /// 在限定时间内页面状态没有变化
    #[error("Timed out after {seconds}s waiting for {waiting_for}")]
    Timeout { waiting_for: String, seconds: u64 },
    /// 检测到验证码，但策略要求立即失败
    #[error("Login challenge detected and the challenge policy is fail-fast")]
    ChallengeRequired,
    /// 等待人工处理验证码时信号源关闭
    #[error("Challenge resolution was aborted: {0}")]
    ChallengeAborted(String),
    /// 会话已关闭，不再重新登录
    #[error("Session is closed")]
    Closed,
    /// 浏览器层的其他错误
    #[error("Unexpected session failure: {0}")]
    Unexpected(String),
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::Unexpected(format!("{:#}", err))
    }
}

/// 下载检测错误
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Download link not found on details page")]
    TriggerNotFound,
    #[error("{}", DOWNLOAD_TIMEOUT_REASON)]
    Timeout,
    #[error("Cannot read download directory {path}: {source}")]
    FilesystemAccessFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Download cancelled")]
    Cancelled,
}

impl DetectError {
    pub fn filesystem(path: impl Into<String>, source: std::io::Error) -> Self {
        DetectError::FilesystemAccessFailure {
            path: path.into(),
            source,
        }
    }
}

/// 输入校验错误，发生时不会有任何网络访问
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a search term")]
    EmptyQuery,
    #[error("No torrent selected")]
    EmptySelection,
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("Invalid details URL: {0}")]
    InvalidLocator(String),
    #[error("Details URL {0} does not belong to the configured site")]
    ForeignLocator(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {var_name} is not set")]
    MissingVar { var_name: String },
    #[error("Environment variable {var_name}: cannot parse '{value}' as {expected_type}")]
    ParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    #[error("Invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// 流程层操作返回的错误
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

// ========== Result 类型别名 ==========

pub type SessionResult<T> = Result<T, SessionError>;
pub type WorkflowResult<T> = Result<T, WorkflowError>;
