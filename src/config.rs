use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// 遇到验证码时的处理策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengePolicy {
    /// 阻塞等待外部信号（人工处理）
    Block,
    /// 立即失败，适用于无人值守部署
    FailFast,
}

impl FromStr for ChallengePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            other => Err(ConfigError::ParseFailed {
                var_name: "CHALLENGE_POLICY".to_string(),
                value: other.to_string(),
                expected_type: "block | fail-fast".to_string(),
            }),
        }
    }
}

/// 站点页面结构中的固定约定值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    pub login_path: String,
    pub search_path: String,
    /// 登录成功后所在页面的 URL 特征
    pub authenticated_pattern: String,
    pub username_field: String,
    pub password_field: String,
    pub search_field: String,
    pub search_submit_selector: String,
    /// 结果表格的 id
    pub results_container_id: String,
    pub challenge_selector: String,
    pub details_pattern: String,
    pub download_pattern: String,
    /// 下载链接中携带种子 id 的特征
    pub download_id_pattern: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            login_path: "/login.php".to_string(),
            search_path: "/browse.php".to_string(),
            authenticated_pattern: "/my.php".to_string(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
            search_field: "search".to_string(),
            search_submit_selector: "input[type='submit'][value='Keresés']".to_string(),
            results_container_id: "torrenttable".to_string(),
            challenge_selector: ".g-recaptcha".to_string(),
            details_pattern: r"details\.php\?(?:[^#]*&)?id=\d+".to_string(),
            download_pattern: r"download\.php".to_string(),
            download_id_pattern: r"download\.php(?:\?(?:[^#]*&)?id=\d+|/\d+)".to_string(),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 目标站点根地址
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// 浏览器下载目录，也是下载检测监视的目录
    pub download_dir: PathBuf,
    /// 浏览器调试端口，0 表示自行启动浏览器
    pub browser_debug_port: u16,
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    pub login_timeout_secs: u64,
    pub search_timeout_secs: u64,
    /// 提交搜索后等待结果表格出现的时间，没有匹配时页面上就没有表格
    pub results_wait_millis: u64,
    pub trigger_timeout_secs: u64,
    pub download_budget_secs: u64,
    pub poll_interval_millis: u64,
    /// 文件大小稳定检查的间隔，0 表示关闭
    pub settle_millis: u64,
    pub challenge_policy: ChallengePolicy,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub log_file: Option<String>,
    pub site: SiteLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://bithumen.be".to_string(),
            username: String::new(),
            password: String::new(),
            download_dir: dirs::download_dir()
                .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
                .unwrap_or_else(|| PathBuf::from("downloads")),
            browser_debug_port: 0,
            chrome_executable: None,
            headless: false,
            login_timeout_secs: 10,
            search_timeout_secs: 10,
            results_wait_millis: 2000,
            trigger_timeout_secs: 3,
            download_budget_secs: 30,
            poll_interval_millis: 1000,
            settle_millis: 0,
            challenge_policy: ChallengePolicy::Block,
            verbose_logging: false,
            log_file: None,
            site: SiteLayout::default(),
        }
    }
}

impl Config {
    /// 加载配置：可选的 TOML 文件（`BITHUMEN_CONFIG`）打底，再叠加环境变量
    pub async fn load() -> Result<Self> {
        let base = match std::env::var("BITHUMEN_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path)).await?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides()?)
    }

    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let d = self;
        Ok(Self {
            base_url: std::env::var("BITHUMEN_BASE_URL").unwrap_or(d.base_url),
            username: std::env::var("BITHUMEN_USERNAME").unwrap_or(d.username),
            password: std::env::var("BITHUMEN_PASSWORD").unwrap_or(d.password),
            download_dir: std::env::var("DOWNLOAD_DIR").map(PathBuf::from).unwrap_or(d.download_dir),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", "u16")?.unwrap_or(d.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(d.chrome_executable),
            headless: env_parse("HEADLESS", "bool")?.unwrap_or(d.headless),
            login_timeout_secs: env_parse("LOGIN_TIMEOUT_SECS", "u64")?.unwrap_or(d.login_timeout_secs),
            search_timeout_secs: env_parse("SEARCH_TIMEOUT_SECS", "u64")?.unwrap_or(d.search_timeout_secs),
            results_wait_millis: env_parse("RESULTS_WAIT_MILLIS", "u64")?.unwrap_or(d.results_wait_millis),
            trigger_timeout_secs: env_parse("TRIGGER_TIMEOUT_SECS", "u64")?.unwrap_or(d.trigger_timeout_secs),
            download_budget_secs: env_parse("DOWNLOAD_BUDGET_SECS", "u64")?.unwrap_or(d.download_budget_secs),
            poll_interval_millis: env_parse("POLL_INTERVAL_MILLIS", "u64")?.unwrap_or(d.poll_interval_millis),
            settle_millis: env_parse("SETTLE_MILLIS", "u64")?.unwrap_or(d.settle_millis),
            challenge_policy: match std::env::var("CHALLENGE_POLICY") {
                Ok(v) => v.parse()?,
                Err(_) => d.challenge_policy,
            },
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(d.verbose_logging),
            log_file: std::env::var("LOG_FILE").ok().or(d.log_file),
            site: d.site,
        })
    }

    /// 启动前检查：凭据必须存在，根地址必须可解析
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingVar {
                var_name: "BITHUMEN_USERNAME".to_string(),
            });
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingVar {
                var_name: "BITHUMEN_PASSWORD".to_string(),
            });
        }
        self.base()?;
        Ok(())
    }

    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn results_wait(&self) -> Duration {
        Duration::from_millis(self.results_wait_millis)
    }

    pub fn trigger_timeout(&self) -> Duration {
        Duration::from_secs(self.trigger_timeout_secs)
    }

    pub fn download_budget(&self) -> Duration {
        Duration::from_secs(self.download_budget_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis.max(1))
    }

    pub fn settle(&self) -> Option<Duration> {
        (self.settle_millis > 0).then(|| Duration::from_millis(self.settle_millis))
    }
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::ParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
