//! 会话服务 - 业务能力层
//!
//! 负责登录并维护登录状态，一个进程只有一个会话

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ChallengePolicy, Config, SiteLayout};
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::{by_name, PageDriver};
use crate::services::challenge::ChallengeSignal;
use crate::utils::wait_for;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Closed,
}

/// 会话驱动
///
/// 独占页面；`establish` 需要 `&mut self`，同一时刻只能有一个登录在进行
pub struct SessionDriver<D> {
    page: D,
    base: Url,
    username: String,
    password: String,
    layout: SiteLayout,
    login_timeout: Duration,
    policy: ChallengePolicy,
    signal: Arc<dyn ChallengeSignal>,
    state: SessionState,
}

impl<D: PageDriver> SessionDriver<D> {
    pub fn new(page: D, config: &Config, signal: Arc<dyn ChallengeSignal>) -> SessionResult<Self> {
        let base = config
            .base()
            .map_err(|e| SessionError::Unexpected(e.to_string()))?;
        Ok(Self {
            page,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
            layout: config.site.clone(),
            login_timeout: config.login_timeout(),
            policy: config.challenge_policy,
            signal,
            state: SessionState::Unauthenticated,
        })
    }

    pub fn page(&self) -> &D {
        &self.page
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn layout(&self) -> &SiteLayout {
        &self.layout
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 只看本地状态，不访问网络
    pub fn is_alive(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// 站点内的绝对地址
    pub fn url_for(&self, path: &str) -> SessionResult<Url> {
        self.base
            .join(path)
            .map_err(|e| SessionError::Unexpected(format!("invalid path {}: {}", path, e)))
    }

    /// 地址是否为登录页（会话已失效的信号）
    pub fn is_login_page(&self, url: &str) -> bool {
        url.contains(&self.layout.login_path)
    }

    /// 登录
    pub async fn establish(&mut self) -> SessionResult<()> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        self.state = SessionState::Authenticating;
        let result = self.login().await;
        self.state = match result {
            Ok(()) => SessionState::Authenticated,
            Err(_) => SessionState::Unauthenticated,
        };
        result
    }

    /// 页面被重定向回登录页时调用，下次请求会重新登录
    pub fn invalidate(&mut self) {
        if self.state == SessionState::Authenticated {
            warn!("⚠️ 会话已失效，下次请求时重新登录");
            self.state = SessionState::Unauthenticated;
        }
    }

    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            info!("会话已关闭");
            self.state = SessionState::Closed;
        }
    }

    async fn login(&self) -> SessionResult<()> {
        let login_url = self.url_for(&self.layout.login_path)?;
        info!("🔐 正在登录: {}", login_url);
        self.page.goto(login_url.as_str()).await?;

        let username_field = by_name(&self.layout.username_field);
        let password_field = by_name(&self.layout.password_field);

        self.wait_for_element(&username_field, "login form").await?;
        self.page.fill(&username_field, &self.username).await?;
        self.page.fill(&password_field, &self.password).await?;

        if self.page.exists(&self.layout.challenge_selector).await? {
            self.resolve_challenge().await?;
        }

        let before = self.page.current_url().await?;
        debug!("提交登录表单 (当前地址: {})", before);
        self.page.submit(&password_field).await?;

        let page = &self.page;
        let before = before.as_str();
        let landed = wait_for(self.login_timeout, move || async move {
            match page.current_url().await {
                Ok(url) if !url.is_empty() && url != before => Some(url),
                _ => None,
            }
        })
        .await
        .ok_or_else(|| SessionError::Timeout {
            waiting_for: "URL change after login".to_string(),
            seconds: self.login_timeout.as_secs(),
        })?;

        if landed.contains(&self.layout.authenticated_pattern) {
            info!("✓ 登录成功");
            Ok(())
        } else {
            warn!("登录失败，跳转到了意外的页面: {}", landed);
            Err(SessionError::LoginRejected { url: landed })
        }
    }

    async fn resolve_challenge(&self) -> SessionResult<()> {
        warn!("⚠️ 登录页出现验证码");
        match self.policy {
            ChallengePolicy::FailFast => Err(SessionError::ChallengeRequired),
            ChallengePolicy::Block => {
                info!("等待人工完成验证码...");
                self.signal.wait_for_resolution().await?;
                info!("✓ 验证码已处理，继续登录");
                Ok(())
            }
        }
    }

    async fn wait_for_element(&self, selector: &str, what: &str) -> SessionResult<()> {
        let page = &self.page;
        wait_for(self.login_timeout, move || async move {
            page.exists(selector).await.ok().filter(|found| *found)
        })
        .await
        .map(|_| ())
        .ok_or_else(|| SessionError::Timeout {
            waiting_for: what.to_string(),
            seconds: self.login_timeout.as_secs(),
        })
    }
}
