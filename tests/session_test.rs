//! 会话登录测试（假站点 + 暂停时钟）

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use bithumen_downloader::services::{ChannelSignal, SessionState};
use bithumen_downloader::{ChallengePolicy, SessionError};
use common::{session, test_config, FakeSite, NeverSignal, Script, BASE};

fn site(script: Script) -> Arc<FakeSite> {
    FakeSite::new(script, PathBuf::from("/nonexistent"))
}

#[tokio::test(start_paused = true)]
async fn test_login_success() {
    let site = site(Script::default());
    let config = test_config(PathBuf::from("/nonexistent"));
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    assert!(!session.is_alive());
    session.establish().await.unwrap();
    assert!(session.is_alive());
    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(site.navigations(), vec![format!("{}/login.php", BASE)]);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_credentials_are_rejected_not_timed_out() {
    let site = site(Script {
        login_lands_on: format!("{}/login.php?error=1", BASE),
        ..Script::default()
    });
    let config = test_config(PathBuf::from("/nonexistent"));
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    let err = session.establish().await.unwrap_err();
    match err {
        SessionError::LoginRejected { url } => assert!(url.contains("login.php?error=1")),
        other => panic!("expected LoginRejected, got {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test(start_paused = true)]
async fn test_no_navigation_after_submit_times_out() {
    let site = site(Script {
        login_lands_on: format!("{}/login.php", BASE),
        ..Script::default()
    });
    let config = test_config(PathBuf::from("/nonexistent"));
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    let err = session.establish().await.unwrap_err();
    assert!(matches!(err, SessionError::Timeout { seconds: 1, .. }), "{:?}", err);
    assert!(!session.is_alive());
}

#[tokio::test(start_paused = true)]
async fn test_missing_login_form_times_out() {
    let site = site(Script {
        login_form_present: false,
        ..Script::default()
    });
    let config = test_config(PathBuf::from("/nonexistent"));
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    match session.establish().await.unwrap_err() {
        SessionError::Timeout { waiting_for, .. } => assert_eq!(waiting_for, "login form"),
        other => panic!("expected Timeout, got {:?}", other),
    }
    assert!(!site.events().iter().any(|e| e.starts_with("submit")));
}

#[tokio::test(start_paused = true)]
async fn test_challenge_fail_fast() {
    let site = site(Script {
        challenge: true,
        ..Script::default()
    });
    let mut config = test_config(PathBuf::from("/nonexistent"));
    config.challenge_policy = ChallengePolicy::FailFast;
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    let err = session.establish().await.unwrap_err();
    assert!(matches!(err, SessionError::ChallengeRequired));
    assert!(!site.events().iter().any(|e| e.starts_with("submit")));
}

#[tokio::test(start_paused = true)]
async fn test_challenge_blocks_until_signalled() {
    let site = site(Script {
        challenge: true,
        ..Script::default()
    });
    let config = test_config(PathBuf::from("/nonexistent"));
    assert_eq!(config.challenge_policy, ChallengePolicy::Block);

    let (tx, signal) = ChannelSignal::channel();
    let mut session = session(&site, &config, Arc::new(signal));
    tx.send(()).await.unwrap();

    session.establish().await.unwrap();
    assert!(session.is_alive());
}

#[tokio::test(start_paused = true)]
async fn test_closed_session_does_not_log_in() {
    let site = site(Script::default());
    let config = test_config(PathBuf::from("/nonexistent"));
    let mut session = session(&site, &config, Arc::new(NeverSignal));

    session.establish().await.unwrap();
    session.close();
    assert!(!session.is_alive());
    assert!(matches!(session.establish().await, Err(SessionError::Closed)));
    assert_eq!(site.navigations().len(), 1);
}
