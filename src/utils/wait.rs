//! 有界等待
//!
//! 以退避间隔轮询某个条件，直到满足或超时

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

const INITIAL_INTERVAL: Duration = Duration::from_millis(100);
const MAX_INTERVAL: Duration = Duration::from_millis(500);

/// 轮询 `probe` 直到返回 `Some`，超时返回 `None`
///
/// 至少检查一次；间隔从 100ms 开始翻倍，上限 500ms
pub async fn wait_for<T, F, Fut>(timeout: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + timeout;
    let mut interval = INITIAL_INTERVAL;

    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }

        sleep(interval.min(deadline - now)).await;
        interval = (interval * 2).min(MAX_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_eventually_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = wait_for(Duration::from_secs(3), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { (n >= 3).then_some(n) }
        })
        .await;
        assert_eq!(result, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_times_out() {
        let started = Instant::now();
        let result: Option<()> = wait_for(Duration::from_secs(2), || async { None }).await;
        assert!(result.is_none());
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_zero_timeout_checks_once() {
        let calls = AtomicUsize::new(0);
        let result: Option<()> = wait_for(Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { None }
        })
        .await;
        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
