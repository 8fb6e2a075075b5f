//! 下载完成检测测试（真实时钟 + 临时目录）

use std::fs::{self, File};
use std::time::{Duration, Instant, SystemTime};

use bithumen_downloader::{DirectorySnapshot, DownloadDetector, DOWNLOAD_TIMEOUT_REASON};
use tokio_util::sync::CancellationToken;

fn detector(budget_millis: u64) -> DownloadDetector {
    DownloadDetector::new(Duration::from_millis(100), Duration::from_millis(budget_millis))
}

#[tokio::test]
async fn test_new_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.torrent"), b"a").unwrap();
    let baseline = DirectorySnapshot::capture(dir.path()).await.unwrap();
    assert_eq!(baseline.len(), 1);

    let target = dir.path().join("b.torrent");
    let writer = tokio::spawn({
        let target = target.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            fs::write(target, b"b").unwrap();
        }
    });

    let outcome = detector(3_000)
        .await_completion(dir.path(), &baseline, &CancellationToken::new())
        .await;
    writer.await.unwrap();

    assert!(outcome.succeeded, "{:?}", outcome.reason);
    assert_eq!(outcome.file.as_deref(), Some(target.as_path()));
    assert_eq!(outcome.file_name().as_deref(), Some("b.torrent"));
}

#[tokio::test]
async fn test_overwritten_file_counts_as_new() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("same-name.torrent");
    fs::write(&path, b"old").unwrap();
    let baseline = DirectorySnapshot::capture(dir.path()).await.unwrap();

    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10)).unwrap();
    drop(file);

    let outcome = detector(1_000)
        .await_completion(dir.path(), &baseline, &CancellationToken::new())
        .await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.file_name().as_deref(), Some("same-name.torrent"));
}

#[tokio::test]
async fn test_unchanged_directory_times_out() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.torrent"), b"a").unwrap();
    let baseline = DirectorySnapshot::capture(dir.path()).await.unwrap();

    let started = Instant::now();
    let outcome = detector(500)
        .await_completion(dir.path(), &baseline, &CancellationToken::new())
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.reason.as_deref(), Some(DOWNLOAD_TIMEOUT_REASON));
    assert_eq!(
        outcome.reason.as_deref(),
        Some("Timeout waiting for download to complete")
    );
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_cancellation_stops_polling() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = DirectorySnapshot::capture(dir.path()).await.unwrap();
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        }
    });

    let started = Instant::now();
    let outcome = detector(10_000)
        .await_completion(dir.path(), &baseline, &cancel)
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.reason.as_deref(), Some("Download cancelled"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_directory_fails_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");

    let started = Instant::now();
    let outcome = detector(10_000)
        .await_completion(&missing, &DirectorySnapshot::default(), &CancellationToken::new())
        .await;

    assert!(!outcome.succeeded);
    assert!(outcome
        .reason
        .unwrap()
        .starts_with("Cannot read download directory"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_settle_waits_for_stable_size() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = DirectorySnapshot::capture(dir.path()).await.unwrap();
    fs::write(dir.path().join("c.torrent"), b"complete").unwrap();

    let outcome = detector(2_000)
        .with_settle(Some(Duration::from_millis(100)))
        .await_completion(dir.path(), &baseline, &CancellationToken::new())
        .await;
    assert!(outcome.succeeded);
    assert_eq!(outcome.file_name().as_deref(), Some("c.torrent"));
}
