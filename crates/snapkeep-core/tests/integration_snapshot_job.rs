//! Integration test: local HTTP server, real fetches, pruning and the scheduler loop.

mod common;

use std::time::{Duration, Instant};

use chrono::Local;
use snapkeep_core::config::Schedule;
use snapkeep_core::fetcher::{FetchError, Fetcher};
use snapkeep_core::scheduler::{JobEvent, LogReceiver, RunState, SnapshotJob};
use snapkeep_core::snapshot::SnapshotName;
use tempfile::tempdir;

fn dir_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn next_event(rx: &mut LogReceiver) -> JobEvent {
    let deadline = Instant::now() + Duration::from_secs(20);
    while Instant::now() < deadline {
        if let Ok(entry) = rx.try_recv() {
            return entry.event;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out waiting for a job log event");
}

#[test]
fn fetch_writes_timestamped_snapshot_with_remote_body() {
    let body: Vec<u8> = (0u8..100).cycle().take(256 * 1024).collect();
    let server = common::file_server::start(body.clone());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("nested").join("backups");

    let started = Local::now().naive_local();
    let snapshot = Fetcher::default()
        .fetch(&server.url("/webui.db"), &dest)
        .expect("fetch");

    let names = dir_names(&dest);
    assert_eq!(names.len(), 1, "exactly one file, no temp leftovers: {names:?}");
    assert_eq!(names[0], snapshot.file_name);
    let parsed = SnapshotName::parse(&names[0]).expect("well-formed snapshot name");
    let skew = (parsed.taken_at() - started).num_seconds().abs();
    assert!(skew <= 5, "timestamp {} too far from {}", parsed.taken_at(), started);

    assert_eq!(snapshot.bytes, body.len() as u64);
    assert_eq!(std::fs::read(&snapshot.path).unwrap(), body);
}

#[test]
fn fetch_404_creates_directory_but_no_snapshot() {
    let server = common::file_server::start(b"unused".to_vec());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("backups");

    let err = Fetcher::default()
        .fetch(&server.url("/missing.db"), &dest)
        .unwrap_err();
    assert!(matches!(err, FetchError::Http(404)), "got {err:?}");
    assert!(err.to_string().contains("404"));
    assert!(dest.is_dir());
    assert!(dir_names(&dest).is_empty());
}

#[test]
fn fetch_follows_redirects() {
    let server = common::file_server::start(b"redirected body".to_vec());
    let dir = tempdir().unwrap();

    let snapshot = Fetcher::default()
        .fetch(&server.url("/moved"), dir.path())
        .expect("fetch after redirect");
    assert_eq!(std::fs::read(&snapshot.path).unwrap(), b"redirected body");
    assert_eq!(server.hits(), 2);
}

#[test]
fn fetch_empty_body_writes_empty_snapshot() {
    let server = common::file_server::start(Vec::new());
    let dir = tempdir().unwrap();

    let snapshot = Fetcher::default()
        .fetch(&server.url("/empty"), dir.path())
        .expect("fetch");
    assert_eq!(snapshot.bytes, 0);
    assert_eq!(dir_names(dir.path()), vec![snapshot.file_name.clone()]);
}

#[test]
fn fetch_unreachable_host_is_transport_error() {
    let dir = tempdir().unwrap();
    let err = Fetcher::default()
        .fetch("http://127.0.0.1:1/webui.db", dir.path())
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
    assert!(dir_names(dir.path()).is_empty());
}

#[test]
fn scheduler_cycle_fetches_then_prunes() {
    let body = b"sqlite bytes".to_vec();
    let server = common::file_server::start(body.clone());
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("webui_bk_20000101_000000.db"), b"ancient").unwrap();
    std::fs::write(dir.path().join("keep-me.txt"), b"operator notes").unwrap();

    let schedule = Schedule {
        interval: Duration::from_secs(3600),
        retention_days: 7,
        config_backoff: Duration::from_secs(10),
    };
    let (job, mut rx) = SnapshotJob::new(schedule, Fetcher::default());
    job.set_config(&server.url("/webui.db"), dir.path()).unwrap();
    job.start().unwrap();

    assert_eq!(next_event(&mut rx), JobEvent::Started);
    let path = match next_event(&mut rx) {
        JobEvent::Fetched { path, bytes } => {
            assert_eq!(bytes, body.len() as u64);
            path
        }
        other => panic!("expected Fetched, got {other:?}"),
    };
    assert_eq!(
        next_event(&mut rx),
        JobEvent::Pruned {
            removed: vec!["webui_bk_20000101_000000.db".to_string()]
        }
    );
    assert_eq!(std::fs::read(&path).unwrap(), body);
    assert_eq!(server.hits(), 1);

    // Now inside the 1h wait: stop must be honoured without waiting it out.
    job.stop();
    assert_eq!(next_event(&mut rx), JobEvent::Stopped);
    job.wait();
    assert_eq!(job.state(), RunState::Idle);
    assert_eq!(server.hits(), 1);

    let names = dir_names(dir.path());
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"keep-me.txt".to_string()));
}

#[test]
fn fetch_into_regular_file_destination_is_storage_error() {
    let server = common::file_server::start(b"sqlite bytes".to_vec());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("not-a-directory");
    std::fs::write(&dest, b"occupied").unwrap();

    let err = Fetcher::default()
        .fetch(&server.url("/webui.db"), &dest)
        .unwrap_err();
    assert!(matches!(err, FetchError::Storage(_)), "got {err:?}");
    assert_eq!(std::fs::read(&dest).unwrap(), b"occupied");
    assert_eq!(dir_names(dir.path()), vec!["not-a-directory".to_string()]);
    assert_eq!(server.hits(), 0);
}

#[cfg(unix)]
#[test]
fn fetch_into_read_only_directory_leaves_nothing_behind() {
    use std::os::unix::fs::PermissionsExt;

    let server = common::file_server::start(b"sqlite bytes".to_vec());
    let dir = tempdir().unwrap();
    let dest = dir.path().join("locked");
    std::fs::create_dir(&dest).unwrap();
    std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users ignore the mode bits; nothing to check then.
    let writable = std::fs::write(dest.join("writable-check"), b"").is_ok();
    if writable {
        std::fs::remove_file(dest.join("writable-check")).unwrap();
    } else {
        let err = Fetcher::default()
            .fetch(&server.url("/webui.db"), &dest)
            .unwrap_err();
        assert!(matches!(err, FetchError::Storage(_)), "got {err:?}");
        assert_eq!(server.hits(), 1);
    }

    std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755)).unwrap();
    let leftovers: Vec<String> = dir_names(&dest)
        .into_iter()
        .filter(|n| n.starts_with("webui_bk_") || n.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn fetch_never_replaces_a_snapshot_with_the_same_name() {
    let server = common::file_server::start(b"new body".to_vec());
    let dir = tempdir().unwrap();
    let taken_at = Local::now().naive_local();
    let existing = dir.path().join(SnapshotName::new(taken_at).file_name());
    std::fs::write(&existing, b"old body").unwrap();

    let err = Fetcher::default()
        .fetch_at(&server.url("/webui.db"), dir.path(), taken_at)
        .unwrap_err();
    assert!(matches!(err, FetchError::AlreadyExists(_)), "got {err:?}");
    assert_eq!(std::fs::read(&existing).unwrap(), b"old body");
    assert_eq!(dir_names(dir.path()).len(), 1);
}
