//! Background synchronization of the content store.
//!
//! The loop moves through `Absent → Cloning → Present`, then alternates
//! `Present ⇄ Pulling` on a fixed interval until the process exits. A
//! failed initial clone is fatal to the caller of [`SyncLoop::bootstrap`];
//! a failed pull is logged and the previous snapshot keeps being served.
//! The fixed interval is the only retry policy.
//!
//! The loop's state is published through a `watch` channel so it can be
//! observed independently of request handling (see [`SyncHandle`]).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::store::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Absent,
    Cloning,
    Present,
    Pulling,
}

/// Observable state of the sync loop.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
    pub next_attempt: Option<DateTime<Utc>>,
    pub pulls: u64,
    pub failed_pulls: u64,
}

impl SyncStatus {
    fn initial(present: bool) -> Self {
        Self {
            phase: if present {
                SyncPhase::Present
            } else {
                SyncPhase::Absent
            },
            last_error: None,
            last_success: None,
            next_attempt: None,
            pulls: 0,
            failed_pulls: 0,
        }
    }
}

/// Read-only view of a running [`SyncLoop`].
#[derive(Clone)]
pub struct SyncHandle {
    rx: watch::Receiver<SyncStatus>,
}

impl SyncHandle {
    pub fn status(&self) -> SyncStatus {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.rx.clone()
    }
}

pub struct SyncLoop {
    store: Arc<ContentStore>,
    config: SyncConfig,
    status: watch::Sender<SyncStatus>,
}

impl SyncLoop {
    pub fn new(store: Arc<ContentStore>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::initial(store.is_present()));
        Self {
            store,
            config,
            status,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            rx: self.status.subscribe(),
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Clone the store if it is absent.
    ///
    /// Tries `clone_attempts` times, `clone_retry_secs` apart, and returns
    /// the last error if every attempt fails.
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        if self.store.is_present() {
            self.status.send_modify(|s| s.phase = SyncPhase::Present);
            return Ok(());
        }

        let attempts = self.config.clone_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.clone_once().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(attempt, attempts, error = %e, "clone failed, retrying");
                    tokio::time::sleep(self.config.clone_retry()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One iteration of the loop: re-clone if the store vanished,
    /// otherwise pull.
    pub async fn tick(&self) -> Result<(), SyncError> {
        if !self.store.is_present() {
            return self.clone_once().await;
        }
        self.pull_once().await
    }

    /// Run forever. Errors are recorded in the status and logged, never
    /// returned.
    pub async fn run(self) {
        let interval = self.config.interval();
        loop {
            // Already logged and recorded.
            let _ = self.tick().await;
            self.schedule_next(interval);
            tokio::time::sleep(interval).await;
        }
    }

    /// Spawn [`run`](Self::run) on the runtime, returning a handle to
    /// observe it.
    pub fn spawn(self) -> (SyncHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    async fn clone_once(&self) -> Result<(), SyncError> {
        self.status.send_modify(|s| s.phase = SyncPhase::Cloning);
        info!(
            remote = self.store.remote_url(),
            path = %self.store.repo_root().display(),
            "cloning content store"
        );

        let store = self.store.clone();
        let result = run_blocking(move || store.clone_from_remote()).await;

        match &result {
            Ok(()) => {
                info!("clone complete");
                self.status.send_modify(|s| {
                    s.phase = SyncPhase::Present;
                    s.last_error = None;
                    s.last_success = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "clone failed");
                self.status.send_modify(|s| {
                    s.phase = SyncPhase::Absent;
                    s.last_error = Some(e.to_string());
                });
            }
        }
        result
    }

    async fn pull_once(&self) -> Result<(), SyncError> {
        self.status.send_modify(|s| s.phase = SyncPhase::Pulling);

        let store = self.store.clone();
        let result = run_blocking(move || store.pull()).await;

        match &result {
            Ok(()) => self.status.send_modify(|s| {
                s.phase = SyncPhase::Present;
                s.last_error = None;
                s.last_success = Some(Utc::now());
                s.pulls += 1;
            }),
            Err(e) => {
                warn!(error = %e, "pull failed, keeping previous snapshot");
                self.status.send_modify(|s| {
                    s.phase = SyncPhase::Present;
                    s.last_error = Some(e.to_string());
                    s.failed_pulls += 1;
                });
            }
        }
        result
    }

    fn schedule_next(&self, interval: Duration) {
        let next = chrono::Duration::from_std(interval)
            .ok()
            .map(|d| Utc::now() + d);
        self.status.send_modify(|s| s.next_attempt = next);
    }
}

async fn run_blocking<F>(f: F) -> Result<(), SyncError>
where
    F: FnOnce() -> Result<(), SyncError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::Join(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::vcs::VersionControl;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    /// Clones by creating `.git`; fails the first `clone_failures` clones
    /// and every pull when `fail_pulls` is set.
    struct FakeVcs {
        clone_failures: u32,
        clones: AtomicU32,
        fail_pulls: bool,
    }

    impl VersionControl for FakeVcs {
        fn clone_repo(&self, _url: &str, _b: Option<&str>, dest: &Path) -> Result<(), SyncError> {
            let n = self.clones.fetch_add(1, Ordering::SeqCst);
            if n < self.clone_failures {
                return Err(SyncError::Clone("network unreachable".into()));
            }
            std::fs::create_dir_all(dest.join(".git"))?;
            Ok(())
        }

        fn pull(&self, _repo_dir: &Path, _b: Option<&str>) -> Result<(), SyncError> {
            if self.fail_pulls {
                return Err(SyncError::Pull("remote hung up".into()));
            }
            Ok(())
        }

        fn last_commit_time(&self, _repo_dir: &Path, _file: &Path) -> Option<DateTime<Utc>> {
            None
        }
    }

    fn sync_loop(tmp: &TempDir, vcs: FakeVcs, attempts: u32) -> (SyncLoop, Arc<FakeVcs>) {
        let mut cfg = Config::for_store("https://example.com/site.git", tmp.path().join("site"));
        cfg.sync.clone_attempts = attempts;
        cfg.sync.clone_retry_secs = 0;
        let vcs = Arc::new(vcs);
        let store = Arc::new(ContentStore::new(cfg.store, vcs.clone()));
        (SyncLoop::new(store, cfg.sync), vcs)
    }

    #[tokio::test]
    async fn test_bootstrap_clones_when_absent() {
        let tmp = TempDir::new().unwrap();
        let (sync, vcs) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 0,
                clones: AtomicU32::new(0),
                fail_pulls: false,
            },
            1,
        );
        assert_eq!(sync.status().phase, SyncPhase::Absent);

        sync.bootstrap().await.unwrap();
        assert_eq!(sync.status().phase, SyncPhase::Present);
        assert!(sync.status().last_success.is_some());
        assert_eq!(vcs.clones.load(Ordering::SeqCst), 1);

        // Already present: no second clone.
        sync.bootstrap().await.unwrap();
        assert_eq!(vcs.clones.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_returned() {
        let tmp = TempDir::new().unwrap();
        let (sync, _) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 1,
                clones: AtomicU32::new(0),
                fail_pulls: false,
            },
            1,
        );
        let err = sync.bootstrap().await.unwrap_err();
        assert!(matches!(err, SyncError::Clone(_)));
        let status = sync.status();
        assert_eq!(status.phase, SyncPhase::Absent);
        assert!(status.last_error.unwrap().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_bootstrap_retries_up_to_configured_attempts() {
        let tmp = TempDir::new().unwrap();
        let (sync, vcs) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 2,
                clones: AtomicU32::new(0),
                fail_pulls: false,
            },
            3,
        );
        sync.bootstrap().await.unwrap();
        assert_eq!(vcs.clones.load(Ordering::SeqCst), 3);
        assert_eq!(sync.status().phase, SyncPhase::Present);
    }

    #[tokio::test]
    async fn test_pull_failure_is_recorded_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let (sync, _) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 0,
                clones: AtomicU32::new(0),
                fail_pulls: true,
            },
            1,
        );
        sync.bootstrap().await.unwrap();

        assert!(sync.tick().await.is_err());
        assert!(sync.tick().await.is_err());

        let status = sync.status();
        assert_eq!(status.phase, SyncPhase::Present);
        assert_eq!(status.failed_pulls, 2);
        assert_eq!(status.pulls, 0);
        assert!(status.last_error.unwrap().contains("remote hung up"));
    }

    #[tokio::test]
    async fn test_tick_reclones_vanished_store() {
        let tmp = TempDir::new().unwrap();
        let (sync, vcs) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 0,
                clones: AtomicU32::new(0),
                fail_pulls: false,
            },
            1,
        );
        sync.bootstrap().await.unwrap();
        sync.tick().await.unwrap();
        assert_eq!(sync.status().pulls, 1);

        std::fs::remove_dir_all(tmp.path().join("site")).unwrap();
        sync.tick().await.unwrap();
        assert_eq!(vcs.clones.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_handle_observes_spawned_loop() {
        let tmp = TempDir::new().unwrap();
        let (sync, _) = sync_loop(
            &tmp,
            FakeVcs {
                clone_failures: 0,
                clones: AtomicU32::new(0),
                fail_pulls: false,
            },
            1,
        );
        sync.bootstrap().await.unwrap();

        let (handle, task) = sync.spawn();
        let mut rx = handle.subscribe();
        rx.wait_for(|s| s.pulls >= 1).await.unwrap();
        assert!(handle.status().last_error.is_none());
        task.abort();
    }
}
