//! Profile Sync Propagator
//!
//! Pushes display-name edits from the account store back into the identity
//! store, out of band. Jobs go onto a bounded queue drained by one dispatcher
//! task; a semaphore caps how many directory calls run at once. A full queue
//! drops the job. Failures are logged and never retried.
//!
//! Calls for one username never overlap: while a user's call is in flight,
//! newer names for that user wait in a single pending slot, and only the
//! latest one is sent once the call returns. The identity record therefore
//! ends on the last name handed to [`ProfileSyncPropagator::propagate`].

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::directory::IdentityDirectory;

#[derive(Debug, Clone)]
struct SyncJob {
    username: String,
    display_name: String,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    superseded: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time propagation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub enqueued: u64,
    pub dropped: u64,
    /// Pending names replaced by a newer one before being sent
    pub superseded: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Usernames with a call in flight, mapped to the next name to send
type Lanes = Arc<Mutex<HashMap<String, Option<String>>>>;

pub struct ProfileSyncPropagator {
    sender: Mutex<Option<mpsc::Sender<SyncJob>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    shutdown_grace: Duration,
}

impl ProfileSyncPropagator {
    /// Start the dispatcher. Must be called from within a tokio runtime.
    pub fn spawn(directory: Arc<dyn IdentityDirectory>, config: &SyncConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let permits = config.max_in_flight.clamp(1, u32::MAX as usize);
        let counters = Arc::new(Counters::default());

        let dispatcher = tokio::spawn(dispatch(
            receiver,
            directory,
            Arc::new(Semaphore::new(permits)),
            permits as u32,
            counters.clone(),
        ));

        Self {
            sender: Mutex::new(Some(sender)),
            dispatcher: Mutex::new(Some(dispatcher)),
            counters,
            shutdown_grace: config.shutdown_grace,
        }
    }

    /// Hand a display-name change to the background pool.
    ///
    /// Never waits. Returns `false` when the job was dropped.
    pub fn propagate(&self, username: &str, display_name: &str) -> bool {
        let job = SyncJob {
            username: username.to_string(),
            display_name: display_name.to_string(),
        };

        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            warn!(username = %username, "Profile sync after shutdown; dropping");
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match sender.try_send(job) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(username = %job.username, "Profile sync queue full; dropping update");
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(username = %job.username, "Profile sync dispatcher stopped; dropping update");
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            superseded: self.counters.superseded.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting jobs and wait, up to the grace period, for queued and
    /// running ones to finish.
    pub async fn shutdown(&self) {
        self.sender.lock().take();
        let Some(dispatcher) = self.dispatcher.lock().take() else {
            return;
        };

        match tokio::time::timeout(self.shutdown_grace, dispatcher).await {
            Ok(_) => info!(stats = ?self.stats(), "Profile sync drained"),
            Err(_) => warn!(stats = ?self.stats(), "Profile sync shutdown grace elapsed with jobs pending"),
        }
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<SyncJob>,
    directory: Arc<dyn IdentityDirectory>,
    limit: Arc<Semaphore>,
    permits: u32,
    counters: Arc<Counters>,
) {
    let lanes: Lanes = Arc::default();

    while let Some(job) = receiver.recv().await {
        {
            let mut active = lanes.lock();
            if let Some(pending) = active.get_mut(&job.username) {
                if pending.replace(job.display_name).is_some() {
                    counters.superseded.fetch_add(1, Ordering::Relaxed);
                }
                continue;
            }
            active.insert(job.username.clone(), None);
        }

        let Ok(permit) = limit.clone().acquire_owned().await else {
            break;
        };
        let directory = directory.clone();
        let counters = counters.clone();
        let lanes = lanes.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let SyncJob {
                username,
                mut display_name,
            } = job;

            loop {
                send(directory.as_ref(), &username, &display_name, &counters).await;

                let mut active = lanes.lock();
                let next = active.get_mut(&username).and_then(Option::take);
                match next {
                    Some(next) => display_name = next,
                    None => {
                        active.remove(&username);
                        break;
                    }
                }
            }
        });
    }

    // Queue closed; wait for in-flight calls
    let _ = limit.acquire_many(permits).await;
}

async fn send(directory: &dyn IdentityDirectory, username: &str, display_name: &str, counters: &Counters) {
    match directory.update_display_name(username, display_name).await {
        Ok(()) => {
            debug!(username = %username, "Display name propagated");
            counters.succeeded.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            warn!(username = %username, error = %e, "Display name propagation failed");
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{DirectoryError, DirectoryResult};
    use async_trait::async_trait;
    use walletsync_auth::{Principal, PublicInfo};

    #[derive(Default)]
    struct Recording {
        updates: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl IdentityDirectory for Recording {
        async fn public_info(&self, _: &str, _: &Principal) -> DirectoryResult<PublicInfo> {
            Err(DirectoryError::NotFound)
        }

        async fn update_display_name(&self, username: &str, display_name: &str) -> DirectoryResult<()> {
            self.updates
                .lock()
                .push((username.to_string(), display_name.to_string()));
            Ok(())
        }
    }

    /// Holds calls carrying `slow_name` open for a while; keeps the last write per user
    struct SlowFor {
        slow_name: &'static str,
        calls: Mutex<Vec<String>>,
        stored: Mutex<HashMap<String, String>>,
    }

    impl SlowFor {
        fn new(slow_name: &'static str) -> Self {
            Self {
                slow_name,
                calls: Mutex::new(Vec::new()),
                stored: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl IdentityDirectory for SlowFor {
        async fn public_info(&self, _: &str, _: &Principal) -> DirectoryResult<PublicInfo> {
            Err(DirectoryError::NotFound)
        }

        async fn update_display_name(&self, username: &str, display_name: &str) -> DirectoryResult<()> {
            self.calls.lock().push(display_name.to_string());
            if display_name == self.slow_name {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            self.stored
                .lock()
                .insert(username.to_string(), display_name.to_string());
            Ok(())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl IdentityDirectory for Unreachable {
        async fn public_info(&self, _: &str, _: &Principal) -> DirectoryResult<PublicInfo> {
            Err(DirectoryError::Unreachable("connection refused".to_string()))
        }

        async fn update_display_name(&self, _: &str, _: &str) -> DirectoryResult<()> {
            Err(DirectoryError::Unreachable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_jobs_reach_directory() {
        let directory = Arc::new(Recording::default());
        let propagator = ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default());

        assert!(propagator.propagate("alice", "Alice B"));
        assert!(propagator.propagate("bob", "Bob B"));
        propagator.shutdown().await;

        let mut updates = directory.updates.lock().clone();
        updates.sort();
        assert_eq!(
            updates,
            vec![
                ("alice".to_string(), "Alice B".to_string()),
                ("bob".to_string(), "Bob B".to_string()),
            ]
        );
        assert_eq!(propagator.stats().succeeded, 2);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let propagator = ProfileSyncPropagator::spawn(Arc::new(Unreachable), &SyncConfig::default());

        assert!(propagator.propagate("alice", "Alice B"));
        propagator.shutdown().await;

        let stats = propagator.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let directory = Arc::new(Recording::default());
        let config = SyncConfig {
            queue_capacity: 1,
            max_in_flight: 1,
            ..SyncConfig::default()
        };
        let propagator = ProfileSyncPropagator::spawn(directory.clone(), &config);

        // Single-threaded test runtime: the dispatcher cannot run between these calls
        assert!(propagator.propagate("alice", "One"));
        assert!(!propagator.propagate("alice", "Two"));
        assert!(!propagator.propagate("alice", "Three"));
        propagator.shutdown().await;

        assert_eq!(propagator.stats().dropped, 2);
        assert_eq!(directory.updates.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_propagate_after_shutdown() {
        let propagator =
            ProfileSyncPropagator::spawn(Arc::new(Recording::default()), &SyncConfig::default());
        propagator.shutdown().await;

        assert!(!propagator.propagate("alice", "Late"));
        assert_eq!(propagator.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_later_name_wins_over_slow_earlier_call() {
        let directory = Arc::new(SlowFor::new("First"));
        let propagator = ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default());

        assert!(propagator.propagate("alice", "First"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(propagator.propagate("alice", "Second"));
        propagator.shutdown().await;

        assert_eq!(directory.stored.lock().get("alice").map(String::as_str), Some("Second"));
        assert_eq!(*directory.calls.lock(), vec!["First".to_string(), "Second".to_string()]);
        assert_eq!(propagator.stats().succeeded, 2);
    }

    #[tokio::test]
    async fn test_pending_names_collapse_to_latest() {
        let directory = Arc::new(SlowFor::new("First"));
        let propagator = ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default());

        assert!(propagator.propagate("alice", "First"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(propagator.propagate("alice", "Second"));
        assert!(propagator.propagate("alice", "Third"));
        propagator.shutdown().await;

        assert_eq!(directory.stored.lock().get("alice").map(String::as_str), Some("Third"));
        assert_eq!(*directory.calls.lock(), vec!["First".to_string(), "Third".to_string()]);

        let stats = propagator.stats();
        assert_eq!(stats.enqueued, 3);
        assert_eq!(stats.superseded, 1);
        assert_eq!(stats.succeeded, 2);
    }
}
