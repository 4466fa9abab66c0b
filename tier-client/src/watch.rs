//! Identity-driven resolution lifecycle
//!
//! `TierWatcher` owns the published `TierSnapshot` state. Every identity
//! change starts a fresh resolution on the runtime and bumps a generation
//! counter; a resolution may only publish while its generation is still the
//! active one, so results arriving for a superseded identity are discarded
//! instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use shared::{TierSnapshot, UserIdentity};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::resolver::TierResolver;

struct WatcherInner {
    resolver: TierResolver,
    generation: AtomicU64,
    /// Serializes publications so the generation check and the send are one
    /// step; without it a stale task could pass the check, lose the CPU, and
    /// publish after a newer generation already did.
    publish_lock: Mutex<()>,
    tx: watch::Sender<TierSnapshot>,
}

impl WatcherInner {
    fn publish_if_current(&self, generation: u64, snapshot: TierSnapshot) {
        let _guard = self.publish_lock.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale resolution result");
            return;
        }
        self.tx.send_replace(snapshot);
    }
}

/// Publishes tier snapshots for the currently observed identity
#[derive(Clone)]
pub struct TierWatcher {
    inner: Arc<WatcherInner>,
}

impl TierWatcher {
    pub fn new(resolver: TierResolver) -> Self {
        let (tx, _rx) = watch::channel(TierSnapshot::loading());
        Self {
            inner: Arc::new(WatcherInner {
                resolver,
                generation: AtomicU64::new(0),
                publish_lock: Mutex::new(()),
                tx,
            }),
        }
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<TierSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> TierSnapshot {
        self.inner.tx.borrow().clone()
    }

    /// Observe an identity change and start a resolution for it.
    ///
    /// Absent identity publishes a non-loading `"free"` snapshot immediately,
    /// with no store calls. Otherwise the state resets to loading and the
    /// resolution runs on the runtime; the returned handle completes when it
    /// finishes (whether or not its result was still current).
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_identity(&self, identity: Option<UserIdentity>) -> Option<JoinHandle<()>> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(identity) = identity else {
            self.inner
                .publish_if_current(generation, TierSnapshot::signed_out());
            return None;
        };

        self.inner
            .publish_if_current(generation, TierSnapshot::loading());

        let inner = self.inner.clone();
        Some(tokio::spawn(async move {
            let snapshot = inner.resolver.resolve(&identity).await;
            inner.publish_if_current(generation, snapshot);
        }))
    }
}
