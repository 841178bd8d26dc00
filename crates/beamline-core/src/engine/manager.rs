use super::algorithm::{AlgorithmHost, AlgorithmState};
use super::cancellation::CancellationToken;
use super::error::EngineError;
use super::notification::{AlgorithmEvent, NotificationHub};
use super::services::Services;
use slotmap::SlotMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

slotmap::new_key_type! {
    struct ManagedId;
}

/// A tracked algorithm instance handed out by the [`AlgorithmManager`].
///
/// The host sits behind a mutex so the manager can probe completion and
/// request cancellation while another thread is executing; the cancellation
/// token is cached outside the lock for exactly that reason.
pub struct ManagedAlgorithm {
    name: &'static str,
    version: i32,
    host: Mutex<AlgorithmHost>,
    token: CancellationToken,
    events: Arc<NotificationHub<AlgorithmEvent>>,
}

impl ManagedAlgorithm {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Locks the host for configuration or inspection.
    pub fn host(&self) -> MutexGuard<'_, AlgorithmHost> {
        self.host.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests cooperative cancellation without waiting for the host lock.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Executes the algorithm, publishing `Starting`/`Finished` events around
    /// the run.
    pub fn execute(&self) -> Result<bool, EngineError> {
        self.events.publish(&AlgorithmEvent::Starting {
            name: self.name.to_string(),
            version: self.version,
        });
        let result = self.host().execute();
        self.events.publish(&AlgorithmEvent::Finished {
            name: self.name.to_string(),
            version: self.version,
            success: matches!(result, Ok(true)),
        });
        result
    }

    /// Whether the instance has finished (successfully or not). An instance
    /// whose host is locked counts as still busy.
    fn is_completed(&self) -> bool {
        match self.host.try_lock() {
            Ok(host) => matches!(
                host.state(),
                AlgorithmState::Executed | AlgorithmState::Failed
            ),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for ManagedAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAlgorithm")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Default)]
struct TrackedSet {
    entries: SlotMap<ManagedId, Arc<ManagedAlgorithm>>,
    order: VecDeque<ManagedId>,
    max: usize,
}

/// Creates, tracks, and cancels algorithm instances beyond the registry's
/// plain construction.
///
/// Tracked ("managed") instances are kept in insertion order. Once the
/// configured cap is reached, the oldest completed instance is evicted to
/// make room; when nothing has completed the cap is advisory and the set
/// grows. Running algorithms are never force-cancelled to make room.
pub struct AlgorithmManager {
    services: Arc<Services>,
    tracked: Mutex<TrackedSet>,
    events: Arc<NotificationHub<AlgorithmEvent>>,
}

impl AlgorithmManager {
    pub fn new(services: Arc<Services>) -> Self {
        let max = services.config().max_managed_algorithms.max(1);
        Self {
            services,
            tracked: Mutex::new(TrackedSet {
                entries: SlotMap::with_key(),
                order: VecDeque::new(),
                max,
            }),
            events: Arc::new(NotificationHub::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackedSet> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds, initializes, and tracks an instance of the named algorithm.
    /// `LATEST_VERSION` (-1) picks the highest registered version.
    pub fn create(&self, name: &str, version: i32) -> Result<Arc<ManagedAlgorithm>, EngineError> {
        let kernel = self.services.registry().create(name, version)?;
        let mut host = AlgorithmHost::new(kernel, Arc::clone(&self.services));
        host.initialize()?;

        let managed = Arc::new(ManagedAlgorithm {
            name: host.name(),
            version: host.version(),
            token: host.cancellation_token(),
            host: Mutex::new(host),
            events: Arc::clone(&self.events),
        });

        let mut tracked = self.lock();
        if tracked.entries.len() >= tracked.max {
            Self::evict_oldest_completed(&mut tracked);
        }
        let id = tracked.entries.insert(Arc::clone(&managed));
        tracked.order.push_back(id);
        debug!(
            algorithm = managed.name,
            version = managed.version,
            tracked = tracked.entries.len(),
            "Created managed algorithm."
        );
        Ok(managed)
    }

    fn evict_oldest_completed(tracked: &mut TrackedSet) {
        let candidate = tracked.order.iter().copied().find(|&id| {
            tracked
                .entries
                .get(id)
                .map(|entry| entry.is_completed())
                .unwrap_or(false)
        });
        match candidate {
            Some(id) => {
                if let Some(entry) = tracked.entries.remove(id) {
                    debug!(
                        algorithm = entry.name,
                        "Evicted oldest completed managed algorithm."
                    );
                }
                tracked.order.retain(|&other| other != id);
            }
            None => {
                debug!("Managed algorithm cap reached with nothing evictable; growing past it.");
            }
        }
    }

    /// Builds a plain, untracked host. Never affected by `cancel_all`.
    pub fn create_unmanaged(&self, name: &str, version: i32) -> Result<AlgorithmHost, EngineError> {
        let kernel = self.services.registry().create(name, version)?;
        Ok(AlgorithmHost::new(kernel, Arc::clone(&self.services)))
    }

    /// Number of currently tracked instances.
    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    /// Adjusts the tracking cap (floored at one).
    pub fn set_max_algorithms(&self, max: usize) {
        self.lock().max = max.max(1);
    }

    /// Drops every tracked handle. Running algorithms are not cancelled, so
    /// calling this while executions are in flight leaves them running
    /// untracked; avoid that.
    pub fn clear(&self) {
        let mut tracked = self.lock();
        tracked.entries.clear();
        tracked.order.clear();
    }

    /// Requests cooperative cancellation on every tracked instance. Kernels
    /// observe it at their next poll; instances that have not started yet
    /// clear the request when their execution begins.
    pub fn cancel_all(&self) {
        let tracked = self.lock();
        for entry in tracked.entries.values() {
            entry.cancel();
        }
        info!(
            count = tracked.entries.len(),
            "Requested cancellation of all managed algorithms."
        );
    }

    /// The hub publishing `Starting`/`Finished` events for managed runs.
    pub fn events(&self) -> &NotificationHub<AlgorithmEvent> {
        &self.events
    }
}

impl std::fmt::Debug for AlgorithmManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmManager")
            .field("tracked", &self.size())
            .finish()
    }
}
