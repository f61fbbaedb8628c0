//! # Connectivity Gate
//!
//! Tracks whether the backing store is reachable and refuses writes while
//! it isn't.
//!
//! ## How It Works
//! ```text
//! ┌───────────────┐   every probe_interval (30s)   ┌─────────────────┐
//! │  probe task   │ ──────────────────────────────►│ store health    │
//! │  (spawned)    │ ◄────────────────────────────── │ check (SELECT 1)│
//! └──────┬────────┘   answer within probe_timeout  └─────────────────┘
//!        │             (4s) or count as offline
//!        ▼
//!   AtomicBool  ◄── set_online() from OS reachability signals too
//!        │
//!        ▼
//!   require_online() — every ledger/shift WRITE checks this first;
//!   reads are never gated.
//! ```
//!
//! ## Rules
//! - The gate starts **online**: an idle register should not refuse its
//!   first sale while waiting for the first probe.
//! - A refused write records nothing and is never queued or retried; the
//!   cashier resubmits once the offline banner clears.
//! - State flips are logged once per transition, not per probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{RegisterError, RegisterResult};
use register_db::Database;

// =============================================================================
// Configuration
// =============================================================================

/// Probe loop configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// How often the probe runs.
    /// Default: 30 seconds
    pub probe_interval: Duration,

    /// How long a probe may take before counting as offline.
    /// Default: 4 seconds
    pub probe_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            probe_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(4),
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Shared online/offline flag.
///
/// Cheap to clone; all clones share one flag.
#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    online: Arc<AtomicBool>,
}

impl Default for ConnectivityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityGate {
    /// Creates a gate in the online state.
    pub fn new() -> Self {
        ConnectivityGate {
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether the store is currently considered reachable.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Sets the flag directly.
    ///
    /// Wired to OS reachability notifications so a pulled cable flips the
    /// banner immediately instead of waiting up to a probe interval.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was != online {
            if online {
                info!("Connectivity restored");
            } else {
                warn!("Connectivity lost");
            }
        }
    }

    /// Gate check for write operations.
    pub fn require_online(&self) -> RegisterResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(RegisterError::Offline)
        }
    }

    /// Spawns the background probe loop.
    ///
    /// Each tick runs the store health check with a hard timeout; timing
    /// out counts the same as a failed check. The returned handle stops
    /// the loop on shutdown.
    pub fn start_probe(&self, db: Database, config: GateConfig) -> ProbeHandle {
        let gate = self.clone();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        info!(
            interval_secs = config.probe_interval.as_secs(),
            timeout_secs = config.probe_timeout.as_secs(),
            "Starting connectivity probe"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.probe_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first interval tick fires immediately; skip it so the
            // gate's optimistic initial state stands until a real probe.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Connectivity probe stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let reachable = matches!(
                            tokio::time::timeout(config.probe_timeout, db.health_check()).await,
                            Ok(true)
                        );
                        gate.set_online(reachable);
                    }
                }
            }
        });

        ProbeHandle { shutdown_tx, task }
    }
}

// =============================================================================
// Probe Handle
// =============================================================================

/// Handle to the running probe task.
pub struct ProbeHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ProbeHandle {
    /// Stops the probe loop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
