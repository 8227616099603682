//! Liveness monitor
//!
//! Every peer broadcasts an idle beacon on a fixed period. The monitor sends
//! ours and drops every peer whose beacons stopped arriving, which is the only
//! way a silent departure is ever noticed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::now_millis;
use crate::constants::LIVENESS_INTERVAL;
use crate::peers::Peer;
use crate::session::SessionController;

/// Periodic beacon and peer timeout sweep
pub struct LivenessMonitor {
    session: Arc<SessionController>,
    interval: Duration,
    running: AtomicBool,
    wake: Notify,
}

impl LivenessMonitor {
    /// Create a monitor with the standard heartbeat period
    pub fn new(session: Arc<SessionController>) -> Arc<Self> {
        Self::with_interval(session, LIVENESS_INTERVAL)
    }

    /// Create a monitor with a custom heartbeat period
    pub fn with_interval(session: Arc<SessionController>, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            session,
            interval,
            running: AtomicBool::new(false),
            wake: Notify::new(),
        })
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the heartbeat loop
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            info!("Liveness monitor started");
            while monitor.is_running() {
                // The logon already announced us, so the first beacon and sweep wait a full interval
                tokio::select! {
                    biased;
                    _ = monitor.wake.notified() => {}
                    _ = tokio::time::sleep(monitor.interval) => {}
                }

                // Woken for shutdown
                if !monitor.is_running() {
                    break;
                }
                monitor.tick(now_millis()).await;
            }
            info!("Liveness monitor stopped");
        })
    }

    /// Stop the loop at its next wake-up, interrupting the current sleep
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        // Stores a permit if the loop is not waiting yet
        self.wake.notify_one();
    }

    /// Run one heartbeat at time `now` (millis since epoch)
    ///
    /// Sends the own beacon, removes timed out peers (cancelling their
    /// transfers) and asks everyone to identify again if anyone was lost.
    /// Returns the removed peers.
    pub async fn tick(&self, now: i64) -> Vec<Peer> {
        self.session.send_idle_message().await;

        let removed = self.session.remove_timed_out_peers(now).await;
        if !removed.is_empty() {
            debug!("{} peer(s) timed out", removed.len());
            self.session.update_after_timeout().await;
        }
        removed
    }
}
