//! Broadcast hub: fan-out of stream events to all live subscribers.
//!
//! The hub owns the registry of subscriber channels. Every snapshot, log
//! entry and heartbeat is offered to every channel with a non-blocking
//! `try_send`; a channel that cannot accept the write (full or closed) is
//! deregistered on the spot. That is the system's only recovery action for
//! a subscriber — the client reconnects and re-registers rather than being
//! retried in place, so a slow consumer can never stall the tick path.
//!
//! Registration seeds the new channel with its catch-up batch while holding
//! the registry lock, guaranteeing no live event can interleave before the
//! batch.

use crate::types::StreamEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Registry of subscriber channels with non-blocking fan-out.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<u64, mpsc::Sender<StreamEvent>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl BroadcastHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(8),
        }
    }

    /// Register a new subscriber channel, seeding it with the catch-up
    /// batch (connected, log history, latest snapshot) before any live
    /// event can reach it.
    pub fn register(&self, seed: Vec<StreamEvent>) -> (u64, mpsc::Receiver<StreamEvent>) {
        // Channel must be able to hold the whole seed plus live headroom.
        let (tx, rx) = mpsc::channel(self.buffer.max(seed.len() + 1));
        let mut subs = self.lock_registry();

        for event in seed {
            // Cannot fail: the channel was sized for the seed and nothing
            // else holds this sender yet.
            let _ = tx.try_send(event);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        subs.insert(id, tx);
        debug!(subscriber = id, total = subs.len(), "Subscriber registered");
        (id, rx)
    }

    /// Remove a subscriber explicitly (client closed its connection).
    pub fn deregister(&self, id: u64) {
        let mut subs = self.lock_registry();
        if subs.remove(&id).is_some() {
            debug!(subscriber = id, total = subs.len(), "Subscriber deregistered");
        }
    }

    /// Push one event to every registered channel, pruning any channel
    /// whose write fails. Returns the number of subscribers that accepted.
    pub fn broadcast(&self, event: &StreamEvent) -> usize {
        let mut subs = self.lock_registry();

        let mut dead = Vec::new();
        for (id, tx) in subs.iter() {
            if tx.try_send(event.clone()).is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            subs.remove(&id);
            info!(subscriber = id, total = subs.len(), "Dropped unresponsive subscriber");
        }
        subs.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_registry().len()
    }

    /// Periodic heartbeat fan-out, cancelled cleanly on shutdown so no
    /// timer outlives the bridge.
    pub async fn run_heartbeat(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first interval tick fires immediately; skip it so heartbeats
        // start one full period after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("[Heartbeat] Shutdown signal received");
                    return;
                }
                _ = ticker.tick() => {
                    self.broadcast(&StreamEvent::Heartbeat {
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<StreamEvent>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
