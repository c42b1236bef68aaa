//! Webhook debounce and dispatch
//!
//! Rapid webhook bursts for the same title (grab, import, upgrade, rename
//! often land within seconds) collapse into a single processing pass.
//! Each entity key gets a debounce window that restarts on every new
//! event; only the latest payload survives. Dispatch runs on a bounded
//! worker pool with at most one in-flight pass per key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::process::{BatchHandler, WebhookEvent};

struct PendingEntry {
    event: WebhookEvent,
    /// Bumped on every re-arm; a timer only fires if its generation is
    /// still current when it wakes
    generation: u64,
    received_at: DateTime<Utc>,
}

#[derive(Default)]
struct BatcherState {
    pending: HashMap<String, PendingEntry>,
    processing: HashSet<String>,
    next_generation: u64,
    closed: bool,
}

/// Queue-state snapshot for the status endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BatcherStatus {
    pub pending: Vec<PendingSummary>,
    pub processing: Vec<String>,
    pub batch_delay_secs: f64,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingSummary {
    pub entity_key: String,
    pub received_at: DateTime<Utc>,
}

struct ProcessingGuard {
    state: Arc<Mutex<BatcherState>>,
    key: String,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.state.lock().processing.remove(&self.key);
    }
}

pub struct WebhookBatcher {
    state: Arc<Mutex<BatcherState>>,
    handler: Arc<dyn BatchHandler>,
    workers: Arc<Semaphore>,
    batch_delay: Duration,
    max_concurrent: usize,
}

impl WebhookBatcher {
    pub fn new(handler: Arc<dyn BatchHandler>, batch_delay: Duration, max_concurrent: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BatcherState::default())),
            handler,
            workers: Arc::new(Semaphore::new(max_concurrent)),
            batch_delay,
            max_concurrent,
        }
    }

    /// Enqueue an event, replacing any pending event for the same key and
    /// restarting its debounce window. Returns false after shutdown.
    pub fn submit(self: &Arc<Self>, key: String, event: WebhookEvent) -> bool {
        let generation = {
            let mut state = self.state.lock();
            if state.closed {
                warn!(%key, "Batcher shut down, event dropped");
                return false;
            }
            let generation = state.next_generation;
            state.next_generation += 1;
            let replaced = state
                .pending
                .insert(
                    key.clone(),
                    PendingEntry {
                        event,
                        generation,
                        received_at: Utc::now(),
                    },
                )
                .is_some();
            if replaced {
                debug!(%key, "Debounce window restarted, payload replaced");
            } else {
                debug!(%key, delay_secs = self.batch_delay.as_secs_f64(), "Event queued");
            }
            generation
        };

        let batcher = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(batcher.batch_delay).await;
            batcher.fire(&key, generation).await;
        });
        true
    }

    /// Timer expiry: claim the pending entry if this timer is still the
    /// current one, then dispatch.
    async fn fire(self: &Arc<Self>, key: &str, generation: u64) {
        let event = {
            let mut state = self.state.lock();
            match state.pending.get(key) {
                Some(entry) if entry.generation == generation => {}
                // superseded by a newer event or already consumed
                _ => return,
            }
            let Some(entry) = state.pending.remove(key) else {
                return;
            };
            if state.processing.contains(key) {
                // A pass for this key is mid-flight and will observe the
                // latest persisted state when it writes; a stacked
                // duplicate pass would only repeat the same queries.
                debug!(key, "Dispatch skipped, key already in flight");
                return;
            }
            state.processing.insert(key.to_string());
            entry.event
        };

        let permit = match Arc::clone(&self.workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let batcher = Arc::clone(self);
        let key = key.to_string();
        tokio::spawn(async move {
            // Releases the in-flight marker on every exit path, including
            // a panicking handler, so the key can never wedge "processing".
            let _guard = ProcessingGuard {
                state: Arc::clone(&batcher.state),
                key: key.clone(),
            };
            let started = std::time::Instant::now();
            info!(%key, "Processing batch");
            if let Err(e) = batcher.handler.handle(&key, event).await {
                warn!(%key, error = format!("{e:#}").as_str(), "Batch processing failed");
            } else {
                info!(%key, elapsed_ms = started.elapsed().as_millis() as u64, "Batch complete");
            }
            drop(permit);
        });
    }

    pub fn status(&self) -> BatcherStatus {
        let state = self.state.lock();
        let mut pending: Vec<PendingSummary> = state
            .pending
            .iter()
            .map(|(key, entry)| PendingSummary {
                entity_key: key.clone(),
                received_at: entry.received_at,
            })
            .collect();
        pending.sort_by(|a, b| a.entity_key.cmp(&b.entity_key));
        let mut processing: Vec<String> = state.processing.iter().cloned().collect();
        processing.sort();
        BatcherStatus {
            pending,
            processing,
            batch_delay_secs: self.batch_delay.as_secs_f64(),
            max_concurrent: self.max_concurrent,
        }
    }

    /// Stop accepting events and drop everything still pending. In-flight
    /// passes run to completion. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let dropped = state.pending.len();
        state.pending.clear();
        if dropped > 0 {
            info!(dropped, "Batcher shut down, pending events discarded");
        } else {
            info!("Batcher shut down");
        }
    }

    /// True until `shutdown` has been called
    pub fn is_accepting(&self) -> bool {
        !self.state.lock().closed
    }

    /// Wait until nothing is pending or in flight. A fired timer moves its
    /// entry from `pending` to `processing` atomically, so checking both
    /// sets under one lock cannot miss a dispatch in between. `shutdown`
    /// clears `pending` first, so after it this only waits on in-flight
    /// passes.
    pub async fn drain(&self) {
        loop {
            {
                let state = self.state.lock();
                if state.pending.is_empty() && state.processing.is_empty() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
