//! Change event bridge: coalesces store change batches into single
//! notifications for one registered observer.

use crate::error::ApiError;
use crate::store::{EventFilter, EventTypes, StoreEvent, StoreListener, SubscriptionId, TreeStore};
use crate::types::NodeKind;
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Observer of repository changes
pub trait ChangeListener: Send + Sync {
    fn on_change(&self);
}

impl<F> ChangeListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_change(&self) {
        self()
    }
}

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Observer calls slower than this are reported
    pub slow_listener: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            slow_listener: Duration::from_millis(500),
        }
    }
}

/// Single observer slot shared by the bridge and its store-facing sink
#[derive(Default)]
struct ListenerSlot {
    listener: RwLock<Option<Arc<dyn ChangeListener>>>,
}

impl ListenerSlot {
    fn get(&self) -> Option<Arc<dyn ChangeListener>> {
        self.listener.read().clone()
    }

    fn set(&self, listener: Option<Arc<dyn ChangeListener>>) {
        *self.listener.write() = listener;
    }
}

/// Store-facing side: turns each non-empty batch into one signal carrying
/// the observer registered when the batch arrived
struct BatchSink {
    slot: Arc<ListenerSlot>,
    signals: Mutex<Option<mpsc::Sender<Arc<dyn ChangeListener>>>>,
}

impl StoreListener for BatchSink {
    fn on_event(&self, events: &[StoreEvent]) {
        if events.is_empty() {
            return;
        }
        let Some(listener) = self.slot.get() else {
            trace!(event_count = events.len(), "No change listener registered");
            return;
        };
        if let Some(signals) = self.signals.lock().as_ref() {
            if signals.send(listener).is_err() {
                debug!("Change notifier stopped, dropping batch");
            }
        }
    }
}

enum BridgeState {
    Unregistered,
    Listening {
        store: Arc<dyn TreeStore>,
        subscription: SubscriptionId,
        sink: Arc<BatchSink>,
        notifier: JoinHandle<()>,
    },
    Closed,
}

/// Bridges raw store change batches to a single [`ChangeListener`].
///
/// Each delivered batch produces at most one observer call, made to the
/// observer registered when the batch arrived. Calls run on a
/// dedicated notifier thread so the store's dispatch never waits on the
/// observer; observer panics are caught and logged.
pub struct ChangeEventBridge {
    slot: Arc<ListenerSlot>,
    state: Mutex<BridgeState>,
    config: BridgeConfig,
}

impl ChangeEventBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            slot: Arc::new(ListenerSlot::default()),
            state: Mutex::new(BridgeState::Unregistered),
            config,
        }
    }

    /// Events the bridge subscribes to
    pub fn event_filter() -> EventFilter {
        EventFilter {
            event_types: EventTypes::PROPERTY_ADDED
                .union(EventTypes::PROPERTY_CHANGED)
                .union(EventTypes::PROPERTY_REMOVED)
                .union(EventTypes::NODE_REMOVED),
            path: "/".to_string(),
            deep: true,
            node_kinds: NodeKind::COMMON_ENTITY.to_vec(),
        }
    }

    /// Subscribe to `store` and start the notifier thread
    pub fn activate(&self, store: Arc<dyn TreeStore>) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        match *state {
            BridgeState::Unregistered => {}
            BridgeState::Listening { .. } => {
                return Err(ApiError::Bridge("bridge is already listening".to_string()))
            }
            BridgeState::Closed => {
                return Err(ApiError::Bridge("bridge has been deactivated".to_string()))
            }
        }

        let (tx, rx) = mpsc::channel::<Arc<dyn ChangeListener>>();
        let slow_listener = self.config.slow_listener;
        let notifier = thread::Builder::new()
            .name("flatrepo-notifier".to_string())
            .spawn(move || run_notifier(rx, slow_listener))
            .map_err(|e| ApiError::Bridge(format!("Failed to start notifier thread: {}", e)))?;

        let sink = Arc::new(BatchSink {
            slot: Arc::clone(&self.slot),
            signals: Mutex::new(Some(tx)),
        });
        let subscription = match store.subscribe(sink.clone(), Self::event_filter()) {
            Ok(id) => id,
            Err(e) => {
                sink.signals.lock().take();
                if notifier.join().is_err() {
                    error!("Change notifier thread panicked");
                }
                return Err(ApiError::store("Failed to subscribe to store changes", e));
            }
        };

        info!(subscription = subscription.0, "Change bridge listening");
        *state = BridgeState::Listening {
            store,
            subscription,
            sink,
            notifier,
        };
        Ok(())
    }

    /// Replace the observer; `None` silences batches delivered after this call
    pub fn set_listener(&self, listener: Option<Arc<dyn ChangeListener>>) {
        self.slot.set(listener);
    }

    pub fn is_listening(&self) -> bool {
        matches!(*self.state.lock(), BridgeState::Listening { .. })
    }

    /// Unsubscribe and stop the notifier after it drains queued signals.
    ///
    /// Idempotent. A store that is already closed is only logged.
    pub fn deactivate(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), BridgeState::Closed);
        let BridgeState::Listening {
            store,
            subscription,
            sink,
            notifier,
        } = previous
        else {
            return;
        };

        if let Err(e) = store.unsubscribe(subscription) {
            debug!(subscription = subscription.0, error = %e, "Failed to unsubscribe change bridge");
        }
        sink.signals.lock().take();

        if notifier.thread().id() == thread::current().id() {
            // Deactivated from inside the observer; the loop ends on its own
            return;
        }
        if notifier.join().is_err() {
            error!("Change notifier thread panicked");
        }
        info!("Change bridge stopped");
    }
}

impl Drop for ChangeEventBridge {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn run_notifier(signals: mpsc::Receiver<Arc<dyn ChangeListener>>, slow_listener: Duration) {
    for listener in signals {
        let started = Instant::now();
        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| listener.on_change())) {
            error!(reason = %panic_message(panic.as_ref()), "Change listener failed");
        }
        let elapsed = started.elapsed();
        if elapsed > slow_listener {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Change listener is slow"
            );
        }
    }
    debug!("Change notifier exiting");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
