//! Online/offline state as an observable value.
//!
//! The monitor only reflects what the host reports. It does not probe the
//! network: a reported "online" may still fail to reach the API, and that is
//! handled by the fetch fallback in the controller.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A host-reported connectivity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivitySignal {
    Online,
    Offline,
}

/// Cheap to clone; all clones observe and drive the same state.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record the host's state. Returns true if this was a transition;
    /// repeated reports of the current state do not notify subscribers.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online = online, "Connectivity changed");
        }
        changed
    }

    pub fn handle_signal(&self, signal: ConnectivitySignal) -> bool {
        self.set_online(signal == ConnectivitySignal::Online)
    }

    /// Receiver that wakes on every transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Feed host signals from `signals` until the stream ends.
    pub fn attach<S>(&self, signals: S) -> JoinHandle<()>
    where
        S: Stream<Item = ConnectivitySignal> + Send + 'static,
    {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut signals = std::pin::pin!(signals);
            while let Some(signal) = signals.next().await {
                monitor.handle_signal(signal);
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
