use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::model::EndpointRef;
use crate::store::traits::InvalidationSink;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of invalidation signals to any number of subscribers.
///
/// Sending with no subscribers is not an error; a lagging subscriber may miss
/// signals and should refetch everything it holds.
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    sender: broadcast::Sender<EndpointRef>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EndpointRef> {
        self.sender.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationSink for InvalidationBus {
    fn invalidate(&self, endpoint: &EndpointRef) {
        if self.sender.send(endpoint.clone()).is_err() {
            log::debug!("No subscribers for invalidation of {}", endpoint);
        }
    }
}

/// Collects signals in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink {
    signals: Mutex<Vec<EndpointRef>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals(&self) -> Vec<EndpointRef> {
        self.signals.lock().clone()
    }

    pub fn take(&self) -> Vec<EndpointRef> {
        std::mem::take(&mut *self.signals.lock())
    }
}

impl InvalidationSink for RecordingSink {
    fn invalidate(&self, endpoint: &EndpointRef) {
        self.signals.lock().push(endpoint.clone());
    }
}
