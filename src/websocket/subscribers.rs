use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::error;
use parking_lot::Mutex;

use crate::models::poll::Poll;

pub type Callback = Arc<dyn Fn(&Poll) + Send + Sync>;

/// Handle returned by `subscribe`, used to remove that one callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callbacks interested in a channel's poll snapshots.
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    entries: Mutex<HashMap<SubscriptionId, Callback>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Poll) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().insert(id, Arc::new(callback));
        id
    }

    /// Returns false when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Runs without the registry lock held. Returns how many callbacks
    /// completed.
    pub fn dispatch(&self, poll: &Poll) -> usize {
        let snapshot: Vec<(SubscriptionId, Callback)> = self
            .entries
            .lock()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            if !self.entries.lock().contains_key(&id) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| callback(poll))) {
                Ok(()) => delivered += 1,
                Err(_) => error!("Subscriber {:?} panicked handling poll {}", id, poll.id),
            }
        }
        delivered
    }
}
