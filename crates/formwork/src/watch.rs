//! Watch subscriptions: an explicit observer list.
//!
//! The controller notifies every subscriber synchronously after a mutation;
//! callbacks receive the event only, never the controller, so they cannot
//! re-enter it.

/// Change notification delivered to watch subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    ValueChanged { path: String },
    ListChanged { path: String },
    StatusChanged,
    Reset,
    Submitted { successful: bool },
}

/// Handle for cancelling a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

type WatchCallback = Box<dyn Fn(&FormEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct WatcherSet {
    next: u64,
    entries: Vec<(WatchId, WatchCallback)>,
}

impl WatcherSet {
    pub(crate) fn subscribe(&mut self, callback: WatchCallback) -> WatchId {
        let id = WatchId(self.next);
        self.next += 1;
        self.entries.push((id, callback));
        id
    }

    /// Returns false if the id was already gone.
    pub(crate) fn unsubscribe(&mut self, id: WatchId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&self, event: &FormEvent) {
        for (_, callback) in &self.entries {
            callback(event);
        }
    }
}
