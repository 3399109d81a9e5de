//! Broadcast registry of open channels.
//!
//! Channels are appended when they open and removed when they close.
//! Broadcasts iterate over a cloned snapshot so the lock is never held while
//! sending.

use std::sync::{Arc, Mutex};

use crate::application::transport::{ChannelId, DataChannel};

/// Mutex-guarded list of channels eligible for capability broadcasts.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Mutex<Vec<Arc<dyn DataChannel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel.  Re-registering the same id replaces the old entry.
    pub fn register(&self, channel: Arc<dyn DataChannel>) {
        let mut channels = self.lock();
        let id = channel.id();
        channels.retain(|c| c.id() != id);
        channels.push(channel);
    }

    /// Removes a channel by id.  Returns `true` if it was present.
    pub fn remove(&self, id: ChannelId) -> bool {
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|c| c.id() != id);
        channels.len() != before
    }

    /// Drops every channel that reports itself closed.  Returns how many were removed.
    pub fn prune_closed(&self) -> usize {
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|c| c.is_open());
        before - channels.len()
    }

    /// A point-in-time copy of the registered channels.
    pub fn snapshot(&self) -> Vec<Arc<dyn DataChannel>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn DataChannel>>> {
        self.channels.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
