//! Trip store seam.
//!
//! The store is the source of truth for confirmed trips. Subscribers receive
//! the full set of one role's trips every time any of them changes; the live
//! matcher reconciles each snapshot with its own registry.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::{Role, TripRecord, TripStatus};

/// Every stored trip of one role at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct TripSnapshot {
    pub role: Role,
    pub records: Vec<TripRecord>,
}

/// A subscribable collection of trip records.
pub trait TripStore: Send + Sync {
    /// Receive a snapshot of `role`'s trips now and after every change.
    /// The stream ends when the store hangs up.
    fn subscribe(&self, role: Role) -> Result<Receiver<TripSnapshot>, StoreError>;
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<String, TripRecord>,
    subscribers: Vec<(Role, Sender<TripSnapshot>)>,
    closed: bool,
}

impl StoreState {
    fn snapshot(&self, role: Role) -> TripSnapshot {
        TripSnapshot {
            role,
            records: self
                .records
                .values()
                .filter(|r| r.role == role)
                .cloned()
                .collect(),
        }
    }

    /// Push a fresh snapshot to every subscriber of `role`, dropping the ones
    /// that hung up.
    fn notify(&mut self, role: Role) {
        let snapshot = self.snapshot(role);
        self.subscribers.retain(|(subscribed, sender)| {
            *subscribed != role || sender.send(snapshot.clone()).is_ok()
        });
    }
}

/// Reference store kept in process memory.
///
/// Records are keyed by trip ID; snapshots list them in ID order.
#[derive(Default)]
pub struct InMemoryTripStore {
    state: Mutex<StoreState>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record.
    pub fn put(&self, record: TripRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }

        let role = record.role;
        let previous = state.records.insert(record.id.clone(), record);
        state.notify(role);
        // A trip that switched roles also leaves its old role's snapshot.
        if let Some(previous) = previous.filter(|p| p.role != role) {
            state.notify(previous.role);
        }
        Ok(())
    }

    /// Mark a trip closed. Returns whether it existed.
    pub fn close(&self, id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }

        let Some(record) = state.records.get_mut(id) else {
            return Ok(false);
        };
        record.status = TripStatus::Closed;
        let role = record.role;
        state.notify(role);
        Ok(true)
    }

    /// Delete a record. Returns it if it existed.
    pub fn remove(&self, id: &str) -> Result<Option<TripRecord>, StoreError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }

        let removed = state.records.remove(id);
        if let Some(record) = &removed {
            state.notify(record.role);
        }
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<TripRecord> {
        self.state.lock().records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Hang up every subscription. Later writes and subscriptions fail.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        let dropped = state.subscribers.len();
        state.subscribers.clear();
        debug!("[RideMatch] Trip store shut down, {} subscriptions ended", dropped);
    }
}

impl TripStore for InMemoryTripStore {
    fn subscribe(&self, role: Role) -> Result<Receiver<TripSnapshot>, StoreError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(StoreError::Closed);
        }

        let (sender, receiver) = mpsc::channel();
        sender
            .send(state.snapshot(role))
            .map_err(|_| StoreError::Unavailable("subscriber dropped".to_string()))?;
        state.subscribers.push((role, sender));
        Ok(receiver)
    }
}
