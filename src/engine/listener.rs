//! Match event delivery.
//!
//! The live matcher pushes every surviving pair and every refreshed match set
//! to a [`MatchListener`]. Events are emitted from whichever thread called the
//! matcher, so implementations must be `Send + Sync`.

use std::sync::mpsc::{self, Receiver, Sender};

use log::debug;

use crate::{DecodeError, MatchResult};

/// The full current match set of one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpdate {
    pub trip_id: String,
    pub matches: Vec<MatchResult>,
}

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// A new or re-registered trip matched a counterpart. Both parties are
    /// named in the result.
    Paired(MatchResult),
    /// A trip's match set was recomputed after its counterpart pool changed.
    Refreshed(MatchUpdate),
    /// A stored trip could not be decoded and was left out of matching.
    Rejected { trip_id: String, error: DecodeError },
}

impl MatchEvent {
    /// Whether a subscriber following `trip_id` should see this event.
    pub fn concerns(&self, trip_id: &str) -> bool {
        match self {
            MatchEvent::Paired(result) => result.involves(trip_id),
            MatchEvent::Refreshed(update) => {
                update.trip_id == trip_id || update.matches.iter().any(|m| m.involves(trip_id))
            }
            MatchEvent::Rejected { trip_id: id, .. } => id == trip_id,
        }
    }
}

/// Receiver of match events.
pub trait MatchListener: Send + Sync {
    fn on_event(&self, event: &MatchEvent);
}

/// Listener that drops everything.
pub struct NoopListener;

impl MatchListener for NoopListener {
    fn on_event(&self, _event: &MatchEvent) {}
}

/// Listener that forwards events into an mpsc channel.
pub struct ChannelListener {
    sender: Sender<MatchEvent>,
}

impl ChannelListener {
    /// Create the listener and the receiving end for the subscriber.
    pub fn new() -> (Self, Receiver<MatchEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl MatchListener for ChannelListener {
    fn on_event(&self, event: &MatchEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("[RideMatch] Match event subscriber has hung up");
        }
    }
}
