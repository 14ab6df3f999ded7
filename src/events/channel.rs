//! Crossbeam-backed event channel.
//!
//! Progress reporting is best effort: a sender whose receiver is gone keeps
//! working and simply drops what it is given.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Producer half, cloned into every component that reports progress
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Hand an event to the receiver, or drop it if nobody listens
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Consumer half, owned by the UI layer
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block for the next event; `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Events until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Creates connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded pair; events are small and a slow UI must never stall a drain
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender for callers that do not care about progress
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
