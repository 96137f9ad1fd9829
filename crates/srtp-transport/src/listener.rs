//! Listener registry for inbound packets and transport readiness
//!
//! Listeners are invoked synchronously, in registration order, from the call
//! that produced the event. Async consumers register a [`ChannelListener`]
//! (see [`crate::SrtpTransport::subscribe`]) and read from the receiver.

use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::trace;

use crate::transport::{PacketKind, PacketTime};

/// Events re-emitted by the secure transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A packet was received and unprotected
    PacketReceived {
        /// RTP or RTCP
        kind: PacketKind,

        /// Plaintext packet
        packet: Bytes,

        /// Arrival time reported by the underlying transport
        packet_time: PacketTime,
    },

    /// The underlying transport became writable (or stopped being writable)
    ReadyToSend(bool),
}

/// Handle returned by [`EventListeners::add`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Receiver of transport events
pub trait TransportListener: Send {
    /// Handle one event
    fn on_event(&mut self, event: &TransportEvent);
}

impl<F> TransportListener for F
where
    F: FnMut(&TransportEvent) + Send,
{
    fn on_event(&mut self, event: &TransportEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded tokio channel
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<TransportEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiver it feeds
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TransportListener for ChannelListener {
    fn on_event(&mut self, event: &TransportEvent) {
        if self.sender.send(event.clone()).is_err() {
            trace!("Event receiver dropped, discarding {:?}", event);
        }
    }
}

/// Ordered set of registered listeners
#[derive(Default)]
pub struct EventListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn TransportListener>)>,
}

impl EventListeners {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&mut self, listener: Box<dyn TransportListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Unregister a listener. Returns false if `id` was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener
    pub fn emit(&mut self, event: &TransportEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}
