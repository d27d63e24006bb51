use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::mpsc;
use uilink_envelope::Envelope;

/// Session state of a transport.
///
/// The embedded channel is `Open` from construction onward; only the socket
/// channel moves between `Connecting` and `Open`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Not connected; a connect attempt is pending or scheduled.
    Connecting,
    /// Connected, envelopes flow in both directions.
    Open,
    /// Shut down for good.
    Closed,
}

/// Which transport variant a session runs on. Selected once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Synchronous in-process channel provided by the hosting runtime.
    Embedded,
    /// WebSocket connection to the host's network endpoint.
    Socket,
}

/// Events a transport delivers to its consumer, in order.
#[derive(Debug)]
pub enum TransportEvent {
    /// The session became usable. Queued (never fired synchronously from a
    /// constructor) so consumers always finish construction first.
    Opened,
    /// The session was lost. The socket channel keeps reconnecting after
    /// this; the consumer must fail its in-flight requests.
    Closed,
    /// One inbound envelope.
    Inbound(Envelope),
}

/// Receiving half of a transport's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// A connected message transport.
///
/// `send` never blocks and silently drops (with a diagnostic) when the
/// session is not open; delivery is best-effort by design. Inbound envelopes
/// arrive on the [`EventReceiver`] handed out at construction.
pub trait Transport: Send {
    /// The transport variant.
    fn kind(&self) -> TransportKind;

    /// Current session state.
    fn state(&self) -> ChannelState;

    /// Establish or re-establish delivery. No-op for the embedded channel.
    fn open(&self);

    /// Enqueue one envelope for delivery. Drops when not open.
    fn send(&self, envelope: &Envelope);

    /// Tear the session down. Terminal; cancels all transport-owned tasks
    /// and timers as a unit.
    fn close(&self);
}

/// Lock-free cell holding a [`ChannelState`], shared between a transport
/// handle and its connection task.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: ChannelState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn set(&self, state: ChannelState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> ChannelState {
        match self.0.load(Ordering::Acquire) {
            0 => ChannelState::Connecting,
            1 => ChannelState::Open,
            _ => ChannelState::Closed,
        }
    }
}
