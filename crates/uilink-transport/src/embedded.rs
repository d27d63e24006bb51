use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use uilink_envelope::{Envelope, Value};

use crate::error::{Result, TransportError};
use crate::event::{ChannelState, EventReceiver, Transport, TransportEvent, TransportKind};

/// Outbound half of the messaging primitive a hosting runtime provides to an
/// embedded view: "send an array of values", synchronous, always available
/// once injected.
pub trait HostPort: Send {
    /// Deliver one ordered value array to the host. Must not block.
    fn post_message(&self, values: Vec<Value>);
}

/// Host port that drops everything with a diagnostic.
///
/// Used for standalone/development sessions where no host is attached but the
/// channel must still report open.
#[derive(Debug, Default)]
pub struct NullPort;

impl HostPort for NullPort {
    fn post_message(&self, values: Vec<Value>) {
        tracing::debug!(?values, "standalone stub dropped outbound message");
    }
}

/// Inbound half of the host primitive: the hosting glue pushes every message
/// listener callback through this handle.
#[derive(Clone, Debug)]
pub struct InboundInjector {
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl InboundInjector {
    /// Deliver one inbound value array.
    ///
    /// Arrays that do not decode as envelopes are rejected; in-process
    /// delivery has no reconnect to fall back on, so the caller keeps the
    /// session and drops the one message.
    pub fn deliver(&self, values: Vec<Value>) -> Result<()> {
        let envelope = Envelope::from_values(values)?;
        self.events
            .send(TransportEvent::Inbound(envelope))
            .map_err(|_| TransportError::Shutdown)
    }
}

/// Transport over the host-provided in-process messaging primitive.
///
/// Always open: delivery is synchronous and in-process. The `Opened` event is
/// queued at construction instead of fired synchronously, so a consumer that
/// is still constructing is never re-entered.
pub struct EmbeddedChannel {
    port: Box<dyn HostPort>,
    events: mpsc::UnboundedSender<TransportEvent>,
    closed: Arc<AtomicBool>,
}

impl EmbeddedChannel {
    /// Wrap a host port. Returns the channel, the injector the hosting glue
    /// feeds inbound messages through, and the event stream for the consumer.
    pub fn new(port: Box<dyn HostPort>) -> (Self, InboundInjector, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();

        // Deferred open notification: first in the queue, observed only
        // after the consumer starts reading events.
        let _ = events.send(TransportEvent::Opened);

        let injector = InboundInjector {
            events: events.clone(),
        };
        let channel = Self {
            port,
            events,
            closed: Arc::new(AtomicBool::new(false)),
        };
        (channel, injector, receiver)
    }
}

impl Transport for EmbeddedChannel {
    fn kind(&self) -> TransportKind {
        TransportKind::Embedded
    }

    fn state(&self) -> ChannelState {
        if self.closed.load(Ordering::Acquire) {
            ChannelState::Closed
        } else {
            ChannelState::Open
        }
    }

    fn open(&self) {
        // Already open from construction.
    }

    fn send(&self, envelope: &Envelope) {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(method = %envelope.method, "embedded channel closed, dropping message");
            return;
        }
        self.port.post_message(envelope.to_values());
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let _ = self.events.send(TransportEvent::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct RecordingPort {
        posted: Arc<Mutex<Vec<Vec<Value>>>>,
    }

    impl HostPort for RecordingPort {
        fn post_message(&self, values: Vec<Value>) {
            self.posted
                .lock()
                .expect("postings lock should not be poisoned")
                .push(values);
        }
    }

    #[tokio::test]
    async fn opened_event_is_deferred_to_the_event_queue() {
        let (_channel, _injector, mut events) = EmbeddedChannel::new(Box::new(NullPort));
        let first = events.recv().await.expect("event stream should be live");
        assert!(matches!(first, TransportEvent::Opened));
    }

    #[tokio::test]
    async fn send_forwards_value_arrays_to_the_port() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let port = RecordingPort {
            posted: posted.clone(),
        };
        let (channel, _injector, _events) = EmbeddedChannel::new(Box::new(port));

        channel.send(&Envelope::ui("setWidth", vec![json!(640)]));
        channel.send(&Envelope::ui("setHeight", vec![json!(480)]));

        let posted = posted.lock().expect("postings lock should not be poisoned");
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0], vec![json!("UI"), json!("setWidth"), json!(640)]);
        assert_eq!(posted[1], vec![json!("UI"), json!("setHeight"), json!(480)]);
    }

    #[tokio::test]
    async fn injected_messages_arrive_in_order() {
        let (_channel, injector, mut events) = EmbeddedChannel::new(Box::new(NullPort));

        injector
            .deliver(vec![json!("UI"), json!("getWidth"), json!(640)])
            .expect("first delivery should succeed");
        injector
            .deliver(vec![json!("UI"), json!("getHeight"), json!(480)])
            .expect("second delivery should succeed");

        assert!(matches!(events.recv().await, Some(TransportEvent::Opened)));
        match events.recv().await {
            Some(TransportEvent::Inbound(envelope)) => assert_eq!(envelope.method, "getWidth"),
            other => panic!("expected inbound envelope, got {other:?}"),
        }
        match events.recv().await {
            Some(TransportEvent::Inbound(envelope)) => assert_eq!(envelope.method, "getHeight"),
            other => panic!("expected inbound envelope, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_injection_is_rejected_without_killing_the_session() {
        let (channel, injector, _events) = EmbeddedChannel::new(Box::new(NullPort));

        let err = injector
            .deliver(vec![json!(42)])
            .expect_err("bare number should not decode");
        assert!(matches!(err, TransportError::MalformedFrame(_)));
        assert_eq!(channel.state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn close_emits_closed_once() {
        let (channel, _injector, mut events) = EmbeddedChannel::new(Box::new(NullPort));
        channel.close();
        channel.close();

        assert!(matches!(events.recv().await, Some(TransportEvent::Opened)));
        assert!(matches!(events.recv().await, Some(TransportEvent::Closed)));
        assert_eq!(channel.state(), ChannelState::Closed);
    }
}
