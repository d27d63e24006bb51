use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use uilink_envelope::{Envelope, Value};
use uilink_transport::{EventReceiver, Transport, TransportEvent, TransportKind};

use crate::error::ChannelError;
use crate::event::{ChannelEvent, HostEvent};
use crate::liveness::LivenessMonitor;

/// Method name the host replies to a ping with.
const PONG_METHOD: &str = "pong";

pub(crate) type ReplyResult = std::result::Result<Vec<Value>, ChannelError>;

/// Requests from channel handles (and the liveness timer) to the core task.
pub(crate) enum Command {
    /// Fire-and-forget call.
    Call { method: String, args: Vec<Value> },
    /// Reply-expecting call; the waiter joins the pending set unless the
    /// reply cache short-circuits it.
    CallExpectReply {
        method: String,
        cacheable: bool,
        args: Vec<Value>,
        reply: oneshot::Sender<ReplyResult>,
    },
    /// Send one ping, stamping the send time for latency measurement.
    Ping,
    /// Tear the session down.
    Close,
}

/// The message channel core.
///
/// Runs as a single task that exclusively owns the pending-call registry and
/// the reply cache; handles talk to it over a command queue, the transport
/// over its event stream. No other code touches either map, so maintaining
/// the invariants is purely a matter of callback ordering within this task.
pub(crate) struct ChannelCore {
    namespace: String,
    transport: Box<dyn Transport>,
    transport_events: EventReceiver,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Ticks from the liveness timer, serialized with everything else.
    ping_ticks: mpsc::UnboundedReceiver<()>,
    app_events: mpsc::UnboundedSender<ChannelEvent>,
    /// Outstanding waiters per method, in registration order.
    pending: HashMap<String, Vec<oneshot::Sender<ReplyResult>>>,
    /// Most recent reply arguments per method.
    cache: HashMap<String, Vec<Value>>,
    liveness: LivenessMonitor,
}

impl ChannelCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        namespace: String,
        transport: Box<dyn Transport>,
        transport_events: EventReceiver,
        commands: mpsc::UnboundedReceiver<Command>,
        ping_ticks: mpsc::UnboundedReceiver<()>,
        app_events: mpsc::UnboundedSender<ChannelEvent>,
        liveness: LivenessMonitor,
    ) -> Self {
        Self {
            namespace,
            transport,
            transport_events,
            commands,
            ping_ticks,
            app_events,
            pending: HashMap::new(),
            cache: HashMap::new(),
            liveness,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                // State changes first: a close must be observed before any
                // command issued after it can touch the pending set.
                biased;
                event = self.transport_events.recv() => match event {
                    Some(event) => self.handle_transport_event(event),
                    None => {
                        self.reject_all_pending();
                        break;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    // Every handle is gone; nobody can observe this session
                    // anymore.
                    None => break,
                },
                tick = self.ping_ticks.recv() => {
                    if tick.is_some() {
                        self.send_ping();
                    }
                }
            }
        }
        self.liveness.stop();
    }

    /// Returns false when the session should end.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Call { method, args } => {
                self.transport
                    .send(&Envelope::new(self.namespace.clone(), method, args));
            }
            Command::CallExpectReply {
                method,
                cacheable,
                args,
                reply,
            } => {
                if cacheable {
                    if let Some(cached) = self.cache.get(&method) {
                        // Pure read against last-known state; no send.
                        let _ = reply.send(Ok(cached.clone()));
                        return true;
                    }
                }
                self.pending.entry(method.clone()).or_default().push(reply);
                self.transport
                    .send(&Envelope::new(self.namespace.clone(), method, args));
            }
            Command::Ping => self.send_ping(),
            Command::Close => {
                self.transport.close();
                self.reject_all_pending();
                let _ = self.app_events.send(ChannelEvent::Closed);
                return false;
            }
        }
        true
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                if self.transport.kind() == TransportKind::Socket {
                    self.liveness.start();
                }
                let _ = self.app_events.send(ChannelEvent::Open);
            }
            TransportEvent::Closed => {
                self.reject_all_pending();
                self.liveness.stop();
                let _ = self.app_events.send(ChannelEvent::Closed);
            }
            TransportEvent::Inbound(envelope) => self.dispatch(envelope),
        }
    }

    fn dispatch(&mut self, envelope: Envelope) {
        if !envelope.is_namespace(&self.namespace) {
            let _ = self.app_events.send(ChannelEvent::Foreign(envelope));
            return;
        }

        let Envelope { method, args, .. } = envelope;

        // Cached whether or not anyone is waiting; cacheable reads later
        // short-circuit to this value.
        self.cache.insert(method.clone(), args.clone());

        if let Some(waiters) = self.pending.get_mut(&method) {
            if !waiters.is_empty() {
                // One reply resolves every waiter for the method.
                for waiter in waiters.drain(..) {
                    let _ = waiter.send(Ok(args.clone()));
                }
                return;
            }
        }

        if method == PONG_METHOD {
            self.liveness.pong();
            return;
        }

        match HostEvent::from_call(&method, &args) {
            Some(event) => {
                let _ = self.app_events.send(ChannelEvent::Host(event));
            }
            None => {
                tracing::trace!(%method, "no local handler for inbound method, dropping");
            }
        }
    }

    fn send_ping(&mut self) {
        self.liveness.note_ping_sent();
        self.transport
            .send(&Envelope::new(self.namespace.clone(), "ping", Vec::new()));
    }

    fn reject_all_pending(&mut self) {
        for (_, waiters) in self.pending.drain() {
            for waiter in waiters {
                let _ = waiter.send(Err(ChannelError::Closed));
            }
        }
    }
}
