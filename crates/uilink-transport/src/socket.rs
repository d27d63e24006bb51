use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uilink_envelope::Envelope;

use crate::error::TransportError;
use crate::event::{ChannelState, EventReceiver, StateCell, Transport, TransportEvent, TransportKind};

/// Default period between reconnect attempts.
pub const DEFAULT_RECONNECT_PERIOD: Duration = Duration::from_secs(3);

/// Configuration for the socket channel.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:9090`.
    pub url: String,
    /// Fixed period between reconnect attempts. No backoff growth; the peer
    /// is a locally-run host process assumed to eventually become reachable.
    pub reconnect_period: Duration,
}

impl SocketConfig {
    /// Configuration with default timings for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_period: DEFAULT_RECONNECT_PERIOD,
        }
    }

    /// Override the reconnect period.
    pub fn with_reconnect_period(mut self, period: Duration) -> Self {
        self.reconnect_period = period;
        self
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport over a duplex WebSocket connection.
///
/// One text frame carries one JSON-encoded envelope. The connection task and
/// its retry timer are owned by this handle and cancelled as a unit on
/// [`Transport::close`] or drop.
pub struct SocketChannel {
    outbound: mpsc::UnboundedSender<Envelope>,
    state: Arc<StateCell>,
    cancel: CancellationToken,
    run: Mutex<Option<RunArgs>>,
}

struct RunArgs {
    config: SocketConfig,
    outbound_rx: mpsc::UnboundedReceiver<Envelope>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl SocketChannel {
    /// Create a socket channel for the given endpoint.
    ///
    /// No connection is attempted until [`Transport::open`] is called.
    pub fn new(config: SocketConfig) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let channel = Self {
            outbound,
            state: Arc::new(StateCell::new(ChannelState::Connecting)),
            cancel: CancellationToken::new(),
            run: Mutex::new(Some(RunArgs {
                config,
                outbound_rx,
                events,
            })),
        };
        (channel, receiver)
    }
}

impl Transport for SocketChannel {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    fn state(&self) -> ChannelState {
        self.state.get()
    }

    /// Start the connect/reconnect loop. Subsequent calls are no-ops; the
    /// loop already re-establishes delivery by itself.
    fn open(&self) {
        let mut slot = match self.run.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(args) = slot.take() {
            tokio::spawn(run(args, self.state.clone(), self.cancel.clone()));
        }
    }

    fn send(&self, envelope: &Envelope) {
        if self.state.get() != ChannelState::Open {
            tracing::warn!(
                method = %envelope.method,
                state = ?self.state.get(),
                "socket channel not open, dropping message"
            );
            return;
        }
        let _ = self.outbound.send(envelope.clone());
    }

    fn close(&self) {
        self.cancel.cancel();
        self.state.set(ChannelState::Closed);
    }
}

impl Drop for SocketChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum SessionEnd {
    Cancelled,
    Lost(TransportError),
}

async fn run(args: RunArgs, state: Arc<StateCell>, cancel: CancellationToken) {
    let RunArgs {
        config,
        mut outbound_rx,
        events,
    } = args;

    loop {
        state.set(ChannelState::Connecting);

        let ws = tokio::select! {
            _ = cancel.cancelled() => break,
            attempt = connect_async(config.url.as_str()) => match attempt {
                Ok((ws, _response)) => ws,
                Err(err) => {
                    tracing::debug!(url = %config.url, %err, "connect attempt failed");
                    if retry_delay(&cancel, config.reconnect_period).await {
                        break;
                    }
                    continue;
                }
            },
        };

        // Anything queued while the previous session was dying is stale;
        // senders were told delivery is best-effort.
        let mut stale = 0usize;
        while outbound_rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::warn!(count = stale, "discarded outbound messages queued across reconnect");
        }

        state.set(ChannelState::Open);
        tracing::info!(url = %config.url, "socket channel connected");
        if events.send(TransportEvent::Opened).is_err() {
            break;
        }

        match session(ws, &mut outbound_rx, &events, &cancel).await {
            SessionEnd::Cancelled => {
                let _ = events.send(TransportEvent::Closed);
                break;
            }
            SessionEnd::Lost(err) => {
                tracing::info!(
                    %err,
                    period = ?config.reconnect_period,
                    "socket channel lost, reconnecting"
                );
                if events.send(TransportEvent::Closed).is_err() {
                    break;
                }
                if retry_delay(&cancel, config.reconnect_period).await {
                    break;
                }
            }
        }
    }

    state.set(ChannelState::Closed);
}

/// Wait one fixed retry period. Returns true when cancelled.
async fn retry_delay(cancel: &CancellationToken, period: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(period) => false,
    }
}

async fn session(
    ws: WsStream,
    outbound_rx: &mut mpsc::UnboundedReceiver<Envelope>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            outbound = outbound_rx.recv() => match outbound {
                Some(envelope) => {
                    if let Err(err) = sink.send(Message::text(envelope.to_json())).await {
                        return SessionEnd::Lost(err.into());
                    }
                }
                None => return SessionEnd::Cancelled,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::from_json(&text) {
                    Ok(envelope) => {
                        if events.send(TransportEvent::Inbound(envelope)).is_err() {
                            return SessionEnd::Cancelled;
                        }
                    }
                    // Parsing failures are not recovered locally; tear the
                    // connection down and let the reconnect policy run.
                    Err(err) => return SessionEnd::Lost(err.into()),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Lost(TransportError::PeerClosed)
                }
                Some(Ok(_)) => {
                    tracing::trace!("ignoring non-text websocket frame");
                }
                Some(Err(err)) => return SessionEnd::Lost(err.into()),
            },
        }
    }
}
