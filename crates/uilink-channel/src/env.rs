use std::time::Duration;

use tokio::sync::mpsc;
use uilink_envelope::UI_NAMESPACE;
use uilink_transport::{
    EmbeddedChannel, HostPort, InboundInjector, NullPort, SocketChannel, SocketConfig, Transport,
};

use crate::core::ChannelCore;
use crate::error::{ChannelError, Result};
use crate::event::ChannelEvent;
use crate::handle::UiChannel;
use crate::liveness::{LivenessMonitor, DEFAULT_PING_PERIOD};

/// Runtime environment capability record.
///
/// Resolved once by the embedding layer before construction and never
/// recomputed; exactly one transport is selected from it and no flag is
/// consulted anywhere deeper in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// Running inside the native host's embedded view.
    pub embedded: bool,
    /// Reachable over HTTP/WebSocket.
    pub networked: bool,
    /// Neither of the above; development session with no host attached.
    pub standalone: bool,
}

impl Environment {
    /// Embedded view with a native in-process channel.
    pub fn embedded() -> Self {
        Self {
            embedded: true,
            networked: false,
            standalone: false,
        }
    }

    /// Network client of a remotely served UI.
    pub fn networked() -> Self {
        Self {
            embedded: false,
            networked: true,
            standalone: false,
        }
    }

    /// Development session; outbound messages are dropped with a diagnostic.
    pub fn standalone() -> Self {
        Self {
            embedded: false,
            networked: false,
            standalone: true,
        }
    }
}

/// Channel-level configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Namespace for this session's calls and replies.
    pub namespace: String,
    /// Period between liveness pings while the socket channel is open.
    pub ping_period: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            namespace: UI_NAMESPACE.to_string(),
            ping_period: DEFAULT_PING_PERIOD,
        }
    }
}

/// A connected message channel session.
#[derive(Debug)]
pub struct Session {
    /// Handle for issuing calls.
    pub channel: UiChannel,
    /// Application-facing notifications, in arrival order.
    pub events: mpsc::UnboundedReceiver<ChannelEvent>,
    /// For embedded transports: the handle the hosting glue feeds inbound
    /// message-listener callbacks through. `None` on socket sessions.
    pub injector: Option<InboundInjector>,
}

/// Builds and connects a session, selecting the transport from the
/// environment capability record.
pub struct SessionBuilder {
    config: ChannelConfig,
    socket: Option<SocketConfig>,
    host_port: Option<Box<dyn HostPort>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: ChannelConfig::default(),
            socket: None,
            host_port: None,
        }
    }

    /// Override channel configuration.
    pub fn with_config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// Endpoint to use when the environment is networked.
    pub fn with_socket(mut self, socket: SocketConfig) -> Self {
        self.socket = Some(socket);
        self
    }

    /// Host port to use when the environment is embedded.
    pub fn with_host_port(mut self, port: Box<dyn HostPort>) -> Self {
        self.host_port = Some(port);
        self
    }

    /// Select a transport from the capability record, spawn the channel core
    /// and open the transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(self, env: Environment) -> Result<Session> {
        let Self {
            config,
            socket,
            host_port,
        } = self;

        let (transport, transport_events, injector) = if env.networked {
            let socket = socket.ok_or(ChannelError::MissingSocketEndpoint)?;
            let (channel, events) = SocketChannel::new(socket);
            (Box::new(channel) as Box<dyn Transport>, events, None)
        } else if env.embedded {
            let port = host_port.ok_or(ChannelError::MissingHostPort)?;
            let (channel, injector, events) = EmbeddedChannel::new(port);
            (
                Box::new(channel) as Box<dyn Transport>,
                events,
                Some(injector),
            )
        } else {
            let (channel, injector, events) = EmbeddedChannel::new(Box::new(NullPort));
            (
                Box::new(channel) as Box<dyn Transport>,
                events,
                Some(injector),
            )
        };

        transport.open();
        let embedded_host = env.embedded && !env.networked;

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (app_events, events) = mpsc::unbounded_channel();
        let (liveness, ping_ticks) = LivenessMonitor::new(config.ping_period);
        let latency = liveness.sample();

        let core = ChannelCore::new(
            config.namespace,
            transport,
            transport_events,
            command_rx,
            ping_ticks,
            app_events,
            liveness,
        );
        tokio::spawn(core.run());

        let channel = UiChannel::new(commands, latency);

        if embedded_host {
            // Flush the host's initialization message buffer; everything the
            // host queued while the view was loading is delivered after this.
            channel.ready()?;
        }

        Ok(Session {
            channel,
            events,
            injector,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
