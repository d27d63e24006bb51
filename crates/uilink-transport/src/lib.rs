//! Embedded and reconnecting WebSocket transports for UI/host message channels.
//!
//! A transport delivers whole envelopes in order and reports session state
//! changes on a single event stream. Two variants exist:
//! - [`EmbeddedChannel`]: wraps the synchronous post/listen primitive a
//!   hosting runtime injects into an embedded web view. Always open.
//! - [`SocketChannel`]: wraps a WebSocket connection. Reconnects forever on a
//!   fixed timer when the peer drops.

pub mod embedded;
pub mod error;
pub mod event;
pub mod socket;

pub use embedded::{EmbeddedChannel, HostPort, InboundInjector, NullPort};
pub use error::{Result, TransportError};
pub use event::{ChannelState, EventReceiver, Transport, TransportEvent, TransportKind};
pub use socket::{SocketChannel, SocketConfig};
