//! Request/reply message channel between a web UI and an audio plugin host.
//!
//! This is the "just works" layer. A session owns one transport for its whole
//! lifetime, selected once from the [`Environment`] capability record:
//! - embedded: the synchronous in-process channel of the hosting view
//! - networked: a reconnecting WebSocket to the host
//! - standalone: a development stub that drops outbound traffic
//!
//! Calls go out as `["UI", method, ...args]` envelopes. Reply-expecting calls
//! are correlated by method name: the next reply for a method resolves every
//! waiter registered for it, and the same envelope shape doubles as an
//! unsolicited host event when no waiter exists. A per-method reply cache
//! lets reads of session-invariant values short-circuit without a round
//! trip.

pub mod bulk;
mod core;
pub mod env;
pub mod error;
pub mod event;
pub mod handle;
pub mod liveness;

pub use env::{ChannelConfig, Environment, Session, SessionBuilder};
pub use error::{ChannelError, Result};
pub use event::{ChannelEvent, HostEvent};
pub use handle::UiChannel;
pub use liveness::{LatencySample, DEFAULT_PING_PERIOD};

pub use uilink_envelope::{Envelope, Value, UI_NAMESPACE};
pub use uilink_transport::{HostPort, InboundInjector, SocketConfig};
