//! Message channel between web-based plugin UIs and their audio plugin host.
//!
//! uilink lets a browser-hosted interface control and observe a
//! separately-running audio plugin host: typed calls out, correlated replies
//! back, unsolicited host events in, with bulk binary transfer and
//! client-to-client broadcast layered on the same envelope format.
//!
//! # Crate Structure
//!
//! - [`envelope`] — The `[namespace, method, ...args]` message codec
//! - [`transport`] — Embedded and reconnecting WebSocket transports
//! - [`channel`] — The message channel core: calls, replies, caching,
//!   liveness, bulk transfer, broadcast

/// Re-export envelope types.
pub mod envelope {
    pub use uilink_envelope::*;
}

/// Re-export transport types.
pub mod transport {
    pub use uilink_transport::*;
}

/// Re-export channel types.
pub mod channel {
    pub use uilink_channel::*;
}
