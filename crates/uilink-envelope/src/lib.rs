//! Ordered-array message envelope codec for UI/host message channels.
//!
//! Every message exchanged between a plugin UI and its host is one envelope:
//! a JSON array of the form `[namespace, method, ...args]`.
//! - The namespace distinguishes logical channels sharing one transport
//!   (`"UI"` for this channel's own traffic, anything else is foreign).
//! - The method names the call or reply.
//! - Arguments are JSON scalars and strings; binary data travels as base64
//!   text, never as raw bytes.

pub mod envelope;
pub mod error;

pub use envelope::{Envelope, UI_NAMESPACE};
pub use error::{EnvelopeError, Result};

pub use serde_json::Value;
