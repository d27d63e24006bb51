//! Bulk binary transfer primitive.
//!
//! Binary payloads are never sent as raw bytes: the full buffer is
//! base64-encoded and shipped inside a normal call as one argument, with no
//! chunking. The transport's maximum frame size is the caller's constraint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::error::Result;

/// Encode a binary buffer as base64 text for transport.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode base64 text received from a peer.
///
/// Peers may line-wrap the text (the embedded view's encoder wraps at 76
/// columns), so ASCII whitespace is stripped before decoding.
pub fn decode(text: &str) -> Result<Bytes> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(Bytes::from(STANDARD.decode(compact)?))
}
