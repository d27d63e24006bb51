/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// WebSocket-level failure (connect, read or write).
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An inbound frame did not decode as an envelope.
    ///
    /// Treated the same as a disconnect: the connection is dropped and the
    /// reconnect policy takes over.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] uilink_envelope::EnvelopeError),

    /// The peer closed the connection.
    #[error("peer closed the connection")]
    PeerClosed,

    /// The transport has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
