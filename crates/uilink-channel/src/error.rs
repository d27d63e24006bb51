/// Errors surfaced by the message channel.
///
/// All failures are local to the call site; there is no centralized error
/// channel. A rejection means "retry after reopen", never a semantic error
/// from the peer.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The transport left the open state before a reply arrived.
    #[error("message channel closed")]
    Closed,

    /// The channel session has shut down for good.
    #[error("message channel shut down")]
    Shutdown,

    /// A reply arrived but its arguments did not have the expected shape.
    #[error("unexpected reply shape for {method}")]
    UnexpectedReply { method: String },

    /// An embedded session was requested without a host port.
    #[error("embedded session requires a host port")]
    MissingHostPort,

    /// A networked session was requested without a socket endpoint.
    #[error("networked session requires a socket endpoint")]
    MissingSocketEndpoint,

    /// A binary payload did not decode from base64 text.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
