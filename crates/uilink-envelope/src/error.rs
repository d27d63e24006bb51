/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The frame text did not parse as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded JSON value is not an array.
    #[error("envelope is not an array")]
    NotAnArray,

    /// The array is empty or its first element is not a string.
    #[error("envelope has no namespace string")]
    MissingNamespace,

    /// The array has no second element or it is not a string.
    #[error("envelope has no method string")]
    MissingMethod,
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
