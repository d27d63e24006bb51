use std::fmt;

use uilink_channel::ChannelError;

// Exit codes follow sysexits-adjacent conventions shared across our tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const CHANNEL_ERROR: i32 = 3;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    let code = match err {
        ChannelError::Closed | ChannelError::Shutdown => FAILURE,
        ChannelError::UnexpectedReply { .. } | ChannelError::Base64(_) => CHANNEL_ERROR,
        ChannelError::MissingHostPort | ChannelError::MissingSocketEndpoint => USAGE,
    };
    CliError::new(code, format!("{context}: {err}"))
}
