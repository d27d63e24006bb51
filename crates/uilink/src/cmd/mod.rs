use std::time::Duration;

use clap::{Args, Subcommand};
use tokio::time::timeout;
use uilink_channel::{
    ChannelEvent, Environment, Session, SessionBuilder, SocketConfig, Value,
};

use crate::exit::{channel_error, CliError, CliResult, FAILURE, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod call;
pub mod ping;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a method call to a host, optionally awaiting the reply.
    Call(CallArgs),
    /// Connect and print incoming channel events.
    Watch(WatchArgs),
    /// Measure round-trip latency to a host.
    Ping(PingArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, format).await,
        Command::Watch(args) => watch::run(args, format).await,
        Command::Ping(args) => ping::run(args, format).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// WebSocket endpoint of the host, e.g. ws://127.0.0.1:9090.
    pub url: String,
    /// Method name, e.g. getWidth.
    pub method: String,
    /// Positional arguments; each is parsed as JSON, falling back to a
    /// plain string.
    pub args: Vec<String>,
    /// Wait for the method's reply and print it.
    #[arg(long)]
    pub expect_reply: bool,
    /// Allow the reply to be served from the session's reply cache.
    #[arg(long, requires = "expect_reply")]
    pub cacheable: bool,
    /// Maximum time to wait for connect and reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// WebSocket endpoint of the host.
    pub url: String,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Maximum time to wait for the initial connection (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct PingArgs {
    /// WebSocket endpoint of the host.
    pub url: String,
    /// Number of pings to send.
    #[arg(long, short = 'c', default_value = "3")]
    pub count: usize,
    /// Period between pings (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub period: String,
    /// Maximum time to wait for the initial connection (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Connect a networked session and wait for the channel to open.
pub async fn connect(url: &str, wait: Duration) -> CliResult<Session> {
    let mut session = SessionBuilder::new()
        .with_socket(SocketConfig::new(url))
        .connect(Environment::networked())
        .map_err(|err| channel_error("connect failed", err))?;

    loop {
        let event = timeout(wait, session.events.recv())
            .await
            .map_err(|_| CliError::new(TIMEOUT, format!("timed out connecting to {url}")))?
            .ok_or_else(|| CliError::new(FAILURE, "channel shut down while connecting"))?;
        if matches!(event, ChannelEvent::Open) {
            return Ok(session);
        }
    }
}

/// Parse CLI argument strings into envelope values.
pub fn parse_values(args: &[String]) -> Vec<Value> {
    args.iter()
        .map(|arg| {
            serde_json::from_str::<Value>(arg).unwrap_or_else(|_| Value::String(arg.clone()))
        })
        .collect()
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
