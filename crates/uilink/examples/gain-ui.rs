//! Minimal headless UI client — connects to a plugin host over WebSocket,
//! reads the host geometry, then mirrors host events to stdout.
//!
//! Run with:
//!   cargo run -p uilink --example gain-ui -- ws://127.0.0.1:9090

use uilink::channel::{ChannelEvent, Environment, SessionBuilder, SocketConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:9090".to_string());

    let mut session = SessionBuilder::new()
        .with_socket(SocketConfig::new(&url))
        .connect(Environment::networked())?;

    eprintln!("Connecting to {url}");

    while let Some(event) = session.events.recv().await {
        match event {
            ChannelEvent::Open => {
                eprintln!("Channel open");
                let width = session.channel.get_width().await?;
                let height = session.channel.get_height().await?;
                let resizable = session.channel.is_resizable().await?;
                eprintln!("Host geometry: {width}x{height}, resizable: {resizable}");
            }
            ChannelEvent::Closed => eprintln!("Channel closed, reconnecting..."),
            ChannelEvent::Host(host) => eprintln!("Host event: {host:?}"),
            ChannelEvent::Foreign(envelope) => {
                eprintln!("Foreign message in namespace {}", envelope.namespace)
            }
        }
    }

    Ok(())
}
