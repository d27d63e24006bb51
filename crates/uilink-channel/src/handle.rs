use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use uilink_envelope::Value;

use crate::bulk;
use crate::core::Command;
use crate::error::{ChannelError, Result};
use crate::liveness::LatencySample;

/// Cloneable handle to a running message channel session.
///
/// Method calls are delivered to the host in issuance order. Reply-expecting
/// calls return futures that resolve with the reply arguments, or fail with
/// [`ChannelError::Closed`] if the transport drops first. There is no
/// timeout: a call with no reply waits until the channel closes.
#[derive(Clone, Debug)]
pub struct UiChannel {
    commands: mpsc::UnboundedSender<Command>,
    latency: LatencySample,
}

impl UiChannel {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>, latency: LatencySample) -> Self {
        Self { commands, latency }
    }

    /// Fire-and-forget call in the session namespace.
    pub fn call(&self, method: impl Into<String>, args: Vec<Value>) -> Result<()> {
        self.commands
            .send(Command::Call {
                method: method.into(),
                args,
            })
            .map_err(|_| ChannelError::Shutdown)
    }

    /// Reply-expecting call.
    ///
    /// With `cacheable` set, a previously received reply for `method`
    /// resolves the future without a transport send. Use it only for reads
    /// whose host-side value is invariant for the session.
    pub async fn call_and_expect_reply(
        &self,
        method: impl Into<String>,
        cacheable: bool,
        args: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(Command::CallExpectReply {
                method: method.into(),
                cacheable,
                args,
                reply,
            })
            .map_err(|_| ChannelError::Shutdown)?;
        receiver.await.map_err(|_| ChannelError::Shutdown)?
    }

    /// Send one ping now. Latency is updated when the pong arrives.
    pub fn ping(&self) -> Result<()> {
        self.commands
            .send(Command::Ping)
            .map_err(|_| ChannelError::Shutdown)
    }

    /// Last measured ping round-trip time. Zero until the first pong.
    pub fn latency(&self) -> Duration {
        self.latency.as_duration()
    }

    /// Tear the session down. Every pending future rejects.
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }

    // --- typed call surface -------------------------------------------------

    /// Current UI width in native pixels.
    pub async fn get_width(&self) -> Result<u32> {
        self.reply_u32("getWidth", false).await
    }

    /// Current UI height in native pixels.
    pub async fn get_height(&self) -> Result<u32> {
        self.reply_u32("getHeight", false).await
    }

    /// Request a UI width change.
    pub fn set_width(&self, width: u32) -> Result<()> {
        self.call("setWidth", vec![json!(width)])
    }

    /// Request a UI height change.
    pub fn set_height(&self, height: u32) -> Result<()> {
        self.call("setHeight", vec![json!(height)])
    }

    /// Request a UI size change.
    pub fn set_size(&self, width: u32, height: u32) -> Result<()> {
        self.call("setSize", vec![json!(width), json!(height)])
    }

    /// Whether the host window is resizable. Invariant for the session.
    pub async fn is_resizable(&self) -> Result<bool> {
        self.reply_bool("isResizable", true).await
    }

    /// Whether the plugin runs as a standalone application.
    pub async fn is_standalone(&self) -> Result<bool> {
        self.reply_bool("isStandalone", true).await
    }

    /// UI width in CSS pixels at initialization time.
    pub async fn get_init_width_css(&self) -> Result<u32> {
        self.reply_u32("getInitWidthCSS", true).await
    }

    /// UI height in CSS pixels at initialization time.
    pub async fn get_init_height_css(&self) -> Result<u32> {
        self.reply_u32("getInitHeightCSS", true).await
    }

    /// Send a MIDI note.
    pub fn send_note(&self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.call("sendNote", vec![json!(channel), json!(note), json!(velocity)])
    }

    /// Begin or end a parameter edit gesture.
    pub fn edit_parameter(&self, index: u32, started: bool) -> Result<()> {
        self.call("editParameter", vec![json!(index), json!(started)])
    }

    /// Push a parameter value to the host.
    pub fn set_parameter_value(&self, index: u32, value: f64) -> Result<()> {
        self.call("setParameterValue", vec![json!(index), json!(value)])
    }

    /// Store a state key/value pair host-side.
    pub fn set_state(&self, key: &str, value: &str) -> Result<()> {
        self.call("setState", vec![json!(key), json!(value)])
    }

    /// Grab or release keyboard focus in the embedded view.
    pub fn set_keyboard_focus(&self, focus: bool) -> Result<()> {
        self.call("setKeyboardFocus", vec![json!(focus)])
    }

    /// Tell the host the UI finished setting up, flushing its init buffer.
    pub fn ready(&self) -> Result<()> {
        self.call("ready", Vec::new())
    }

    /// Public URL the plugin UI is served at. Invariant for the session.
    pub async fn get_public_url(&self) -> Result<String> {
        self.reply_string("getPublicUrl", true).await
    }

    /// Whether the plugin is currently published over zeroconf.
    pub async fn is_zeroconf_published(&self) -> Result<bool> {
        self.reply_bool("isZeroconfPublished", false).await
    }

    /// Toggle zeroconf publishing.
    pub fn set_zeroconf_published(&self, published: bool) -> Result<()> {
        self.call("setZeroconfPublished", vec![json!(published)])
    }

    /// Zeroconf instance id, read-only.
    pub async fn get_zeroconf_id(&self) -> Result<String> {
        self.reply_string("getZeroconfId", false).await
    }

    /// Zeroconf service name.
    pub async fn get_zeroconf_name(&self) -> Result<String> {
        self.reply_string("getZeroconfName", false).await
    }

    /// Update the zeroconf service name.
    pub fn set_zeroconf_name(&self, name: &str) -> Result<()> {
        self.call("setZeroconfName", vec![json!(name)])
    }

    /// Tag a message for host-side fan-out to every other connected client.
    ///
    /// Delivery guarantees across clients are the broker's contract, not
    /// this channel's.
    pub fn broadcast(&self, args: Vec<Value>) -> Result<()> {
        self.call("broadcast", args)
    }

    /// Write binary state into memory the host has mapped for the plugin
    /// instance. The full payload ships base64-encoded in a single call.
    pub fn write_shared_memory(&self, data: &[u8], offset: u64, hints: u32) -> Result<()> {
        self.call(
            "writeSharedMemory",
            vec![json!(bulk::encode(data)), json!(offset), json!(hints)],
        )
    }

    /// Hot-swap the embedded virtual machine's binary image.
    ///
    /// Same wire method as [`write_shared_memory`](Self::write_shared_memory)
    /// but a distinct operation: the argument shape is `(metadata, payload)`
    /// and the receiving direction differs.
    pub fn sideload_binary(&self, metadata: &str, data: &[u8]) -> Result<()> {
        self.call(
            "writeSharedMemory",
            vec![json!(metadata), json!(bulk::encode(data))],
        )
    }

    // --- reply coercion -----------------------------------------------------

    async fn reply_u32(&self, method: &str, cacheable: bool) -> Result<u32> {
        let args = self.call_and_expect_reply(method, cacheable, Vec::new()).await?;
        args.first()
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ChannelError::UnexpectedReply {
                method: method.to_string(),
            })
    }

    async fn reply_bool(&self, method: &str, cacheable: bool) -> Result<bool> {
        let args = self.call_and_expect_reply(method, cacheable, Vec::new()).await?;
        args.first()
            .and_then(Value::as_bool)
            .ok_or_else(|| ChannelError::UnexpectedReply {
                method: method.to_string(),
            })
    }

    async fn reply_string(&self, method: &str, cacheable: bool) -> Result<String> {
        let args = self.call_and_expect_reply(method, cacheable, Vec::new()).await?;
        args.first()
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChannelError::UnexpectedReply {
                method: method.to_string(),
            })
    }
}
