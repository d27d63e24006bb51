use bytes::Bytes;
use uilink_envelope::{Envelope, Value};

use crate::bulk;

/// Notifications delivered to the application, in arrival order.
#[derive(Debug)]
pub enum ChannelEvent {
    /// The message channel became usable.
    Open,
    /// The message channel was lost; every in-flight request has been
    /// rejected already. The socket transport keeps reconnecting.
    Closed,
    /// An unsolicited call from the host.
    Host(HostEvent),
    /// An envelope from a foreign namespace, forwarded verbatim.
    Foreign(Envelope),
}

/// Unsolicited host-to-UI calls.
///
/// The host reaches the UI with the same envelope shape it uses for replies;
/// an envelope with no registered waiter is resolved against this closed set
/// instead of invoking an arbitrary method by name. Envelopes that match no
/// variant are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The host resized the UI.
    SizeChanged { width: u32, height: u32 },
    /// A parameter moved host-side.
    ParameterChanged { index: u32, value: f64 },
    /// A program (preset) was loaded.
    ProgramLoaded { index: u32 },
    /// A state key changed host-side.
    StateChanged { key: String, value: String },
    /// Memory shared with the plugin instance is ready to use.
    SharedMemoryReady,
    /// The shared memory region was written by the plugin.
    SharedMemoryChanged { data: Bytes, hints: u32 },
}

impl HostEvent {
    /// Resolve an unsolicited call against the known host event set.
    pub(crate) fn from_call(method: &str, args: &[Value]) -> Option<Self> {
        match method {
            "sizeChanged" => Some(Self::SizeChanged {
                width: u32_arg(args, 0)?,
                height: u32_arg(args, 1)?,
            }),
            "parameterChanged" => Some(Self::ParameterChanged {
                index: u32_arg(args, 0)?,
                value: f64_arg(args, 1)?,
            }),
            "programLoaded" => Some(Self::ProgramLoaded {
                index: u32_arg(args, 0)?,
            }),
            "stateChanged" => Some(Self::StateChanged {
                key: str_arg(args, 0)?.to_string(),
                value: str_arg(args, 1)?.to_string(),
            }),
            "sharedMemoryReady" => Some(Self::SharedMemoryReady),
            "sharedMemoryChanged" => {
                let data = bulk::decode(str_arg(args, 0)?).ok()?;
                Some(Self::SharedMemoryChanged {
                    data,
                    hints: u32_arg(args, 1)?,
                })
            }
            _ => None,
        }
    }
}

fn u32_arg(args: &[Value], index: usize) -> Option<u32> {
    args.get(index)?.as_u64().and_then(|v| u32::try_from(v).ok())
}

fn f64_arg(args: &[Value], index: usize) -> Option<f64> {
    args.get(index)?.as_f64()
}

fn str_arg(args: &[Value], index: usize) -> Option<&str> {
    args.get(index)?.as_str()
}
