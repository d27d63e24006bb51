use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;
use uilink_channel::{bulk, ChannelEvent, HostEvent, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    method: &'a str,
    args: &'a [Value],
}

pub fn print_reply(method: &str, args: &[Value], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput { method, args };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => {
            let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
            println!("{method} -> {}", rendered.join(" "));
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventOutput<'a> {
    Open,
    Closed,
    SizeChanged {
        width: u32,
        height: u32,
    },
    ParameterChanged {
        index: u32,
        value: f64,
    },
    ProgramLoaded {
        index: u32,
    },
    StateChanged {
        key: &'a str,
        value: &'a str,
    },
    SharedMemoryReady,
    SharedMemoryChanged {
        size: usize,
        hints: u32,
        payload: String,
    },
    Foreign {
        namespace: &'a str,
        method: &'a str,
        args: &'a [Value],
    },
}

pub fn print_event(event: &ChannelEvent, format: OutputFormat) {
    let out = match event {
        ChannelEvent::Open => EventOutput::Open,
        ChannelEvent::Closed => EventOutput::Closed,
        ChannelEvent::Host(host) => match host {
            HostEvent::SizeChanged { width, height } => EventOutput::SizeChanged {
                width: *width,
                height: *height,
            },
            HostEvent::ParameterChanged { index, value } => EventOutput::ParameterChanged {
                index: *index,
                value: *value,
            },
            HostEvent::ProgramLoaded { index } => EventOutput::ProgramLoaded { index: *index },
            HostEvent::StateChanged { key, value } => EventOutput::StateChanged {
                key: key.as_str(),
                value: value.as_str(),
            },
            HostEvent::SharedMemoryReady => EventOutput::SharedMemoryReady,
            HostEvent::SharedMemoryChanged { data, hints } => EventOutput::SharedMemoryChanged {
                size: data.len(),
                hints: *hints,
                payload: bulk::encode(data),
            },
        },
        ChannelEvent::Foreign(envelope) => EventOutput::Foreign {
            namespace: envelope.namespace.as_str(),
            method: envelope.method.as_str(),
            args: &envelope.args,
        },
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Pretty => match event {
            ChannelEvent::Open => println!("channel open"),
            ChannelEvent::Closed => println!("channel closed"),
            ChannelEvent::Host(host) => println!("{host:?}"),
            ChannelEvent::Foreign(envelope) => {
                let rendered: Vec<String> = envelope.args.iter().map(Value::to_string).collect();
                println!(
                    "foreign [{}] {} {}",
                    envelope.namespace,
                    envelope.method,
                    rendered.join(" ")
                );
            }
        },
    }
}
