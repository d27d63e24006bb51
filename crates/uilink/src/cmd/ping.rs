use serde::Serialize;

use crate::cmd::{connect, parse_duration, PingArgs};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PingOutput {
    seq: usize,
    latency_ms: u64,
}

pub async fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = parse_duration(&args.timeout)?;
    let period = parse_duration(&args.period)?;
    let session = connect(&args.url, wait).await?;

    for seq in 0..args.count {
        session
            .channel
            .ping()
            .map_err(|err| channel_error("ping failed", err))?;
        tokio::time::sleep(period).await;

        let latency_ms = session.channel.latency().as_millis() as u64;
        match format {
            OutputFormat::Json => {
                let out = PingOutput { seq, latency_ms };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Pretty => println!("seq={seq} latency={latency_ms}ms"),
        }
    }

    session.channel.close();
    Ok(SUCCESS)
}
