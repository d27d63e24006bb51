use std::time::Duration;

use tokio::time::timeout;

use crate::cmd::{connect, parse_duration, parse_values, CallArgs};
use crate::exit::{channel_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_reply, OutputFormat};

pub async fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = parse_duration(&args.timeout)?;
    let session = connect(&args.url, wait).await?;
    let values = parse_values(&args.args);

    if args.expect_reply {
        let reply = timeout(
            wait,
            session
                .channel
                .call_and_expect_reply(&args.method, args.cacheable, values),
        )
        .await
        .map_err(|_| CliError::new(TIMEOUT, format!("no reply to {} in time", args.method)))?
        .map_err(|err| channel_error("call failed", err))?;

        print_reply(&args.method, &reply, format);
    } else {
        session
            .channel
            .call(&args.method, values)
            .map_err(|err| channel_error("call failed", err))?;
        // Fire-and-forget: give the writer task a beat to flush the frame
        // before tearing the connection down.
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    session.channel.close();
    Ok(SUCCESS)
}
