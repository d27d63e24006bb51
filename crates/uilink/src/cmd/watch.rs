use crate::cmd::{connect, parse_duration, WatchArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};
use uilink_channel::ChannelEvent;

pub async fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let wait = parse_duration(&args.timeout)?;
    let mut session = connect(&args.url, wait).await?;

    print_event(&ChannelEvent::Open, format);
    let mut printed = 1usize;

    loop {
        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = session.events.recv() => match event {
                Some(event) => {
                    print_event(&event, format);
                    printed = printed.saturating_add(1);
                }
                None => break,
            },
        }
    }

    session.channel.close();
    Ok(SUCCESS)
}
