use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Default period between pings while the socket channel is open.
pub const DEFAULT_PING_PERIOD: Duration = Duration::from_secs(10);

/// Last measured round-trip time. Readable from any handle, written only by
/// the channel core.
#[derive(Debug, Clone)]
pub struct LatencySample {
    millis: Arc<AtomicU64>,
}

impl LatencySample {
    fn new() -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Round-trip time in milliseconds. Zero until the first pong.
    pub fn millis(&self) -> u64 {
        self.millis.load(Ordering::Acquire)
    }

    /// Round-trip time as a duration.
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.millis())
    }
}

/// Periodic ping/pong over the socket channel.
///
/// Runs only while the channel is open; the timer is cancelled on close and
/// restarted on reopen so at most one is ever active. No retry or timeout: a
/// lost ping leaves the previous sample stale until the next round trip.
pub(crate) struct LivenessMonitor {
    sample: LatencySample,
    ping_period: Duration,
    sent_at: Option<Instant>,
    timer: Option<CancellationToken>,
    ticks: mpsc::UnboundedSender<()>,
}

impl LivenessMonitor {
    /// Create a monitor and the tick stream its timer fires on. The channel
    /// core turns each tick into one ping call.
    pub(crate) fn new(ping_period: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (ticks, tick_rx) = mpsc::unbounded_channel();
        let monitor = Self {
            sample: LatencySample::new(),
            ping_period,
            sent_at: None,
            timer: None,
            ticks,
        };
        (monitor, tick_rx)
    }

    /// Shared handle to the latency sample.
    pub(crate) fn sample(&self) -> LatencySample {
        self.sample.clone()
    }

    /// Start the ping timer. The first tick fires immediately, producing the
    /// on-connect ping.
    pub(crate) fn start(&mut self) {
        self.stop();

        let token = CancellationToken::new();
        let child = token.clone();
        let period = self.ping_period;
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        if ticks.send(()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        self.timer = Some(token);
    }

    /// Tear the timer down. Synchronous; safe to call when not running.
    pub(crate) fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.sent_at = None;
    }

    /// Record the send timestamp of an outgoing ping.
    pub(crate) fn note_ping_sent(&mut self) {
        self.sent_at = Some(Instant::now());
    }

    /// A pong arrived; update the latency sample.
    pub(crate) fn pong(&mut self) {
        if let Some(sent_at) = self.sent_at {
            let millis = sent_at.elapsed().as_millis() as u64;
            self.sample.millis.store(millis, Ordering::Release);
            tracing::debug!(latency_ms = millis, "pong");
        }
    }
}
