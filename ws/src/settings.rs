use std::time::Duration;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// Default capacity of the coalescing broadcast-request channel.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1;
/// Default upper bound on sends in flight at once, shared by every pass and initial sync.
pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 64;
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(60);
const MIN_PING_PERIOD: Duration = Duration::from_millis(1);
/// Longest keep-alive interval; keeps every ticker deadline representable.
pub const MAX_PING_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables for the manager and its connections.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Payloads a connection may have queued before sends start waiting.
    pub outbound_capacity: usize,
    /// Pending broadcast requests; further `broadcast()` calls coalesce.
    pub broadcast_capacity: usize,
    /// How long a send waits for room in a full outbound queue.
    pub send_timeout: Duration,
    /// Deadline for a single frame write to the transport.
    pub write_timeout: Duration,
    /// Keep-alive reference interval: pings go out at 90% of it. Silence from
    /// the peer never ends a connection on its own.
    pub pong_wait: Duration,
    pub max_concurrent_sends: usize,
}

impl Settings {
    /// Keep-alive interval, 90% of `pong_wait`, clamped to a usable range.
    pub fn ping_period(&self) -> Duration {
        (self.pong_wait / 10 * 9).clamp(MIN_PING_PERIOD, MAX_PING_PERIOD)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            pong_wait: DEFAULT_PONG_WAIT,
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_period_is_ninety_percent_of_pong_wait() {
        let settings = Settings::default();
        assert_eq!(settings.ping_period(), Duration::from_secs(54));

        let settings = Settings {
            pong_wait: Duration::from_millis(1000),
            ..Settings::default()
        };
        assert_eq!(settings.ping_period(), Duration::from_millis(900));
    }

    #[test]
    fn test_ping_period_is_clamped_at_both_ends() {
        let huge = Settings {
            pong_wait: Duration::from_secs(u64::MAX / 4),
            ..Settings::default()
        };
        assert_eq!(huge.ping_period(), MAX_PING_PERIOD);

        let max = Settings {
            pong_wait: Duration::MAX,
            ..Settings::default()
        };
        assert_eq!(max.ping_period(), MAX_PING_PERIOD);

        let zero = Settings {
            pong_wait: Duration::ZERO,
            ..Settings::default()
        };
        assert_eq!(zero.ping_period(), MIN_PING_PERIOD);
    }
}
