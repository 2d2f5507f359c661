// Outbound state report policy for the driving client.

use crate::domain::MotionReport;
use std::time::{Duration, Instant};

/// How often the local car's state may be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicy {
    /// Minimum spacing between two reports.
    pub min_interval: Duration,
    /// Maximum silence; an unchanged state is re-sent after this long.
    pub heartbeat: Duration,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(50),
            heartbeat: Duration::from_millis(1000),
        }
    }
}

/// Rate- and change-gated report emitter.
#[derive(Debug, Clone)]
pub struct ReportThrottle {
    policy: ReportPolicy,
    last_sent: Option<(Instant, MotionReport)>,
}

impl ReportThrottle {
    pub fn new(policy: ReportPolicy) -> Self {
        Self {
            policy,
            last_sent: None,
        }
    }

    /// Returns true (and records the report) when `report` should go out at `now`.
    pub fn should_send(&mut self, now: Instant, report: &MotionReport) -> bool {
        let send = match &self.last_sent {
            None => true,
            Some((at, last)) => {
                let elapsed = now.saturating_duration_since(*at);
                if elapsed >= self.policy.heartbeat {
                    true
                } else if elapsed < self.policy.min_interval {
                    false
                } else {
                    last != report
                }
            }
        };
        if send {
            self.last_sent = Some((now, *report));
        }
        send
    }

    /// Forgets the last report so the next one goes out immediately.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
