use std::time::{Duration, Instant};

use tracing::info;

use crate::models::AlertPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Send,
    Suppress,
}

/// In-memory cool-down for alert emails.
///
/// The window is re-armed by elapsed time only: a service that stays down gets
/// one alert per window, and one that flaps inside a window gets none extra.
#[derive(Debug)]
pub struct AlertLimiter {
    phase: AlertPhase,
    last_alert_at: Instant,
    cool_down: Duration,
}

impl AlertLimiter {
    pub fn new(cool_down: Duration, started_at: Instant) -> Self {
        Self {
            phase: AlertPhase::Armed,
            last_alert_at: started_at,
            cool_down,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> AlertPhase {
        self.phase
    }

    pub fn check(&mut self, now: Instant) -> AlertDecision {
        if now.saturating_duration_since(self.last_alert_at) > self.cool_down {
            if self.phase == AlertPhase::Suppressed {
                info!(
                    cool_down_secs = self.cool_down.as_secs(),
                    "Cool-down elapsed and service is still down, re-arming alert"
                );
            }
            self.phase = AlertPhase::Armed;
            self.last_alert_at = now;
        }

        match self.phase {
            AlertPhase::Suppressed => AlertDecision::Suppress,
            AlertPhase::Armed => AlertDecision::Send,
        }
    }

    pub fn record_sent(&mut self, now: Instant) {
        self.phase = AlertPhase::Suppressed;
        self.last_alert_at = now;
    }

    /// Stays armed so the next unhealthy tick retries straight away.
    pub fn record_failure(&mut self) {
        self.phase = AlertPhase::Armed;
    }
}
