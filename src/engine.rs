use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::alert::{AlertDecision, AlertLimiter};
use crate::config::MonitorConfig;
use crate::host::resolve_identity;
use crate::models::{Alert, CycleOutcome, ProbeResult};
use crate::notifier::AlertNotifier;
use crate::probe::ServiceProbe;

pub const CHECK_INTERVAL: Duration = Duration::from_secs(60);

pub struct Monitor<P, N> {
    config: MonitorConfig,
    probe: P,
    notifier: N,
    limiter: AlertLimiter,
    http_client: reqwest::Client,
}

impl<P: ServiceProbe, N: AlertNotifier> Monitor<P, N> {
    pub fn new(config: MonitorConfig, probe: P, notifier: N) -> Self {
        let limiter = AlertLimiter::new(config.cool_down(), Instant::now());
        Self {
            config,
            probe,
            notifier,
            limiter,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn run(mut self) {
        info!(
            service = %self.config.service_name,
            interval_secs = CHECK_INTERVAL.as_secs(),
            cool_down_mins = self.config.cool_down_minutes,
            "Watchdog polling loop active"
        );

        loop {
            let started = Instant::now();
            let outcome = self.check_once(started).await;
            info!(?outcome, elapsed_ms = started.elapsed().as_millis() as u64, "Cycle completed");

            tokio::time::sleep(CHECK_INTERVAL).await;
        }
    }

    pub async fn check_once(&mut self, now: Instant) -> CycleOutcome {
        let service = self.config.service_name.clone();
        let result = self.probe.probe(&service).await;

        if result == ProbeResult::Running {
            info!("Service '{}' is running.", service);
            return CycleOutcome::Healthy;
        }

        if !result.triggers_alert() {
            warn!("Could not determine state of service '{}' ({}), skipping alert", service, result);
            return CycleOutcome::Unreachable;
        }

        error!("Service '{}' is down: {}", service, result);
        self.maybe_alert(&result, now).await
    }

    pub async fn maybe_alert(&mut self, result: &ProbeResult, now: Instant) -> CycleOutcome {
        if self.limiter.check(now) == AlertDecision::Suppress {
            info!("Not sending alert, one was already sent in this cool-down window");
            return CycleOutcome::AlertSuppressed;
        }

        let host = resolve_identity(&self.http_client, &self.config.ip_lookup_url, self.config.request_timeout()).await;
        let alert = Alert::compose(
            &self.config.service_name,
            result,
            &host,
            Utc::now(),
            &self.config.recipients,
            &self.config.source_address,
        );

        match self.notifier.send(&alert).await {
            Ok(message_id) => {
                info!(%message_id, recipients = alert.recipients.len(), "Alert email sent successfully");
                self.limiter.record_sent(now);
                CycleOutcome::AlertSent { message_id }
            }
            Err(e) => {
                error!("Error sending alert email: {}", e);
                self.limiter.record_failure();
                CycleOutcome::AlertFailed
            }
        }
    }
}

#[cfg(test)]
mod tests;
