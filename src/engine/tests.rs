use std::time::{Duration, Instant};

use super::Monitor;
use crate::config::MonitorConfig;
use crate::models::{AlertPhase, CycleOutcome, ProbeResult};
use crate::notifier::mock::MockNotifier;
use crate::probe::mock::ScriptedProbe;

fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

fn test_config() -> MonitorConfig {
    MonitorConfig {
        // closed local port so the IP lookup fails fast and offline
        ip_lookup_url: "http://127.0.0.1:1/".into(),
        request_timeout_ms: 2_000,
        ..MonitorConfig::default()
    }
}

fn missing() -> ProbeResult {
    ProbeResult::Missing {
        reason: "OpenService failed (os error 1060)".into(),
    }
}

#[tokio::test]
async fn running_service_never_alerts() {
    let mut monitor = Monitor::new(test_config(), ScriptedProbe::new(vec![ProbeResult::Running]), MockNotifier::default());
    let start = Instant::now();

    for minute in 0..5 {
        assert_eq!(monitor.check_once(start + mins(minute)).await, CycleOutcome::Healthy);
    }
    assert_eq!(monitor.notifier.attempt_count(), 0);
}

#[tokio::test]
async fn unreachable_manager_is_logged_not_alerted() {
    let probe = ScriptedProbe::new(vec![ProbeResult::unreachable("scm-connect-failed")]);
    let mut monitor = Monitor::new(test_config(), probe, MockNotifier::default());

    assert_eq!(monitor.check_once(Instant::now()).await, CycleOutcome::Unreachable);
    assert_eq!(monitor.notifier.attempt_count(), 0);
    assert_eq!(monitor.limiter.phase(), AlertPhase::Armed);
}

#[tokio::test]
async fn ip_lookup_failure_still_sends_with_empty_ip() {
    let mut monitor = Monitor::new(test_config(), ScriptedProbe::new(vec![missing()]), MockNotifier::default());

    let outcome = monitor.check_once(Instant::now()).await;
    assert_eq!(outcome, CycleOutcome::AlertSent { message_id: "mock-1".into() });

    let sent = monitor.notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains(", IP: \n"));
    assert_eq!(sent[0].subject, "ALERT: RabbitMQ is down");
    assert_eq!(sent[0].recipients.len(), 5);
}

#[tokio::test]
async fn failed_dispatch_retries_on_next_tick() {
    let probe = ScriptedProbe::new(vec![ProbeResult::NotRunning { state: "Stopped".into() }]);
    let mut monitor = Monitor::new(test_config(), probe, MockNotifier::default());
    let start = Instant::now();

    monitor.notifier.set_failing(true);
    assert_eq!(monitor.check_once(start).await, CycleOutcome::AlertFailed);
    assert_eq!(monitor.limiter.phase(), AlertPhase::Armed);

    monitor.notifier.set_failing(false);
    assert!(matches!(
        monitor.check_once(start + mins(1)).await,
        CycleOutcome::AlertSent { .. }
    ));
    assert_eq!(monitor.notifier.attempt_count(), 2);
    assert_eq!(monitor.notifier.sent_count(), 1);
    assert_eq!(monitor.limiter.phase(), AlertPhase::Suppressed);
}

#[tokio::test]
async fn outage_then_recovery_then_relapse_follows_window() {
    let probe = ScriptedProbe::new(vec![missing()]);
    let mut monitor = Monitor::new(test_config(), probe, MockNotifier::default());
    let start = Instant::now();

    // t=0 absent: alert #1
    assert!(matches!(monitor.check_once(start).await, CycleOutcome::AlertSent { .. }));

    // t=30 still absent: suppressed
    assert_eq!(monitor.check_once(start + mins(30)).await, CycleOutcome::AlertSuppressed);

    // t=61 window elapsed: alert #2
    assert!(matches!(
        monitor.check_once(start + mins(61)).await,
        CycleOutcome::AlertSent { .. }
    ));

    // t=90 back up
    monitor.probe.push(ProbeResult::Running);
    assert_eq!(monitor.check_once(start + mins(90)).await, CycleOutcome::Healthy);

    // t=100 absent again, only 39 minutes since alert #2
    monitor.probe.push(missing());
    assert_eq!(monitor.check_once(start + mins(100)).await, CycleOutcome::AlertSuppressed);

    assert_eq!(monitor.notifier.sent_count(), 2);
}

#[tokio::test]
async fn short_window_from_config_is_honoured() {
    let config = MonitorConfig {
        cool_down_minutes: 5,
        ..test_config()
    };
    let mut monitor = Monitor::new(config, ScriptedProbe::new(vec![missing()]), MockNotifier::default());
    let start = Instant::now();

    for minute in 0..=20 {
        monitor.check_once(start + mins(minute)).await;
    }

    // sends at t=0, 6, 12 and 18 minutes
    assert_eq!(monitor.notifier.sent_count(), 4);
}

#[tokio::test]
async fn alert_path_follows_probe_result_policy() {
    let cases = [
        ProbeResult::Running,
        ProbeResult::unreachable("scm-connect-failed"),
        ProbeResult::unreachable("query-failed: os error 5"),
        ProbeResult::NotRunning { state: "Stopped".into() },
        missing(),
    ];

    for result in cases {
        let alerts = result.triggers_alert();
        let mut monitor = Monitor::new(test_config(), ScriptedProbe::new(vec![result.clone()]), MockNotifier::default());

        let outcome = monitor.check_once(Instant::now()).await;
        assert_eq!(matches!(outcome, CycleOutcome::AlertSent { .. }), alerts, "{:?} gave {:?}", result, outcome);
        assert_eq!(monitor.notifier.attempt_count(), usize::from(alerts));
    }
}
