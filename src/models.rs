use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Running,
    NotRunning { state: String },
    /// The service could not be opened: not installed or not visible to us.
    Missing { reason: String },
    /// The service manager itself could not answer.
    Unreachable { reason: String },
}

impl ProbeResult {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable { reason: reason.into() }
    }

    /// Only a missing or stopped service alerts. A manager outage is logged and skipped.
    pub fn triggers_alert(&self) -> bool {
        matches!(self, Self::NotRunning { .. } | Self::Missing { .. })
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::NotRunning { state } => write!(f, "not running (state: {})", state),
            Self::Missing { reason } => write!(f, "could not be opened: {}", reason),
            Self::Unreachable { reason } => write!(f, "service manager unreachable: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPhase {
    Armed,
    Suppressed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostIdentity {
    pub hostname: String,
    pub public_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub source: String,
}

impl Alert {
    pub fn compose(
        service_name: &str,
        result: &ProbeResult,
        host: &HostIdentity,
        detected_at: DateTime<Utc>,
        recipients: &[String],
        source: &str,
    ) -> Self {
        Self {
            subject: format!("ALERT: {} is down", service_name),
            body: format!(
                "{} services are down for instance {}, IP: {}\nProbe: {} ({})",
                service_name,
                host.hostname,
                host.public_ip,
                result,
                detected_at.to_rfc3339(),
            ),
            recipients: recipients.to_vec(),
            source: source.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Healthy,
    Unreachable,
    AlertSuppressed,
    AlertSent { message_id: String },
    AlertFailed,
}
