use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::HostIdentity;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("ip lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ip lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// Builds the identity embedded in an alert. Never fails: a lookup that goes
/// wrong leaves its field empty.
pub async fn resolve_identity(client: &reqwest::Client, ip_lookup_url: &str, timeout: Duration) -> HostIdentity {
    let hostname = match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!("Failed to get hostname: {}", e);
            String::new()
        }
    };

    let public_ip = match public_ip(client, ip_lookup_url, timeout).await {
        Ok(ip) => {
            info!(%ip, "Public IP address resolved");
            ip
        }
        Err(e) => {
            warn!("Public IP lookup failed, alerting without it: {}", e);
            String::new()
        }
    };

    HostIdentity { hostname, public_ip }
}

pub async fn public_ip(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<String, LookupError> {
    let request = async {
        let body = client.get(url).send().await?.error_for_status()?.text().await?;
        Ok::<_, LookupError>(body.trim().to_string())
    };

    tokio::time::timeout(timeout, request)
        .await
        .map_err(|_| LookupError::Timeout(timeout))?
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{public_ip, resolve_identity};

    // nothing listens on port 1
    const CLOSED_URL: &str = "http://127.0.0.1:1/";

    #[tokio::test]
    async fn unreachable_echo_service_is_an_error() {
        let client = reqwest::Client::new();
        let result = public_ip(&client, CLOSED_URL, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn identity_survives_ip_lookup_failure() {
        let client = reqwest::Client::new();
        let identity = resolve_identity(&client, CLOSED_URL, Duration::from_secs(5)).await;
        assert_eq!(identity.public_ip, "");
    }

    #[tokio::test]
    async fn echo_body_is_trimmed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = axum::Router::new().route("/", axum::routing::get(|| async { "198.51.100.4\n" }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let client = reqwest::Client::new();
        let ip = public_ip(&client, &format!("http://{}/", addr), Duration::from_secs(5))
            .await
            .expect("lookup should succeed");
        assert_eq!(ip, "198.51.100.4");
    }
}
