use std::time::Duration;

use tracing::warn;

use crate::models::ProbeResult;

pub const SCM_CONNECT_FAILED: &str = "scm-connect-failed";

pub trait ServiceProbe {
    async fn probe(&self, service_name: &str) -> ProbeResult;
}

#[cfg(windows)]
pub type PlatformProbe = windows_scm::ScmProbe;
#[cfg(not(windows))]
pub type PlatformProbe = SystemdProbe;

async fn with_deadline<F>(timeout: Duration, probe: F) -> ProbeResult
where
    F: std::future::Future<Output = ProbeResult>,
{
    match tokio::time::timeout(timeout, probe).await {
        Ok(result) => result,
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "Service probe timed out");
            ProbeResult::unreachable("probe-timeout")
        }
    }
}

/// Asks systemd through `systemctl show`.
#[cfg(any(not(windows), test))]
pub struct SystemdProbe {
    timeout: Duration,
}

#[cfg(any(not(windows), test))]
impl SystemdProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(any(not(windows), test))]
impl ServiceProbe for SystemdProbe {
    async fn probe(&self, service_name: &str) -> ProbeResult {
        with_deadline(self.timeout, async {
            let output = tokio::process::Command::new("systemctl")
                .args(["show", service_name, "--property=LoadState,ActiveState"])
                .kill_on_drop(true)
                .output()
                .await;

            match output {
                Ok(out) if out.status.success() => parse_systemctl_show(&String::from_utf8_lossy(&out.stdout)),
                Ok(out) => {
                    warn!(
                        status = out.status.code().unwrap_or(-1),
                        stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                        "Failed to connect to service manager"
                    );
                    ProbeResult::unreachable(SCM_CONNECT_FAILED)
                }
                Err(e) => {
                    warn!("Failed to connect to service manager: {}", e);
                    ProbeResult::unreachable(SCM_CONNECT_FAILED)
                }
            }
        })
        .await
    }
}

#[cfg(any(not(windows), test))]
fn parse_systemctl_show(stdout: &str) -> ProbeResult {
    let mut load_state = None;
    let mut active_state = None;

    for line in stdout.lines() {
        match line.split_once('=') {
            Some(("LoadState", value)) => load_state = Some(value.trim()),
            Some(("ActiveState", value)) => active_state = Some(value.trim()),
            _ => {}
        }
    }

    tracing::debug!(?load_state, ?active_state, "systemctl show parsed");

    match (load_state, active_state) {
        (Some("not-found"), _) => ProbeResult::Missing {
            reason: "unit not found".into(),
        },
        (_, Some("active")) => ProbeResult::Running,
        (Some(_), Some(state)) => ProbeResult::NotRunning { state: state.to_string() },
        _ => ProbeResult::unreachable(format!("query-failed: unexpected systemctl output {:?}", stdout.trim())),
    }
}

#[cfg(windows)]
pub mod windows_scm {
    use std::time::Duration;

    use tracing::warn;
    use windows_sys::Win32::Foundation::{GetLastError, WIN32_ERROR};
    use windows_sys::Win32::System::Services::{
        CloseServiceHandle, OpenSCManagerW, OpenServiceW, QueryServiceStatus, SC_HANDLE,
        SC_MANAGER_CONNECT, SERVICE_CONTINUE_PENDING, SERVICE_PAUSED, SERVICE_PAUSE_PENDING,
        SERVICE_QUERY_STATUS, SERVICE_RUNNING, SERVICE_START_PENDING, SERVICE_STATUS,
        SERVICE_STATUS_CURRENT_STATE, SERVICE_STOPPED, SERVICE_STOP_PENDING,
    };

    use super::{with_deadline, ServiceProbe, SCM_CONNECT_FAILED};
    use crate::models::ProbeResult;

    /// Closes the SCM or service handle on every exit path.
    struct ScHandle(SC_HANDLE);

    impl ScHandle {
        fn open(raw: SC_HANDLE) -> Option<Self> {
            if raw.is_null() { None } else { Some(Self(raw)) }
        }
    }

    impl Drop for ScHandle {
        fn drop(&mut self) {
            unsafe {
                CloseServiceHandle(self.0);
            }
        }
    }

    pub struct ScmProbe {
        timeout: Duration,
    }

    impl ScmProbe {
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }
    }

    impl ServiceProbe for ScmProbe {
        async fn probe(&self, service_name: &str) -> ProbeResult {
            let name = service_name.to_string();
            with_deadline(self.timeout, async move {
                match tokio::task::spawn_blocking(move || query_service(&name)).await {
                    Ok(result) => result,
                    Err(e) => ProbeResult::unreachable(format!("query-failed: {}", e)),
                }
            })
            .await
        }
    }

    fn query_service(service_name: &str) -> ProbeResult {
        let wide: Vec<u16> = service_name.encode_utf16().chain(std::iter::once(0)).collect();

        let manager = match ScHandle::open(unsafe {
            OpenSCManagerW(std::ptr::null(), std::ptr::null(), SC_MANAGER_CONNECT)
        }) {
            Some(handle) => handle,
            None => {
                warn!(os_error = unsafe { GetLastError() }, "Failed to connect to Service Control Manager");
                return ProbeResult::unreachable(SCM_CONNECT_FAILED);
            }
        };

        let service = match ScHandle::open(unsafe { OpenServiceW(manager.0, wide.as_ptr(), SERVICE_QUERY_STATUS) }) {
            Some(handle) => handle,
            None => {
                let code = unsafe { GetLastError() };
                return ProbeResult::Missing {
                    reason: format!("OpenService failed (os error {})", code),
                };
            }
        };

        let mut status: SERVICE_STATUS = unsafe { std::mem::zeroed() };
        let queried = if unsafe { QueryServiceStatus(service.0, &mut status) } == 0 {
            let code = unsafe { GetLastError() };
            warn!(os_error = code, "Failed to query service '{}'", service_name);
            Err(code)
        } else {
            Ok(status.dwCurrentState)
        };

        status_result(queried)
    }

    /// Maps a `QueryServiceStatus` outcome (current state or os error) to a result.
    fn status_result(queried: Result<SERVICE_STATUS_CURRENT_STATE, WIN32_ERROR>) -> ProbeResult {
        match queried {
            Ok(SERVICE_RUNNING) => ProbeResult::Running,
            Ok(state) => ProbeResult::NotRunning { state: state_name(state) },
            Err(code) => ProbeResult::unreachable(format!("query-failed: os error {}", code)),
        }
    }

    fn state_name(state: SERVICE_STATUS_CURRENT_STATE) -> String {
        match state {
            SERVICE_STOPPED => "Stopped".to_string(),
            SERVICE_START_PENDING => "StartPending".to_string(),
            SERVICE_STOP_PENDING => "StopPending".to_string(),
            SERVICE_RUNNING => "Running".to_string(),
            SERVICE_CONTINUE_PENDING => "ContinuePending".to_string(),
            SERVICE_PAUSE_PENDING => "PausePending".to_string(),
            SERVICE_PAUSED => "Paused".to_string(),
            other => other.to_string(),
        }
    }

}
