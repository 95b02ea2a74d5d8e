//! Startup wiring shared by the binary and the tests.
//!
//! The board is probed once; whatever happens there, the HTTP server starts.
//! Without a board the light simply stays "not ready".

use crate::config::GateConfig;
use crate::http::{self, AppState};
use crate::monitor::{spawn_status_monitor, StatusMonitor};
use crate::serial;
use crate::state::Readiness;
use anyhow::Context;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Connects to the board, starts the monitor if that worked, then serves on
/// `listener` until `shutdown` resolves.
pub async fn run<F>(cfg: GateConfig, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let readiness = Readiness::new();

    // opening the port sleeps while the board resets, keep it off the runtime
    let serial_conf = cfg.serial.clone();
    let link = tokio::task::spawn_blocking(move || serial::connect(&serial_conf))
        .await
        .context("serial connect task panicked")?;

    let monitor = match link {
        Some((port, link)) => {
            info!(device = %port.device, "starting status monitor");
            let monitor = StatusMonitor::new(Some(link), readiness.clone(), cfg.serial.poll_interval());
            Some(spawn_status_monitor(monitor))
        }
        None => {
            warn!("running without status light, login stays locked");
            None
        }
    };

    let app_state = AppState {
        readiness,
        static_dir: cfg.http.static_dir.clone(),
    };
    let served = http::serve(listener, app_state, shutdown).await;

    if let Some(monitor) = monitor {
        monitor.stop().await;
    }
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_serves_without_device() {
        let mut cfg = GateConfig::default();
        cfg.serial.signatures = vec!["lightgate-no-such-board".into()];
        cfg.serial.settle_ms = 0;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(run(cfg, listener, async move {
            let _ = rx.await;
        }));

        let client = reqwest::Client::new();
        let status: Value = client
            .get(format!("http://{addr}/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status, json!({"connected": false}));

        let login: Value = client
            .post(format!("http://{addr}/login"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(login, json!({"status": "fail", "message": "Arduino not ready (red phase)"}));

        let _ = stop.send(());
        task.await.unwrap().unwrap();
    }
}
