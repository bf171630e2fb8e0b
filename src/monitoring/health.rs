//! Health check HTTP endpoint.
//!
//! A tiny HTTP responder on `monitoring.health_addr` that returns watcher
//! status as JSON. Used by external uptime monitors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::watch::watcher::SweepReport;

/// Shared health state updated by the watcher loop.
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<RwLock<HealthData>>,
}

#[derive(Debug, Clone, Serialize)]
struct HealthData {
    status: String,
    sweep_count: u64,
    watches: usize,
    started_at: DateTime<Utc>,
    last_sweep_at: Option<DateTime<Utc>>,
    last_sweep: Option<SweepReport>,
    uptime_seconds: i64,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthData {
                status: "ok".to_string(),
                sweep_count: 0,
                watches: 0,
                started_at: Utc::now(),
                last_sweep_at: None,
                last_sweep: None,
                uptime_seconds: 0,
            })),
        }
    }

    pub async fn record_sweep(&self, sweep_count: u64, report: SweepReport, watches: usize) {
        let mut data = self.inner.write().await;
        let now = Utc::now();
        data.sweep_count = sweep_count;
        data.watches = watches;
        data.last_sweep_at = Some(now);
        data.uptime_seconds = (now - data.started_at).num_seconds();
        // Every lookup failing usually means the store is unreachable.
        data.status = if report.lookups > 0 && report.failed == report.pairs {
            "degraded".to_string()
        } else {
            "ok".to_string()
        };
        data.last_sweep = Some(report);
    }

    async fn to_json(&self) -> String {
        let mut data = self.inner.read().await.clone();
        data.uptime_seconds = (Utc::now() - data.started_at).num_seconds();
        serde_json::to_string(&data).unwrap_or_else(|_| {
            r#"{"status":"error","message":"serialization failed"}"#.to_string()
        })
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the health check HTTP server. Returns a handle that can be aborted.
pub fn spawn_health_server(addr: String, state: HealthState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => {
                info!(addr = %addr, "Health check server listening");
                l
            }
            Err(e) => {
                warn!(error = %e, addr = %addr, "Failed to bind health check server, continuing without it");
                return;
            }
        };

        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "Failed to accept health check connection");
                    continue;
                }
            };

            let state = state.clone();
            tokio::spawn(async move {
                // Request contents are ignored
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;

                let body = state.to_json().await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\
                     \r\n\
                     {}",
                    body.len(),
                    body
                );

                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    })
}
