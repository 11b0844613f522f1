//! Graceful shutdown handling for acct-mgt
//!
//! OS signals (SIGTERM, SIGINT) flip a watch channel; the HTTP server stops
//! accepting connections and drains in-flight requests when it changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shutdown coordinator for graceful termination
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    is_shutting_down: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            is_shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Initiate graceful shutdown; later calls are no-ops
    pub fn shutdown(&self) {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("initiating graceful shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for SIGTERM or SIGINT, then initiate shutdown
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match (
                signal(SignalKind::terminate()),
                signal(SignalKind::interrupt()),
            ) {
                (Ok(mut sigterm), Ok(mut sigint)) => {
                    tokio::select! {
                        _ = sigterm.recv() => info!("received SIGTERM"),
                        _ = sigint.recv() => info!("received SIGINT"),
                    }
                }
                _ => {
                    warn!("unable to register signal handlers, falling back to ctrl-c");
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "unable to listen for ctrl-c");
                        return;
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "unable to listen for ctrl-c");
                return;
            }
            info!("received Ctrl+C");
        }

        self.shutdown();
    }

    /// Future that resolves once shutdown has been initiated, for axum
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.shutdown_rx.clone();

        async move {
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
