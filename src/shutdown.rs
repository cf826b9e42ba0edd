use std::future::{pending, Future};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
#[cfg(windows)]
use tokio::signal::windows::{ctrl_break, ctrl_c};

/// Wait for a termination signal, stop the scheduler and notify the main task.
///
/// Runs already in flight are detached tasks and are not awaited.
pub async fn handle_signals(shutdown_send: oneshot::Sender<()>, scheduler: AbortHandle) {
    stop_on_signal(wait_for_signal(), shutdown_send, scheduler).await;
}

async fn stop_on_signal<F>(received: F, shutdown_send: oneshot::Sender<()>, scheduler: AbortHandle)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = received.await {
        // Without handlers the service keeps running until killed
        error!("Failed to install signal handlers: {}", e);
        pending::<()>().await;
    }

    scheduler.abort();
    info!("Scheduler stopped");

    // Send shutdown signal to main task
    let _ = shutdown_send.send(());
}

/// Platform-specific signal handling implementation
#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    // Handle SIGTERM (sent by Kubernetes when pod is terminating)
    let mut sigterm = signal(SignalKind::terminate())?;
    // Handle SIGINT (Ctrl+C)
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT signal, initiating graceful shutdown");
        }
    }

    Ok(())
}

/// Platform-specific signal handling implementation
#[cfg(windows)]
async fn wait_for_signal() -> std::io::Result<()> {
    // Handle Ctrl+C
    let mut ctrlc = ctrl_c()?;
    // Handle Ctrl+Break
    let mut ctrlbreak = ctrl_break()?;

    tokio::select! {
        _ = ctrlc.recv() => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        }
        _ = ctrlbreak.recv() => {
            info!("Received Ctrl+Break signal, initiating graceful shutdown");
        }
    }

    Ok(())
}
