use crate::config::Config;
use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::scheduler::start_scheduler;
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(config)),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the pipeline, start the weekly trigger and run until shutdown
pub async fn start_service(config: Arc<Config>) -> miette::Result<()> {
    let schedule = config.trigger_schedule()?;
    let pipeline = Arc::new(Pipeline::from_config(&config)?);

    info!(
        "Digest for calendar '{}' goes to {} recipient(s)",
        config.google_calendar_id,
        config.recipients.len()
    );

    let scheduler = start_scheduler(schedule, config.run_on_startup, pipeline);

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let abort_handle = scheduler.abort_handle();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, abort_handle).await;
    });

    // Wait for either the scheduler to end or a shutdown signal
    tokio::select! {
        result = scheduler => {
            match result {
                Ok(()) => Ok(()),
                Err(e) if e.is_cancelled() => Ok(()),
                Err(e) => {
                    error!("Scheduler task error: {:?}", e);
                    Err(Error::Other(format!("Scheduler task error: {}", e)).into())
                }
            }
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, shutting down...");
            Ok(())
        }
    }
}
