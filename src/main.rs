use calendar_digest::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting calendar digest");

    // Load configuration
    let config = startup::load_config()?;

    // Run the scheduler until shutdown
    startup::start_service(config).await
}
