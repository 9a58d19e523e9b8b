use order_payment_saga::app_system::{setup_tracing, CheckoutSystem, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e.to_string()
    })?;
    info!(?config, "Configuration loaded");

    let system = CheckoutSystem::new(&config).map_err(|e| {
        error!(error = %e, "Startup failed");
        e.to_string()
    })?;

    info!("Order and payment workflows ready; press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
