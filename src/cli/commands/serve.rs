use anyhow::{bail, Result};
use compute::registry::{load_accounts, validate_chart, AccountFilter};
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace, warn};

use crate::config::{initialize_app_state, Settings};
use crate::router::create_router;

pub async fn serve(settings: &Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("FinReport application starting up");
    debug!("Database URL: {}", settings.database_url);
    debug!("Bind address: {}", settings.bind_address);

    // Initialize application state
    trace!("Initializing application state");
    let state = match initialize_app_state(settings).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // Validate the chart of accounts before accepting writes
    trace!("Validating chart of accounts");
    let accounts = load_accounts(&state.db, AccountFilter::default()).await?;
    if accounts.is_empty() {
        warn!("No accounts found, run `finreport init-db` to seed the standard chart");
    }
    let issues = validate_chart(&accounts);
    for issue in &issues {
        warn!("Chart of accounts issue: {}", issue);
    }
    if !issues.is_empty() && settings.calculation.strict_validation {
        error!("Refusing to start with {} chart issue(s)", issues.len());
        bail!("chart of accounts has {} issue(s)", issues.len());
    }
    info!("Chart of accounts loaded: {} accounts", accounts.len());

    // Create router
    trace!("Creating application router");
    let app = create_router(state);
    debug!("Router created successfully");

    // Start server
    let bind_address = &settings.bind_address;
    info!("Starting server on {}", bind_address);
    trace!("Attempting to bind TCP listener to {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("FinReport API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);
    debug!("Server is ready to accept connections");

    trace!("Starting axum server");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
