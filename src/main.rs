use file_depot::config::AppConfig;
use file_depot::jobs::runner;
use file_depot::routes;
use file_depot::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting file-depot v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data directories exist
    std::fs::create_dir_all(config.uploads_dir()).expect("Failed to create uploads dir");
    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data dir");

    // Stores load their documents here; unreadable state degrades to empty
    let state = AppState::new(config.clone());
    state.users.ensure_default_users().await;

    let pending = state.jobs.len();
    if pending > 0 {
        tracing::info!(count = pending, "Recovered scheduled jobs from disk");
    }
    tracing::info!(
        files = state.files.len().await,
        quota = %file_depot::services::quota::format_bytes(config.max_disk_space_bytes()),
        "Stores loaded"
    );

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Start background tasks
    let runner_handle = tokio::spawn(runner::run(state.clone(), shutdown_rx.clone()));
    let sweep_handle = tokio::spawn(runner::sweep(state.clone(), shutdown_rx.clone()));

    // Build router
    let app = routes::build_router(state.clone());

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("Server error");

    // Wait for background tasks
    tracing::info!("Waiting for background tasks to finish");
    let _ = tokio::join!(runner_handle, sweep_handle);

    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(shutdown_tx: tokio::sync::watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
