use anyhow::Result;
use std::sync::Arc;

use doclens_backend::{
    app, config, logging,
    pipeline::{CancelHandle, CancelSignal, DocumentAnalyzer},
    services::{GeminiClient, StructuredExtractor, UnavailableSynthesizer},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        model = %settings.gemini_model,
        "Starting document analysis backend"
    );

    // Create model service client
    let gemini = Arc::new(GeminiClient::new(&settings.gemini())?);

    // Optionally check model service health (non-blocking)
    tokio::spawn({
        let gemini = gemini.clone();
        async move {
            match gemini.health_check().await {
                Ok(()) => tracing::info!("Model service is reachable"),
                Err(e) => tracing::warn!(error = %e, "Model service health check failed - will retry on first request"),
            }
        }
    });

    let analyzer = DocumentAnalyzer::new(gemini, settings.ai_service_timeout());
    let (shutdown_handle, shutdown) = CancelSignal::pair();

    let state = app::AppState::new(
        settings.clone(),
        analyzer,
        Arc::new(UnavailableSynthesizer::new()),
        shutdown,
    );

    let app = app::create_app(state);

    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_handle))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel in-flight analyses so draining
/// connections do not wait on the model service.
async fn shutdown_signal(handle: CancelHandle) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }

    handle.cancel();
}
