use support_server::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let bind = config.bind.clone();
    tracing::info!(
        ollama_url = %config.ollama_url,
        model = %config.model,
        ollama_analysis = config.ollama_analysis,
        "starting support backend"
    );
    let app = support_server::router(config.into_state());

    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(bind = %bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!(bind = %bind, "support-server listening");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    };
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
