use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ohm_render::{DiagramGenerator, HttpDiagramGenerator, RenderConfig, UnconfiguredGenerator};
use ohm_worker::{PgDiagramStore, ProcessorConfig, QueueProcessor};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ohm_worker=debug,ohm_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = ohm_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    ohm_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    ohm_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Processor ---
    let config = ProcessorConfig::from_env();
    let render_config = RenderConfig::from_env();
    let generator: Arc<dyn DiagramGenerator> = match HttpDiagramGenerator::new(&render_config) {
        Ok(generator) => Arc::new(generator),
        Err(e) => {
            tracing::warn!(error = %e, "Diagram generator unavailable, jobs will fail");
            Arc::new(UnconfiguredGenerator)
        }
    };
    let processor = Arc::new(QueueProcessor::new(
        Arc::new(PgDiagramStore::new(pool)),
        generator,
        config,
    ));

    // --- Scheduler ---
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(ohm_worker::scheduler::run(
        Arc::clone(&processor),
        cancel.clone(),
    ));

    shutdown_signal().await;
    cancel.cancel();

    // A run already in progress completes before cancellation is observed.
    let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    tracing::info!("Worker stopped");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
