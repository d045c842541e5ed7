//! Delivery worker entrypoint: one batch worker per configured channel.

use std::sync::Arc;
use std::time::Duration;

use amoria_core::Channel;
use amoria_worker::config::WorkerConfig;
use amoria_worker::transport::{
    EmailConfig, EmailTransport, PushConfig, PushTransport, SmsConfig, SmsTransport, Transport,
};
use amoria_worker::DeliveryWorker;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amoria_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = amoria_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    amoria_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    amoria_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Workers ---
    let config = WorkerConfig::from_env();
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    for (channel, transport) in build_transports() {
        let worker = DeliveryWorker::new(pool.clone(), channel, transport, &config);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            worker.run(cancel).await;
        }));
    }

    if handles.is_empty() {
        tracing::warn!(
            "No transports configured (set SMTP_HOST, SMS_API_URL, or PUSH_API_URL); exiting"
        );
        return;
    }

    // Queue retention: purge terminal entries past the audit window.
    handles.push(tokio::spawn(amoria_worker::retention::run(
        pool.clone(),
        cancel.clone(),
    )));

    tracing::info!(worker_count = handles.len(), "Delivery workers running");

    shutdown_signal().await;
    cancel.cancel();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Graceful shutdown complete");
}

/// Build a transport for every channel with configuration present.
/// Unconfigured channels are skipped with a log line, not an error.
fn build_transports() -> Vec<(Channel, Arc<dyn Transport>)> {
    let mut transports: Vec<(Channel, Arc<dyn Transport>)> = Vec::new();

    match EmailConfig::from_env() {
        Some(config) => {
            transports.push((Channel::Email, Arc::new(EmailTransport::new(config))));
        }
        None => tracing::info!("SMTP_HOST not set, email worker disabled"),
    }

    match SmsConfig::from_env().map(SmsTransport::new) {
        Some(Ok(transport)) => transports.push((Channel::Sms, Arc::new(transport))),
        Some(Err(e)) => tracing::error!(error = %e, "SMS transport setup failed"),
        None => tracing::info!("SMS_API_URL not set, SMS worker disabled"),
    }

    match PushConfig::from_env().map(PushTransport::new) {
        Some(Ok(transport)) => transports.push((Channel::Push, Arc::new(transport))),
        Some(Err(e)) => tracing::error!(error = %e, "Push transport setup failed"),
        None => tracing::info!("PUSH_API_URL not set, push worker disabled"),
    }

    transports
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
