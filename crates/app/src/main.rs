//! VitaWave task store host
//!
//! Opens the device-local task store once at start-up, reports the
//! dashboard figures and flushes every pending save before exiting.

mod state;

use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitawave_core::task::DueLabel;
use vitawave_core::StoreConfig;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitawave=info,vitawave_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StoreConfig::from_env()?;
    tracing::info!(
        "Using data directory {:?} with storage key {}",
        config.data_dir,
        config.storage_key
    );

    let app_state = AppState::new(&config).await?;

    let today = Local::now().date_naive();
    let view = app_state.dashboard(today).await;
    tracing::info!(
        "Tasks: {} total, {} pending, {} in progress, {} completed, {} overdue ({} past due)",
        view.summary.total,
        view.summary.pending,
        view.summary.in_progress,
        view.summary.completed,
        view.summary.overdue,
        view.past_due
    );
    for task in &view.preview {
        tracing::info!(
            "[{}] {} - due {}",
            task.priority,
            task.title,
            DueLabel::for_task(task, today)
        );
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }

    app_state.shutdown().await;
    Ok(())
}
