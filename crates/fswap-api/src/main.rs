//! Axum API server binary.
//!
//! Wires the in-memory collaborators and the scripted engine, which is
//! what local development runs; a real deployment swaps those for the
//! production implementations behind the same traits.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fswap_api::{AdmissionGate, ApiConfig, AppState, JobService, Reaper};
use fswap_engine::scripted::ScriptedEngine;
use fswap_engine::SwapEngine;
use fswap_models::Tier;
use fswap_queue::{JobQueue, JobStateTracker};
use fswap_repo::{JobRepo, MemoryJobRepo, MemoryUsageLedger, MemoryUserDirectory, UsageLedger, UserDirectory};
use fswap_storage::ResultStore;
use fswap_worker::{ProcessingContext, Worker, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("fswap=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting fswap-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    // Collaborators
    let queue = Arc::new(JobQueue::new());
    let tracker = Arc::new(JobStateTracker::new());
    let store = ResultStore::from_env();
    let repo: Arc<dyn JobRepo> = Arc::new(MemoryJobRepo::new());
    let ledger: Arc<dyn UsageLedger> = Arc::new(MemoryUsageLedger::new());
    let users = seed_user_directory().await;
    let engine: Arc<dyn SwapEngine> = Arc::new(ScriptedEngine::new());

    // Worker loop
    let worker_config = WorkerConfig::from_env();
    let ctx = ProcessingContext {
        tracker: Arc::clone(&tracker),
        store: store.clone(),
        repo: Arc::clone(&repo),
        engine: Arc::clone(&engine),
        unit_error_policy: worker_config.unit_error_policy,
    };
    let (worker_handle, worker_join) =
        Worker::new(Arc::clone(&queue), ctx, worker_config).spawn();

    // Cleanup reaper
    let reaper = Reaper::new(
        store.clone(),
        Arc::clone(&tracker),
        config.state_retention,
        config.cleanup_interval,
    );
    tokio::spawn(reaper.run());

    let jobs = JobService::new(
        AdmissionGate::new(Arc::clone(&ledger)),
        queue,
        tracker,
        store,
        repo,
        ledger,
        engine,
        config.work_dir.clone(),
    );
    let state = AppState::new(config.clone(), jobs, users);
    let app = fswap_api::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let the worker finish the job in flight before exiting
    worker_handle.shutdown();
    if worker_join.await.is_err() {
        warn!("Worker task ended abnormally");
    }

    info!("Server shutdown complete");
}

/// Build the user directory, seeding bearer tokens from `API_TOKENS`
/// (`token:user_id:tier` entries, comma separated).
async fn seed_user_directory() -> Arc<dyn UserDirectory> {
    let directory = MemoryUserDirectory::new();

    if let Ok(spec) = std::env::var("API_TOKENS") {
        for entry in spec.split(',').filter(|e| !e.trim().is_empty()) {
            let mut parts = entry.trim().splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(token), Some(id), Some(tier)) => {
                    directory.add_token(token, id, Tier::from_str(tier)).await;
                }
                _ => warn!("Ignoring malformed API_TOKENS entry: {entry}"),
            }
        }
    }

    Arc::new(directory)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
