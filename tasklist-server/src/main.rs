//! Tasklist server -- JSON CRUD API over a single task collection file.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:3000 with ./tasks.json
//! cargo run --bin tasklist-server
//!
//! # Custom address, data file, and bundled browser client
//! cargo run --bin tasklist-server -- --bind 127.0.0.1:8080 \
//!     --data-file /var/lib/tasklist/tasks.json --static-dir frontend
//!
//! # Or via environment variables
//! TASKLIST_ADDR=127.0.0.1:8080 cargo run --bin tasklist-server
//! ```

use std::sync::Arc;

use clap::Parser;
use tasklist_server::config::{ServerCliArgs, ServerConfig};
use tasklist_server::http;
use tasklist_server::service::TaskService;
use tasklist_server::store::FileStore;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = match FileStore::open(&config.data_file) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise task file");
            std::process::exit(1);
        }
    };
    tracing::info!(
        path = %store.path().display(),
        policy = ?config.storage_policy,
        "tasks stored in file"
    );

    let service = Arc::new(TaskService::with_policy(
        Arc::new(store),
        config.storage_policy,
    ));

    match http::start_server(&config.bind_addr, service, config.static_dir.as_deref()).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "tasklist API listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
