use clap::Parser;
use dojo_agent_loop::ExecutionEngine;
use dojo_contract::CheckpointStore;
use dojo_extension_checkin::{CheckInMatTool, Roster};
use dojo_server::service::AppState;
use dojo_server::{http, Args, ServerConfig};
use dojo_store_adapters::{FileStore, MemoryStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = match ServerConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    init_tracing(config.log_json);

    let roster = match &config.roster {
        Some(path) => match Roster::load(path).await {
            Ok(roster) => roster,
            Err(e) => {
                eprintln!("failed to load roster {}: {e}", path.display());
                std::process::exit(2);
            }
        },
        None => Roster::sample(),
    };
    let roster = Arc::new(roster);

    let store: Arc<dyn CheckpointStore> = match &config.storage_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using file checkpoint store");
            Arc::new(FileStore::new(dir.clone()))
        }
        None => {
            tracing::info!("using in-memory checkpoint store");
            Arc::new(MemoryStore::new())
        }
    };

    let agent = config
        .agent_config(&roster.context_summary().await)
        .with_tool(Arc::new(CheckInMatTool::new(roster.clone())));
    tracing::info!(
        model = %agent.model,
        step_timeout = ?agent.step_timeout,
        "agent configured"
    );
    let engine = ExecutionEngine::new(agent, store);
    let app = http::router(AppState::new(engine));

    let listener = match tokio::net::TcpListener::bind(config.http_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {}: {e}", config.http_addr);
            std::process::exit(1);
        }
    };
    tracing::info!(addr = %config.http_addr, "dojo server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
