//! probed — the probegrid scheduler daemon.
//!
//! One process serves one scheduler replica. The deployment mode in
//! `probed.toml` selects where the worker set comes from:
//!
//! - **standalone** — workers on the same host register directly
//! - **configbased** — static worker list from configuration
//! - **production** — worker set pushed by an external state store
//!
//! # Usage
//!
//! ```text
//! probed --config /etc/probegrid/probed.toml --listen 0.0.0.0:20503
//! probed --config probed.toml --listen 10.0.0.1:20503 --advertised 10.0.0.1:20503
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use probe_core::{DeploymentMode, HostPort, ProbedConfig};
use probegrid_cluster::{ClusterState, ConfigState, StandaloneState, StoreState};
use probegrid_scheduler::{Scheduler, SchedulerServer};

#[derive(Parser)]
#[command(name = "probed", about = "probegrid scheduler daemon")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "probed.toml")]
    config: PathBuf,

    /// Address the RPC server binds to.
    #[arg(long, default_value = "127.0.0.1:20503")]
    listen: String,

    /// Address peers use to reach this scheduler (defaults to --listen).
    /// Must be routable: it is embedded in request IDs and reservation
    /// batches.
    #[arg(long)]
    advertised: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,probed=debug,probegrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let config = ProbedConfig::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let listen: SocketAddr = cli.listen.parse().context("parsing --listen")?;
    let advertised: HostPort = cli
        .advertised
        .as_deref()
        .unwrap_or(&cli.listen)
        .parse()
        .context("parsing --advertised")?;

    // ── Cluster-state provider ─────────────────────────────────────
    let (cluster, standalone): (Arc<dyn ClusterState>, Option<Arc<StandaloneState>>) =
        match config.deployment.mode {
            DeploymentMode::Standalone => {
                let state = Arc::new(StandaloneState::new());
                (Arc::clone(&state) as Arc<dyn ClusterState>, Some(state))
            }
            DeploymentMode::Configbased => {
                let state = ConfigState::from_workers(&config.cluster.workers)
                    .context("parsing [cluster] workers")?;
                (Arc::new(state), None)
            }
            DeploymentMode::Production => {
                let addr: HostPort = config
                    .cluster
                    .state_store
                    .as_deref()
                    .context("production mode requires [cluster] state_store")?
                    .parse()
                    .context("parsing [cluster] state_store")?;
                (Arc::new(StoreState::new(addr)), None)
            }
        };
    info!(mode = ?config.deployment.mode, "cluster-state provider initialized");

    // ── Scheduler ──────────────────────────────────────────────────
    let scheduler = Arc::new(Scheduler::new(
        advertised.clone(),
        cluster,
        config.placement.clone(),
    ));
    info!(
        %advertised,
        probe_ratio_unconstrained = config.placement.probe_ratio_unconstrained,
        probe_ratio_constrained = config.placement.probe_ratio_constrained,
        "scheduler initialized"
    );

    // ── RPC server ─────────────────────────────────────────────────
    let server = SchedulerServer::new(scheduler, standalone);
    info!(%listen, "scheduler RPC server starting");

    tonic::transport::Server::builder()
        .add_service(server.into_service())
        .serve_with_shutdown(listen, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    info!("probed stopped");
    Ok(())
}
