use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use eventlog_sync::api::{self, ControlState};
use eventlog_sync::cli::{Args, Frequency};
use eventlog_sync::eventlog::{LocalLister, SyncPlanner};
use eventlog_sync::sync::{ImdsCredentialSupplier, RcloneTransfer, StopMarker, SyncExit, SyncLoop};
use eventlog_sync::utils::{self, Config};

// Single-threaded: the loop and the control server share one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let config = match utils::config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("eventlog-sync: {}", e);
            return SyncExit::Fatal.into();
        }
    };

    utils::logging::init_tracing(config.log_format);

    match run(args, config).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{:#}", e);
            SyncExit::Fatal.into()
        }
    }
}

async fn run(args: Args, config: Config) -> Result<SyncExit> {
    info!(
        "Starting eventlog-sync v{}: {} -> {} ({:?})",
        env!("CARGO_PKG_VERSION"),
        args.source_dir.display(),
        args.target_dir,
        args.frequency
    );
    if let Some(region) = &config.s3_region {
        info!("Using region override {}", region);
    }

    let credentials = ImdsCredentialSupplier::new(&config.imds_endpoint, config.imds_timeout())
        .context("building metadata client")?;
    let stop = StopMarker::new(config.stop_marker.clone());

    let sync = SyncLoop::new(
        SyncPlanner::new(args.source_dir.clone(), args.target_dir.clone()),
        Arc::new(LocalLister::new()),
        Arc::new(credentials),
        Arc::new(RcloneTransfer::new(config.rclone_binary.clone())),
        stop.clone(),
        config.s3_region.clone(),
        config.interval(),
        config.history_size,
    );

    if let Some(port) = args.port {
        let state = ControlState {
            status: sync.status(),
            stop,
        };
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, state).await {
                warn!("Control server on port {} stopped: {}", port, e);
            }
        });
    }

    let exit = match args.frequency {
        Frequency::Forever => sync.run_forever().await,
        Frequency::Once => sync.run_once().await,
    };

    info!("Exiting with code {}", exit.code());
    Ok(exit)
}
