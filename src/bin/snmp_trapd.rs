//! snmp-trapd: Receive SNMP traps and print them as JSON lines.
//!
//! Events go to stdout, one JSON object per line. Diagnostics go to stderr.

use clap::Parser;
use snmp_trapd::cli::args::{DaemonArgs, LogArgs};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

/// Receive SNMPv1/v2c traps and emit them as newline-delimited JSON.
#[derive(Debug, Parser)]
#[command(name = "snmp-trapd", version, about)]
struct Args {
    #[command(flatten)]
    daemon: DaemonArgs,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    args.log.init_tracing();

    let config = match args.daemon.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let receiver = match config.receiver_builder().build().await {
        Ok(receiver) => receiver,
        Err(e) => {
            tracing::error!(error = %e, "failed to start trap receiver");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    match receiver.run(shutdown).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "trap receiver failed");
            ExitCode::FAILURE
        }
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl-C");
    }

    token.cancel();
}
