// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsd`: the scheduler daemon binary. Builds a [`Scheduler`] from the
//! environment (§6 "External Interfaces") and ticks it on an interval
//! until asked to shut down, snapshotting state on the way out.

use std::process::ExitCode;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use wsched_daemon::{env, logging, SchedulerConfig, Scheduler};

fn print_help() {
    println!("wsd {}", env!("CARGO_PKG_VERSION"));
    println!("Usage: wsd [--version | --help]");
    println!();
    println!("Configuration is read from the environment:");
    println!("  WSCHED_READ_PATH   directory polled for process definition documents");
    println!("  WSCHED_SAVE_PATH   file the scheduler's state snapshot is written to");
    println!("  WSCHED_LOG_PATH    log file path (default: stderr)");
    println!("  RUST_LOG           tracing filter directive (default: info)");
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--version") => {
            println!("wsd {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Some("--help") => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Some(other) => {
            eprintln!("unrecognized argument '{other}'");
            print_help();
            return ExitCode::FAILURE;
        }
        None => {}
    }

    let _guard = match logging::init(env::log_path().as_deref()) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("failed to initialize logging: {error}");
            return ExitCode::FAILURE;
        }
    };

    let config = SchedulerConfig::new(env::read_path(), env::save_path());
    let save_path = config.save_path.clone();
    let mut scheduler = Scheduler::new(config);

    info!(scheduler_root = %scheduler.scheduler_root(), "wsd starting");

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(error) => {
            eprintln!("failed to install SIGTERM handler: {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(3));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scheduler.tick().await;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    if let Err(error) = scheduler.save_state() {
        tracing::error!(%error, path = %save_path.display(), "failed to persist final snapshot");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
