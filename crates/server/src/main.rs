// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mascd: MASC room server.
//!
//! `mascd [--room <path>] [--mode <minimal|standard|full|solo|custom:…>] [--http]`
//!
//! Serves MCP over framed stdio by default, or over HTTP (+SSE) with
//! `--http`. Logs go to stderr so the stdio transport owns stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use masc_engine::{Coordinator, RoomConfig};
use masc_mcp::FeatureModes;
use masc_server::{build_router, dispatch::Dispatcher, env, serve, HttpState, McpServer, Metrics};

struct Args {
    room: PathBuf,
    http: bool,
    modes: FeatureModes,
}

fn parse_args() -> Result<Args, String> {
    let mut room = std::env::current_dir().map_err(|e| e.to_string())?;
    let mut http = false;
    let mut modes = FeatureModes::standard();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--http" => http = true,
            "--room" => {
                room = PathBuf::from(
                    args.next().ok_or_else(|| "--room requires a path".to_string())?,
                );
            }
            "--mode" => {
                let raw = args.next().ok_or_else(|| "--mode requires a value".to_string())?;
                modes = FeatureModes::parse(&raw)
                    .ok_or_else(|| format!("unknown feature mode: {raw}"))?;
            }
            "--help" | "-h" => {
                return Err("usage: mascd [--room <path>] [--mode <mode>] [--http]".to_string())
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Args { room, http, modes })
}

fn room_config() -> RoomConfig {
    let mut config = RoomConfig::default();
    if let Some(seconds) = env::zombie_threshold_s() {
        config.zombie_threshold = chrono::Duration::seconds(seconds);
    }
    config
}

/// Cancel the token on SIGINT or SIGTERM.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    cancel.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => info!("SIGINT received"),
                _ = sigterm.recv() => info!("SIGTERM received"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("SIGINT received");
        }
        cancel.cancel();
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = Arc::new(Coordinator::new(&args.room, room_config()));
    let metrics = Arc::new(Metrics::new());
    let dispatcher = Arc::new(Dispatcher::new(coordinator, Arc::clone(&metrics), args.modes));
    let server = Arc::new(McpServer::new(dispatcher));

    if env::encryption_key().is_some() {
        info!("at-rest encryption key configured");
    }

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    if args.http {
        let addr = env::http_addr();
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(%addr, error = %e, "failed to bind HTTP listener");
                return ExitCode::FAILURE;
            }
        };
        info!(%addr, room = %args.room.display(), "serving MCP over HTTP");
        let state = Arc::new(HttpState {
            server,
            metrics,
            max_body_bytes: env::max_body_bytes(),
            cancel: cancel.clone(),
        });
        serve(listener, build_router(state), cancel).await;
    } else {
        info!(room = %args.room.display(), "serving MCP over stdio");
        if let Err(e) = masc_server::stdio::run_stdio(server, cancel).await {
            error!(error = %e, "stdio transport failed");
            return ExitCode::FAILURE;
        }
    }

    info!("masc server stopped");
    ExitCode::SUCCESS
}
