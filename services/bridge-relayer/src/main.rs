// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bridge Relayer Binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use tokio::signal::unix;

use bridge_relayer::service;
use bridge_relayer_config::cli::{load_config, setup_logger, Command, Opts};
use bridge_relayer_context::RelayerContext;
use bridge_relayer_proposal_writers::Router;
use bridge_relayer_utils::probe;

/// The main entry point for the relayer.
///
/// # Arguments
///
/// * `args` - The command line arguments.
#[paw::main]
#[tokio::main]
async fn main(args: Opts) -> anyhow::Result<()> {
    setup_logger(args.verbose, "bridge_relayer")?;
    match dotenv::dotenv() {
        Ok(_) => {
            tracing::trace!("Loaded .env file");
        }
        Err(e) => {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    // The configuration is validated and configured from the given directory
    let config = load_config(args.config_dir.clone())?;
    let ctx = RelayerContext::new(config);

    // connects to every destination chain, fails on the first one that
    // cannot be reached or whose keys are missing.
    let router = service::ignite(&ctx).await?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        started = true
    );

    match args.command {
        Command::Relay(opts) => relay_one(&router, &opts).await,
        Command::Listen => listen(ctx, router).await,
    }
}

async fn relay_one(
    router: &Router,
    opts: &bridge_relayer_config::cli::RelayOpts,
) -> anyhow::Result<()> {
    let message = service::message_from_opts(opts)?;
    tracing::info!(%message, "Relaying message");
    if router.send(&message).await {
        tracing::info!(%message, "Message delivered");
        Ok(())
    } else {
        anyhow::bail!("message {message} was not delivered, try again later")
    }
}

async fn listen(ctx: RelayerContext, router: Router) -> anyhow::Result<()> {
    // stdin is read on its own thread, a pending read must not hold the
    // runtime open after shutdown.
    let lines = service::spawn_line_reader(std::io::BufReader::new(
        std::io::stdin(),
    ))?;
    let mut listener = tokio::spawn(service::listen(
        router,
        lines,
        ctx.shutdown_signal(),
    ));
    // watch for signals
    let mut ctrlc_signal = unix::signal(unix::SignalKind::interrupt())?;
    let mut termination_signal = unix::signal(unix::SignalKind::terminate())?;
    let mut quit_signal = unix::signal(unix::SignalKind::quit())?;
    let shutdown = || {
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            shutdown = true
        );
        tracing::warn!("Shutting down...");
        // the listener finishes the message it is relaying before it stops.
        ctx.shutdown();
    };
    tokio::select! {
        stats = &mut listener => {
            let stats = stats??;
            tracing::info!(?stats, "Input closed, exiting");
            return Ok(());
        },
        _ = ctrlc_signal.recv() => {
            tracing::warn!("Interrupted (Ctrl+C) ...");
            shutdown();
        },
        _ = termination_signal.recv() => {
            tracing::warn!("Got Terminate signal ...");
            shutdown();
        },
        _ = quit_signal.recv() => {
            tracing::warn!("Quitting ...");
            shutdown();
        },
    }
    let stats = listener.await??;
    tracing::info!(?stats, "Clean Exit ..");
    Ok(())
}
