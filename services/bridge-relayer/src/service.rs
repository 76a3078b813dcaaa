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

use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;

use bridge_relayer_config::cli::RelayOpts;
use bridge_relayer_context::{RelayerContext, Shutdown};
use bridge_relayer_proposal_writers::{solana, Router};
use bridge_relayer_types::message::Message;
use bridge_relayer_utils::{probe, Error, Result};
use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;

/// Connects to every configured destination chain and registers its
/// writer in a new router.
///
/// Fails when any chain cannot be connected to, the relayer does not start
/// with part of its chains.
pub async fn ignite(ctx: &RelayerContext) -> Result<Router> {
    let mut router = Router::new();
    for config in ctx.solana_chains() {
        tracing::info!(
            chain = %config.name,
            chain_id = config.chain_id,
            "Starting proposal writer",
        );
        let writer = solana::proposal_writer(config).await?;
        router.register(Arc::new(writer));
    }
    if router.chains().next().is_none() {
        tracing::warn!("No destination chain is enabled, every message will be dropped");
    }
    Ok(router)
}

/// Parses a receiver given either as hex bytes or as a base58 address.
pub fn parse_receiver(value: &str) -> Result<Vec<u8>> {
    let hex_value = value.strip_prefix("0x").unwrap_or(value);
    if let Ok(bytes) = hex::decode(hex_value) {
        return Ok(bytes);
    }
    Pubkey::from_str(value)
        .map(|pubkey| pubkey.to_bytes().to_vec())
        .map_err(|_| {
            Error::InvalidMessage(format!(
                "receiver {value} is neither hex nor a base58 address"
            ))
        })
}

/// Builds the message given on the command line.
pub fn message_from_opts(opts: &RelayOpts) -> Result<Message> {
    Ok(Message::builder()
        .source(opts.source)
        .destination(opts.destination)
        .resource_id(opts.resource_id)
        .deposit_nonce(opts.nonce)
        .receiver(parse_receiver(&opts.receiver)?)
        .amount(opts.amount)
        .build())
}

/// What a listener did before it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenStats {
    /// Messages delivered to their destination.
    pub delivered: usize,
    /// Messages that must be retried.
    pub undelivered: usize,
    /// Lines that are not messages.
    pub invalid: usize,
}

/// Reads `input` line by line on a dedicated thread and forwards every line
/// through the returned channel.
///
/// The thread is detached and never joined, a read blocked on an open input
/// does not outlive the process. The channel closes at the end of the input
/// or on the first read error.
pub fn spawn_line_reader<R>(input: R) -> Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("input-reader".into())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read input");
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Routes every message received on `lines`, one JSON object per line,
/// until the channel closes or the shutdown signal is received.
///
/// Messages are relayed one after the other. The shutdown signal stops the
/// listener from reading new messages, it never interrupts the message
/// being relayed.
pub async fn listen(
    router: Router,
    mut lines: mpsc::Receiver<String>,
    mut shutdown: Shutdown,
) -> Result<ListenStats> {
    let mut stats = ListenStats::default();
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::warn!("Listener received the shutdown signal");
                break;
            }
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            tracing::debug!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, line = %line, "Skipping invalid message");
                stats.invalid += 1;
                continue;
            }
        };
        if router.send(&message).await {
            stats.delivered += 1;
        } else {
            tracing::warn!(%message, "Message not delivered");
            stats.undelivered += 1;
        }
    }
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        listener_stopped = true,
        delivered = stats.delivered,
        undelivered = stats.undelivered,
        invalid = stats.invalid,
    );
    Ok(stats)
}
