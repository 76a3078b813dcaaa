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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use tokio::sync::broadcast;

use bridge_relayer_config::solana::SolanaChainConfig;
use bridge_relayer_config::RelayerConfig;
use bridge_relayer_types::message::ChainId;

/// RelayerContext contains Relayer's configuration and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: RelayerConfig,
    /// Broadcasts a shutdown signal to all active listeners.
    ///
    /// When a graceful shutdown is initiated, a `()` value is sent via
    /// the broadcast::Sender. Listeners stop taking new messages, proposals
    /// already being relayed are left to finish.
    notify_shutdown: broadcast::Sender<()>,
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    pub fn new(config: RelayerConfig) -> Self {
        let (notify_shutdown, _) = broadcast::channel(2);
        Self {
            config,
            notify_shutdown,
        }
    }
    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }
    /// Sends a shutdown signal to all subscribed tasks.
    pub fn shutdown(&self) {
        tracing::debug!("Broadcasting shutdown signal");
        let _ = self.notify_shutdown.send(());
    }
    /// Returns the configuration of the Solana chain with the given id.
    pub fn solana_chain(
        &self,
        chain_id: ChainId,
    ) -> bridge_relayer_utils::Result<&SolanaChainConfig> {
        self.config.solana_chain(chain_id)
    }
    /// Iterates over the configuration of every enabled Solana chain.
    pub fn solana_chains(&self) -> impl Iterator<Item = &SolanaChainConfig> {
        self.config.solana.values()
    }
}

/// Listens for the relayer shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the
/// listener should stop.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent.
        let _ = self.notify.recv().await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn every_subscriber_sees_the_shutdown() {
        let ctx = RelayerContext::new(RelayerConfig::default());
        let mut a = ctx.shutdown_signal();
        let mut b = ctx.shutdown_signal();
        assert!(!a.is_shutdown());
        ctx.shutdown();
        a.recv().await;
        b.recv().await;
        assert!(a.is_shutdown() && b.is_shutdown());
        // a second wait returns at once.
        a.recv().await;
    }

    #[test]
    fn unknown_chain() {
        let ctx = RelayerContext::new(RelayerConfig::default());
        assert!(matches!(
            ctx.solana_chain(7),
            Err(bridge_relayer_utils::Error::ChainNotFound { .. })
        ));
    }
}
