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

use std::collections::HashMap;
use std::sync::Arc;

use bridge_relayer_types::message::{ChainId, Message};
use bridge_relayer_utils::probe;

use crate::MessageWriter;

/// Dispatches messages to the writer of their destination chain.
#[derive(Default, Clone)]
pub struct Router {
    writers: HashMap<ChainId, Arc<dyn MessageWriter>>,
}

impl Router {
    /// Creates a router without any writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the writer of a destination chain, replacing any writer
    /// previously registered for the same chain.
    pub fn register(&mut self, writer: Arc<dyn MessageWriter>) {
        let chain_id = writer.chain_id();
        if self.writers.insert(chain_id, writer).is_some() {
            tracing::warn!(chain_id, "Replaced the writer of chain");
        }
    }

    /// The destination chains messages can be routed to.
    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.writers.keys().copied()
    }

    /// Sends `message` to the writer of its destination chain.
    ///
    /// Returns `false` when the message has to be retried later, either
    /// because no writer handles its destination or because the writer
    /// did not deliver it.
    pub async fn send(&self, message: &Message) -> bool {
        let Some(writer) = self.writers.get(&message.destination()) else {
            tracing::warn!(
                destination = message.destination(),
                %message,
                "No writer for the destination chain, dropping message",
            );
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Router,
                destination = message.destination(),
                nonce = message.deposit_nonce(),
                delivered = false,
            );
            return false;
        };
        tracing::debug!(%message, "Routing message");
        let delivered = writer.execute(message).await;
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Router,
            source = message.source(),
            destination = message.destination(),
            nonce = message.deposit_nonce(),
            delivered,
        );
        delivered
    }
}
