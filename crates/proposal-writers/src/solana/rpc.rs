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

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_relayer_types::rpc_url::RpcUrl;
use bridge_relayer_utils::{Error, Result};
use solana_client::client_error::Result as ClientResult;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

/// The RPC calls the proposal writer makes against a cluster.
#[async_trait::async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Data of the account at `address`, `None` when it does not exist.
    async fn get_account_data(
        &self,
        address: &Pubkey,
    ) -> Result<Option<Vec<u8>>>;
    /// A recent blockhash to sign transactions with.
    async fn get_latest_blockhash(&self) -> Result<Hash>;
    /// Lamports an account of `data_len` bytes needs to be rent exempt.
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64>;
    /// Broadcasts a signed transaction.
    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature>;
}

/// Talks to a cluster through a list of endpoints.
///
/// Calls go to the last endpoint that answered; on failure the next
/// endpoints are tried in order, each at most once per call.
pub struct RpcPool {
    chain: String,
    endpoints: Vec<RpcUrl>,
    clients: Vec<Arc<RpcClient>>,
    current: AtomicUsize,
}

impl RpcPool {
    /// Creates the clients, without touching the network.
    pub fn new(chain: impl Into<String>, endpoints: &[RpcUrl]) -> Self {
        let clients = endpoints
            .iter()
            .map(|url| {
                Arc::new(RpcClient::new_with_commitment(
                    url.as_url().to_string(),
                    CommitmentConfig::confirmed(),
                ))
            })
            .collect();
        Self {
            chain: chain.into(),
            endpoints: endpoints.to_vec(),
            clients,
            current: AtomicUsize::new(0),
        }
    }

    /// Creates the clients and starts with the first endpoint that answers.
    pub async fn connect(
        chain: impl Into<String>,
        endpoints: &[RpcUrl],
    ) -> Result<Self> {
        let pool = Self::new(chain, endpoints);
        for (idx, client) in pool.clients.iter().enumerate() {
            match client.get_version().await {
                Ok(version) => {
                    tracing::info!(
                        chain = %pool.chain,
                        endpoint = %pool.endpoints[idx],
                        version = %version.solana_core,
                        "Connected to cluster",
                    );
                    pool.current.store(idx, Ordering::SeqCst);
                    return Ok(pool);
                }
                Err(e) => {
                    tracing::warn!(
                        chain = %pool.chain,
                        endpoint = %pool.endpoints[idx],
                        error = %e,
                        "Endpoint unreachable",
                    );
                }
            }
        }
        Err(Error::NoReachableEndpoint { chain: pool.chain })
    }

    async fn call<T, F, Fut>(&self, what: &'static str, f: F) -> Result<T>
    where
        F: Fn(Arc<RpcClient>) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let len = self.clients.len();
        let start = self.current.load(Ordering::SeqCst);
        let mut last_error = None;
        for offset in 0..len {
            let idx = (start + offset) % len;
            match f(self.clients[idx].clone()).await {
                Ok(v) => {
                    if offset != 0 {
                        self.current.store(idx, Ordering::SeqCst);
                    }
                    return Ok(v);
                }
                Err(e) => {
                    tracing::warn!(
                        chain = %self.chain,
                        endpoint = %self.endpoints[idx],
                        what,
                        error = %e,
                        "RPC call failed",
                    );
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e.into()),
            None => Err(Error::NoReachableEndpoint {
                chain: self.chain.clone(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl SolanaRpc for RpcPool {
    async fn get_account_data(
        &self,
        address: &Pubkey,
    ) -> Result<Option<Vec<u8>>> {
        let address = *address;
        self.call("get_account", move |client| async move {
            client
                .get_account_with_commitment(&address, client.commitment())
                .await
                .map(|response| response.value.map(|account| account.data))
        })
        .await
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.call("get_latest_blockhash", |client| async move {
            client.get_latest_blockhash().await
        })
        .await
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64> {
        self.call("get_minimum_balance_for_rent_exemption", move |client| {
            async move {
                client
                    .get_minimum_balance_for_rent_exemption(data_len)
                    .await
            }
        })
        .await
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature> {
        self.call("send_transaction", |client| {
            let transaction = transaction.clone();
            async move { client.send_transaction(&transaction).await }
        })
        .await
    }
}
