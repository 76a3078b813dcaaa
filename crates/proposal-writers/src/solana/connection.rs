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

use std::sync::Arc;

use bridge_relayer_config::solana::SolanaChainConfig;
use bridge_relayer_keystore::Vault;
use bridge_relayer_utils::Result;
use solana_sdk::signer::Signer;

use super::pool::PoolAccounts;
use super::rpc::{RpcPool, SolanaRpc};

/// A connection to a destination cluster, with the accounts the relayer
/// acts with on it.
pub struct Connection {
    pool: PoolAccounts,
    rpc: Arc<dyn SolanaRpc>,
}

impl Connection {
    /// Opens the keystore, resolves the pool accounts and connects to the
    /// first reachable endpoint of the cluster.
    pub async fn new(config: &SolanaChainConfig) -> Result<Self> {
        let path = config.vault_path();
        tracing::debug!(
            chain = %config.name,
            path = %path.display(),
            "Opening keystore",
        );
        let keys = Vault::from_file(&path)?
            .open(config.keystore_passphrase.as_ref())?;
        let pool = PoolAccounts::from_config(&config.pool_accounts, &keys)?;
        tracing::info!(
            chain = %config.name,
            fee_account = %pool.fee_account().pubkey(),
            proposal_base_account = %pool.proposal_base_account().pubkey(),
            "Pool accounts loaded",
        );
        let rpc = RpcPool::connect(&config.name, &config.endpoints).await?;
        Ok(Self::with_rpc(pool, Arc::new(rpc)))
    }

    /// Uses an already set up RPC client.
    pub fn with_rpc(pool: PoolAccounts, rpc: Arc<dyn SolanaRpc>) -> Self {
        Self { pool, rpc }
    }

    /// The accounts this relayer acts with.
    pub fn pool(&self) -> &PoolAccounts {
        &self.pool
    }

    /// The client used to query and write to the cluster.
    pub fn query_client(&self) -> &dyn SolanaRpc {
        self.rpc.as_ref()
    }
}
