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
use std::path::PathBuf;
use std::time::Duration;

use bridge_relayer_types::message::{ChainId, ResourceId};
use bridge_relayer_types::passphrase::Passphrase;
use bridge_relayer_types::rpc_url::RpcUrl;
use bridge_relayer_utils::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// SolanaChainConfig is the configuration of one destination Solana cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SolanaChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    pub name: String,
    /// Boolean indicating this chain is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Bridge chain id of this cluster, messages whose destination is this id are routed here.
    pub chain_id: ChainId,
    /// RPC endpoints of the cluster, tried in order.
    #[serde(default)]
    pub endpoints: Vec<RpcUrl>,
    /// Block explorer, used to print clickable transaction links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer: Option<url::Url>,
    /// Directory holding the keystore vaults.
    pub keystore_path: PathBuf,
    /// File name of the vault, inside `keystore-path`, that holds the relayer keys.
    pub from: String,
    /// Passphrase of the vault, prefix with `$` to read it from the environment.
    ///
    /// Leave empty for plain vaults.
    #[serde(default, skip_serializing)]
    pub keystore_passphrase: Option<Passphrase>,
    /// Accounts of the bridge program on this cluster.
    pub pool_accounts: PoolAccountsConfig,
    /// Proposal account derivation and polling options.
    #[serde(default)]
    pub proposal: ProposalConfig,
    /// Maps resource ids to the token mint they are paid out in on this cluster.
    #[serde(default)]
    pub resources: HashMap<ResourceId, String>,
}

impl SolanaChainConfig {
    /// Full path of the vault holding the relayer keys.
    pub fn vault_path(&self) -> PathBuf {
        self.keystore_path.join(&self.from)
    }
}

/// Base58 encoded accounts the relayer needs on a destination cluster.
///
/// `fee-account` and `proposal-base-account` must have their keypairs in the
/// vault, the others are only referenced.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PoolAccountsConfig {
    /// Pays for and signs every transaction.
    #[serde(default)]
    pub fee_account: String,
    /// Base every proposal account address is derived from.
    #[serde(default)]
    pub proposal_base_account: String,
    /// The bridge account.
    #[serde(default)]
    pub bridge_account: String,
    /// Program derived authority of the bridge.
    #[serde(default, alias = "bridge-pda")]
    pub bridge_authority: String,
    /// The bridge program.
    #[serde(default)]
    pub bridge_program_id: String,
    /// Token program used to mint the transferred tokens.
    #[serde(default)]
    pub token_program_id: String,
}

/// How proposal accounts are named and how long the relayer waits on them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProposalConfig {
    /// Prefix of the seed proposal accounts are derived with.
    #[serde(default = "defaults::proposal_namespace")]
    pub namespace: String,
    /// How many times an account is polled before giving up.
    #[serde(default = "defaults::retry_limit")]
    pub retry_limit: usize,
    /// Milliseconds between two polls.
    #[serde(default = "defaults::wait_time")]
    pub wait_time: u64,
    /// Upper bound, in milliseconds, of the random delay added to each wait.
    #[serde(default = "defaults::jitter")]
    pub jitter: u64,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            namespace: defaults::proposal_namespace(),
            retry_limit: defaults::retry_limit(),
            wait_time: defaults::wait_time(),
            jitter: defaults::jitter(),
        }
    }
}

impl ProposalConfig {
    /// The polling policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, Duration::from_millis(self.wait_time))
            .with_jitter(Duration::from_millis(self.jitter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_defaults() {
        let cfg: ProposalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.namespace, "stafi");
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts(), 50);
        assert_eq!(policy.interval(), Duration::from_secs(5));
    }

    #[test]
    fn bridge_pda_alias() {
        let cfg: PoolAccountsConfig =
            serde_json::from_str(r#"{ "bridge-pda": "abc" }"#).unwrap();
        assert_eq!(cfg.bridge_authority, "abc");
        assert!(cfg.fee_account.is_empty());
    }
}
