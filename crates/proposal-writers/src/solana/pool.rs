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

use std::str::FromStr;

use bridge_relayer_config::solana::PoolAccountsConfig;
use bridge_relayer_keystore::KeyBag;
use bridge_relayer_utils::{Error, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

/// The keys and well-known accounts a relayer acts with on a cluster.
///
/// Loaded once when connecting, read-only afterwards.
pub struct PoolAccounts {
    fee_account: Keypair,
    proposal_base_account: Keypair,
    /// The bridge account.
    pub bridge_account: Pubkey,
    /// Program derived authority of the bridge.
    pub bridge_authority: Pubkey,
    /// The bridge program.
    pub bridge_program_id: Pubkey,
    /// The token program.
    pub token_program_id: Pubkey,
}

impl std::fmt::Debug for PoolAccounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAccounts")
            .field("fee_account", &self.fee_account.pubkey())
            .field("proposal_base_account", &self.proposal_base_account.pubkey())
            .field("bridge_account", &self.bridge_account)
            .field("bridge_authority", &self.bridge_authority)
            .field("bridge_program_id", &self.bridge_program_id)
            .field("token_program_id", &self.token_program_id)
            .finish()
    }
}

impl PoolAccounts {
    /// Groups the accounts.
    pub fn new(
        fee_account: Keypair,
        proposal_base_account: Keypair,
        bridge_account: Pubkey,
        bridge_authority: Pubkey,
        bridge_program_id: Pubkey,
        token_program_id: Pubkey,
    ) -> Self {
        Self {
            fee_account,
            proposal_base_account,
            bridge_account,
            bridge_authority,
            bridge_program_id,
            token_program_id,
        }
    }

    /// Resolves the configured accounts, taking the signing ones from `keys`.
    pub fn from_config(
        config: &PoolAccountsConfig,
        keys: &KeyBag,
    ) -> Result<Self> {
        Ok(Self::new(
            signer("fee-account", &config.fee_account, keys)?,
            signer(
                "proposal-base-account",
                &config.proposal_base_account,
                keys,
            )?,
            parse_pubkey("bridge-account", &config.bridge_account)?,
            parse_pubkey("bridge-authority", &config.bridge_authority)?,
            parse_pubkey("bridge-program-id", &config.bridge_program_id)?,
            parse_pubkey("token-program-id", &config.token_program_id)?,
        ))
    }

    /// Pays for and signs every transaction of this relayer.
    pub fn fee_account(&self) -> &Keypair {
        &self.fee_account
    }

    /// Base of every proposal account address.
    pub fn proposal_base_account(&self) -> &Keypair {
        &self.proposal_base_account
    }
}

/// Parses the public key configured for `role`.
pub(crate) fn parse_pubkey(role: &'static str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).map_err(|_| Error::InvalidPoolAccount {
        role,
        value: value.to_string(),
    })
}

fn signer(role: &'static str, value: &str, keys: &KeyBag) -> Result<Keypair> {
    let pubkey = parse_pubkey(role, value)?;
    keys.keypair(&pubkey).ok_or_else(|| Error::MissingPoolAccount {
        role,
        key: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_relayer_keystore::Vault;

    fn config(fee: &Keypair, base: &Keypair) -> PoolAccountsConfig {
        PoolAccountsConfig {
            fee_account: fee.pubkey().to_string(),
            proposal_base_account: base.pubkey().to_string(),
            bridge_account: Pubkey::new_unique().to_string(),
            bridge_authority: Pubkey::new_unique().to_string(),
            bridge_program_id: Pubkey::new_unique().to_string(),
            token_program_id: Pubkey::new_unique().to_string(),
        }
    }

    #[test]
    fn resolves_signers_from_the_keystore() {
        let fee = Keypair::new();
        let base = Keypair::new();
        let keys = Vault::create(&[&fee, &base], None)
            .unwrap()
            .open(None)
            .unwrap();
        let pool = PoolAccounts::from_config(&config(&fee, &base), &keys).unwrap();
        assert_eq!(pool.fee_account().pubkey(), fee.pubkey());
        assert_eq!(pool.proposal_base_account().pubkey(), base.pubkey());
    }

    #[test]
    fn missing_signer() {
        let fee = Keypair::new();
        let base = Keypair::new();
        let keys = Vault::create(&[&fee], None).unwrap().open(None).unwrap();
        let err = PoolAccounts::from_config(&config(&fee, &base), &keys)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingPoolAccount {
                role: "proposal-base-account",
                ..
            }
        ));
    }

    #[test]
    fn invalid_public_key() {
        let fee = Keypair::new();
        let base = Keypair::new();
        let keys = Vault::create(&[&fee, &base], None)
            .unwrap()
            .open(None)
            .unwrap();
        let mut cfg = config(&fee, &base);
        cfg.bridge_program_id = "not a key".into();
        let err = PoolAccounts::from_config(&cfg, &keys).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPoolAccount {
                role: "bridge-program-id",
                ..
            }
        ));
    }
}
