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

//! Solana destination chains.
//!
//! Proposals are accounts created with a seed off the proposal base account
//! and owned by the bridge program. Relayers vote with the
//! `approve_mint_proposal` instruction, the bridge program mints the tokens
//! once enough distinct relayers voted.

/// The [`ProposalChain`](crate::ProposalChain) implementation.
pub mod chain;
/// Connection to a cluster.
pub mod connection;
/// Byte level comparison of proposal contents.
pub mod content;
/// Signing keys and well-known accounts.
pub mod pool;
/// Proposal account derivation, layout and instructions.
pub mod proposal;
/// RPC calls made against a cluster.
pub mod rpc;

#[cfg(test)]
mod mocked;

pub use chain::SolanaProposalChain;
pub use connection::Connection;
pub use pool::PoolAccounts;

use bridge_relayer_config::solana::SolanaChainConfig;
use bridge_relayer_utils::Result;

use crate::ProposalWriter;

/// Connects to the cluster described by `config` and returns its writer.
pub async fn proposal_writer(
    config: &SolanaChainConfig,
) -> Result<ProposalWriter<SolanaProposalChain>> {
    let chain = SolanaProposalChain::connect(config).await?;
    Ok(ProposalWriter::new(chain, config.proposal.retry_policy()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use bridge_relayer_config::solana::{PoolAccountsConfig, ProposalConfig};
    use bridge_relayer_types::message::{Message, ResourceId};
    use bridge_relayer_utils::retry::RetryPolicy;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;

    use super::mocked::MockedSolanaRpc;
    use super::proposal::MintProposalAccount;
    use super::*;
    use crate::{MessageWriter, ProposalChain};

    const RESOURCE_ID: &str =
        "0x000000000000000000000000000000a9e0095b8965c01e6a09c97938f3860901";

    /// Accounts every relayer of the bridge shares.
    struct Bridge {
        base: Keypair,
        bridge: Pubkey,
        authority: Pubkey,
        program: Pubkey,
        token_program: Pubkey,
        mint: Pubkey,
        resource_id: ResourceId,
    }

    impl Bridge {
        fn new() -> Self {
            Self {
                base: Keypair::new(),
                bridge: Pubkey::new_unique(),
                authority: Pubkey::new_unique(),
                program: Pubkey::new_unique(),
                token_program: Pubkey::new_unique(),
                mint: Pubkey::new_unique(),
                resource_id: RESOURCE_ID.parse().unwrap(),
            }
        }

        fn cluster(&self, threshold: usize) -> Arc<MockedSolanaRpc> {
            let mints = HashMap::from([(*self.resource_id.as_bytes(), self.mint)]);
            Arc::new(MockedSolanaRpc::new(threshold, mints))
        }

        fn config(&self) -> SolanaChainConfig {
            SolanaChainConfig {
                name: "localnet".into(),
                enabled: true,
                chain_id: 3,
                endpoints: vec![],
                explorer: Some("https://explorer.solana.com/?cluster=custom".parse().unwrap()),
                keystore_path: "/dev/null".into(),
                from: "relayer.json".into(),
                keystore_passphrase: None,
                pool_accounts: PoolAccountsConfig::default(),
                proposal: ProposalConfig::default(),
                resources: HashMap::from([(self.resource_id, self.mint.to_string())]),
            }
        }

        fn relayer(
            &self,
            cluster: &Arc<MockedSolanaRpc>,
            fee: &Keypair,
            retry: RetryPolicy,
        ) -> ProposalWriter<SolanaProposalChain> {
            let pool = PoolAccounts::new(
                Keypair::from_bytes(&fee.to_bytes()).unwrap(),
                Keypair::from_bytes(&self.base.to_bytes()).unwrap(),
                self.bridge,
                self.authority,
                self.program,
                self.token_program,
            );
            let connection = Connection::with_rpc(pool, cluster.clone());
            let chain =
                SolanaProposalChain::with_connection(&self.config(), connection)
                    .unwrap();
            ProposalWriter::new(chain, retry)
        }

        fn expected_record(&self, receiver: &Pubkey) -> MintProposalAccount {
            MintProposalAccount {
                bridge: self.bridge.to_bytes(),
                signers: vec![false],
                did_execute: false,
                owner_set_seqno: 0,
                mint: self.mint.to_bytes(),
                to: receiver.to_bytes(),
                amount: 1_000_000,
                token_program: self.token_program.to_bytes(),
            }
        }
    }

    fn fast(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    fn message(bridge: &Bridge, receiver: &Pubkey) -> Message {
        Message::builder()
            .source(1)
            .destination(3)
            .resource_id(bridge.resource_id)
            .deposit_nonce(42)
            .receiver(receiver.to_bytes().to_vec())
            .amount(1_000_000)
            .build()
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn creates_verifies_approves_and_waits_for_execution() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(3));
        let receiver = Pubkey::new_unique();
        let msg = message(&bridge, &receiver);

        assert!(relayer.execute(&msg).await);

        let address = relayer.chain().derive(&msg).address;
        let record = cluster.proposal(&address).unwrap();
        assert!(record.did_execute);
        assert_eq!(record.amount, 1_000_000);
        assert_eq!(record.to(), receiver);
        assert_eq!(record.mint(), bridge.mint);
        assert_eq!(cluster.creates(), 1);
        assert_eq!(cluster.approves(), 1);
        assert!(logs_contain("Create proposal account transaction sent"));
        assert!(logs_contain("explorer.solana.com/tx/"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn relaying_again_skips_creation_and_approves_again() {
        let bridge = Bridge::new();
        // two votes needed, the second relayer only shows up at the end.
        let cluster = bridge.cluster(2);
        let first = bridge.relayer(&cluster, &Keypair::new(), fast(2));
        let second = bridge.relayer(&cluster, &Keypair::new(), fast(2));
        let receiver = Pubkey::new_unique();
        let msg = message(&bridge, &receiver);

        assert!(!first.execute(&msg).await);
        assert_eq!(cluster.creates(), 1);
        assert_eq!(cluster.approves(), 1);

        // the duplicate vote is accepted and not counted.
        assert!(!first.execute(&msg).await);
        assert_eq!(cluster.creates(), 1);
        assert_eq!(cluster.approves(), 2);
        let address = first.chain().derive(&msg).address;
        assert!(!cluster.proposal(&address).unwrap().did_execute);

        assert!(second.execute(&msg).await);
        assert_eq!(cluster.creates(), 1);
        assert_eq!(cluster.approves(), 3);
        assert!(cluster.proposal(&address).unwrap().did_execute);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn tampered_amount_is_never_approved() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(3));
        let receiver = Pubkey::new_unique();
        let msg = message(&bridge, &receiver);
        let address = relayer.chain().derive(&msg).address;
        let mut forged = bridge.expected_record(&receiver);
        forged.amount = 1_000_001;
        cluster.insert_proposal(address, &forged);

        assert!(!relayer.execute(&msg).await);
        assert_eq!(cluster.creates(), 0);
        assert_eq!(cluster.approves(), 0);
        assert!(logs_contain("does not match the deposit"));
        assert!(logs_contain("1000001"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn existing_account_is_not_created_again() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(3));
        let receiver = Pubkey::new_unique();
        let msg = message(&bridge, &receiver);
        let address = relayer.chain().derive(&msg).address;
        cluster.insert_proposal(address, &bridge.expected_record(&receiver));

        assert!(relayer.execute(&msg).await);
        assert_eq!(cluster.creates(), 0);
        assert_eq!(cluster.approves(), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn executed_proposal_is_left_alone() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(3));
        let receiver = Pubkey::new_unique();
        let msg = message(&bridge, &receiver);
        let address = relayer.chain().derive(&msg).address;
        let mut executed = bridge.expected_record(&receiver);
        executed.did_execute = true;
        cluster.insert_proposal(address, &executed);

        assert!(relayer.execute(&msg).await);
        assert_eq!(cluster.approves(), 0);
        assert_eq!(cluster.fetches(), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn execution_wait_gives_up_after_the_retry_limit() {
        let bridge = Bridge::new();
        // quorum is never reached.
        let cluster = bridge.cluster(2);
        let interval = Duration::from_millis(20);
        let relayer = bridge.relayer(
            &cluster,
            &Keypair::new(),
            RetryPolicy::new(3, interval),
        );
        let msg = message(&bridge, &Pubkey::new_unique());

        let started = Instant::now();
        assert!(!relayer.execute(&msg).await);
        let elapsed = started.elapsed();

        // existence check, creation poll, verification, then 3 execution polls.
        assert_eq!(cluster.fetches(), 3 + 3);
        assert_eq!(cluster.approves(), 1);
        assert!(elapsed >= interval * 2);
        assert!(elapsed < Duration::from_secs(5));
        assert!(logs_contain("Proposal execution reached the retry limit"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn creation_wait_gives_up_after_the_retry_limit() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        cluster.drop_creates(true);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(4));
        let msg = message(&bridge, &Pubkey::new_unique());

        assert!(!relayer.execute(&msg).await);
        assert_eq!(cluster.fetches(), 1 + 4);
        assert_eq!(cluster.approves(), 0);
        assert!(logs_contain("Proposal account creation reached the retry limit"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_create_is_not_retried() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        cluster.fail_blockhash(true);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(5));
        let msg = message(&bridge, &Pubkey::new_unique());

        assert!(!relayer.execute(&msg).await);
        assert_eq!(cluster.creates(), 0);
        assert_eq!(cluster.fetches(), 1);
        assert!(logs_contain("Failed to send create proposal transaction"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn zero_rent_exemption_sends_no_create() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        cluster.zero_rent(true);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(5));
        let msg = message(&bridge, &Pubkey::new_unique());

        assert!(!relayer.execute(&msg).await);
        assert_eq!(cluster.sent(), 0);
        assert_eq!(cluster.creates(), 0);
        assert_eq!(cluster.fetches(), 1);
        assert!(logs_contain("zero rent exemption balance"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn invalid_messages_are_rejected_before_touching_the_chain() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let relayer = bridge.relayer(&cluster, &Keypair::new(), fast(3));

        let short_receiver = Message::builder()
            .source(1)
            .destination(3)
            .resource_id(bridge.resource_id)
            .deposit_nonce(42)
            .receiver(vec![7u8; 20])
            .amount(1)
            .build();
        assert!(!relayer.execute(&short_receiver).await);

        let unknown_resource = Message::builder()
            .source(1)
            .destination(3)
            .resource_id(ResourceId::from([1; 32]))
            .deposit_nonce(43)
            .receiver(Pubkey::new_unique().to_bytes().to_vec())
            .amount(1)
            .build();
        assert!(!relayer.execute(&unknown_resource).await);
        assert_eq!(cluster.fetches(), 0);
        assert!(logs_contain("no mint configured for resource"));
    }

    #[test]
    fn relayers_agree_on_the_proposal_address() {
        let bridge = Bridge::new();
        let cluster = bridge.cluster(1);
        let a = bridge.relayer(&cluster, &Keypair::new(), fast(1));
        let b = bridge.relayer(&cluster, &Keypair::new(), fast(1));
        let msg = message(&bridge, &Pubkey::new_unique());
        assert_eq!(a.chain().derive(&msg), b.chain().derive(&msg));
        assert_eq!(a.chain().derive(&msg).seed, "stafi mint proposal: 1/42");
    }
}
