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

use bridge_relayer_config::solana::SolanaChainConfig;
use bridge_relayer_types::message::{ChainId, Message, ResourceId};
use bridge_relayer_utils::{Error, Result};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;

use super::connection::Connection;
use super::content::{self, ProposalContent};
use super::pool::parse_pubkey;
use super::proposal::{
    self, MintProposalAccount, MINT_PROPOSAL_ACCOUNT_LEN,
};
use crate::{ProposalAddress, ProposalChain};

/// A Solana cluster running the bridge program.
pub struct SolanaProposalChain {
    chain_id: ChainId,
    name: String,
    namespace: String,
    explorer: Option<url::Url>,
    mints: HashMap<ResourceId, Pubkey>,
    connection: Connection,
}

impl SolanaProposalChain {
    /// Connects to the cluster described by `config`.
    pub async fn connect(config: &SolanaChainConfig) -> Result<Self> {
        let connection = Connection::new(config).await?;
        Self::with_connection(config, connection)
    }

    /// Uses an established connection.
    pub fn with_connection(
        config: &SolanaChainConfig,
        connection: Connection,
    ) -> Result<Self> {
        let mints = config
            .resources
            .iter()
            .map(|(resource_id, mint)| {
                parse_pubkey("resources", mint).map(|mint| (*resource_id, mint))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            chain_id: config.chain_id,
            name: config.name.clone(),
            namespace: config.proposal.namespace.clone(),
            explorer: config.explorer.clone(),
            mints,
            connection,
        })
    }

    async fn sign_and_send(
        &self,
        instructions: &[solana_sdk::instruction::Instruction],
        signers: &[&solana_sdk::signature::Keypair],
    ) -> Result<String> {
        let rpc = self.connection.query_client();
        let blockhash = rpc.get_latest_blockhash().await?;
        let fee_payer = self.connection.pool().fee_account().pubkey();
        let mut tx = Transaction::new_with_payer(instructions, Some(&fee_payer));
        tx.try_sign(signers, blockhash)?;
        let signature = rpc.send_transaction(&tx).await?;
        Ok(signature.to_string())
    }
}

#[async_trait::async_trait]
impl ProposalChain for SolanaProposalChain {
    type Address = Pubkey;
    type Content = ProposalContent;
    type Record = MintProposalAccount;

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn explorer(&self) -> Option<&url::Url> {
        self.explorer.as_ref()
    }

    fn derive(&self, message: &Message) -> ProposalAddress<Pubkey> {
        let pool = self.connection.pool();
        let (address, seed) = proposal::derive_proposal_address(
            &pool.proposal_base_account().pubkey(),
            &pool.bridge_program_id,
            &self.namespace,
            message.source(),
            message.deposit_nonce(),
        );
        ProposalAddress { address, seed }
    }

    fn expected_content(&self, message: &Message) -> Result<ProposalContent> {
        let to = <[u8; 32]>::try_from(message.receiver())
            .map(Pubkey::new_from_array)
            .map_err(|_| {
                Error::InvalidMessage(format!(
                    "receiver is {} bytes, expected a 32 bytes address",
                    message.receiver().len()
                ))
            })?;
        let mint = self
            .mints
            .get(&message.resource_id())
            .copied()
            .ok_or_else(|| {
                Error::InvalidMessage(format!(
                    "no mint configured for resource {}",
                    message.resource_id()
                ))
            })?;
        let pool = self.connection.pool();
        Ok(ProposalContent {
            bridge: pool.bridge_account,
            mint,
            to,
            amount: message.amount(),
            token_program: pool.token_program_id,
        })
    }

    async fn fetch(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.connection.query_client().get_account_data(address).await
    }

    fn decode(
        &self,
        address: &Pubkey,
        data: &[u8],
    ) -> Result<MintProposalAccount> {
        MintProposalAccount::from_account_data(address, data)
    }

    fn matches(
        &self,
        expected: &ProposalContent,
        record: &MintProposalAccount,
    ) -> bool {
        content::equal(expected, record)
    }

    fn is_executed(&self, record: &MintProposalAccount) -> bool {
        record.did_execute
    }

    async fn create(
        &self,
        proposal: &ProposalAddress<Pubkey>,
        message: &Message,
        content: &ProposalContent,
    ) -> Result<String> {
        let pool = self.connection.pool();
        let lamports = self
            .connection
            .query_client()
            .get_minimum_balance_for_rent_exemption(
                MINT_PROPOSAL_ACCOUNT_LEN as usize,
            )
            .await?;
        if lamports == 0 {
            return Err(Error::Generic(
                "cluster reported a zero rent exemption balance",
            ));
        }
        let fee_account = pool.fee_account();
        let base_account = pool.proposal_base_account();
        let instructions = [
            system_instruction::create_account_with_seed(
                &fee_account.pubkey(),
                &proposal.address,
                &base_account.pubkey(),
                &proposal.seed,
                lamports,
                MINT_PROPOSAL_ACCOUNT_LEN,
                &pool.bridge_program_id,
            ),
            proposal::create_mint_proposal(
                &pool.bridge_program_id,
                &pool.bridge_account,
                &proposal.address,
                &content.to,
                &fee_account.pubkey(),
                message.resource_id(),
                content.amount,
                &content.token_program,
            )?,
        ];
        self.sign_and_send(&instructions, &[fee_account, base_account])
            .await
    }

    async fn approve(
        &self,
        address: &Pubkey,
        content: &ProposalContent,
    ) -> Result<String> {
        let pool = self.connection.pool();
        let fee_account = pool.fee_account();
        let instruction = proposal::approve_mint_proposal(
            &pool.bridge_program_id,
            &pool.bridge_account,
            &pool.bridge_authority,
            address,
            &fee_account.pubkey(),
            &content.mint,
            &content.to,
            &content.token_program,
        );
        self.sign_and_send(&[instruction], &[fee_account]).await
    }
}
