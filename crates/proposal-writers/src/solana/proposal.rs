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

//! Proposal account derivation, layout and the bridge program instructions.

use borsh::{BorshDeserialize, BorshSerialize};
use bridge_relayer_types::message::{ChainId, DepositNonce, ResourceId};
use bridge_relayer_utils::{Error, Result};
use solana_sdk::hash::{hash, hashv};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::sysvar;

/// Space reserved for a mint proposal account.
pub const MINT_PROPOSAL_ACCOUNT_LEN: u64 = 1000;

const DISCRIMINATOR_LEN: usize = 8;

/// The seed of the proposal for deposit `nonce` of chain `source`.
pub fn proposal_seed(
    namespace: &str,
    source: ChainId,
    nonce: DepositNonce,
) -> String {
    format!("{namespace} mint proposal: {source}/{nonce}")
}

/// Derives the proposal account of deposit `nonce` of chain `source`.
///
/// Same scheme as `create_account_with_seed`: `sha256(base || seed || program_id)`.
///
/// The seed length is not checked here, every deposit has an address. The
/// system program only accepts seeds of up to
/// [`MAX_SEED_LEN`](solana_sdk::pubkey::MAX_SEED_LEN) bytes though, so a
/// proposal whose seed is longer can never be created. With the `stafi`
/// namespace and a one digit source chain that is every nonce from `10^9`.
pub fn derive_proposal_address(
    base: &Pubkey,
    program_id: &Pubkey,
    namespace: &str,
    source: ChainId,
    nonce: DepositNonce,
) -> (Pubkey, String) {
    let seed = proposal_seed(namespace, source, nonce);
    let digest =
        hashv(&[base.as_ref(), seed.as_bytes(), program_id.as_ref()]);
    (Pubkey::new_from_array(digest.to_bytes()), seed)
}

fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = hash(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest.to_bytes()[..DISCRIMINATOR_LEN]);
    out
}

/// A mint proposal as stored by the bridge program.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MintProposalAccount {
    /// The bridge the proposal belongs to.
    pub bridge: [u8; 32],
    /// Which bridge owner approved, by owner index.
    pub signers: Vec<bool>,
    /// Set once the quorum was reached and the tokens minted.
    pub did_execute: bool,
    /// Owner set the approvals were counted against.
    pub owner_set_seqno: u32,
    /// The mint the resource id maps to.
    pub mint: [u8; 32],
    /// The receiving token account.
    pub to: [u8; 32],
    /// Amount to mint.
    pub amount: u64,
    /// Token program minting the tokens.
    pub token_program: [u8; 32],
}

impl MintProposalAccount {
    /// Discriminator prefixing the account data.
    pub fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        discriminator("account", "MintProposalAccount")
    }

    /// Decodes the data of the proposal account at `address`.
    ///
    /// Bytes past the record are the unused part of the account.
    pub fn from_account_data(address: &Pubkey, data: &[u8]) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidProposalAccount {
            proposal: address.to_string(),
            reason,
        };
        let Some(body) = data.strip_prefix(&Self::discriminator()) else {
            return Err(invalid("unexpected account discriminator".into()));
        };
        let mut body = body;
        Self::deserialize(&mut body).map_err(|e| invalid(e.to_string()))
    }

    /// Encodes the record the way the bridge program stores it, padded
    /// to the account size.
    pub fn to_account_data(&self) -> Result<Vec<u8>> {
        let mut data = Self::discriminator().to_vec();
        self.serialize(&mut data)?;
        data.resize(data.len().max(MINT_PROPOSAL_ACCOUNT_LEN as usize), 0);
        Ok(data)
    }

    /// The bridge account.
    pub fn bridge(&self) -> Pubkey {
        Pubkey::new_from_array(self.bridge)
    }

    /// The mint.
    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    /// The receiving account.
    pub fn to(&self) -> Pubkey {
        Pubkey::new_from_array(self.to)
    }

    /// The token program.
    pub fn token_program(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_program)
    }
}

/// Arguments of the `create_mint_proposal` instruction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct CreateMintProposalArgs {
    /// The resource being minted.
    pub resource_id: [u8; 32],
    /// Amount to mint.
    pub amount: u64,
    /// Token program minting the tokens.
    pub token_program: [u8; 32],
}

/// Tags the bridge program instructions the relayer sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeInstruction {
    /// Creates a mint proposal, recording the deposit.
    CreateMintProposal,
    /// Votes for a mint proposal.
    ApproveMintProposal,
}

impl BridgeInstruction {
    /// The bridge program method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateMintProposal => "create_mint_proposal",
            Self::ApproveMintProposal => "approve_mint_proposal",
        }
    }

    /// The discriminator prefixing the instruction data.
    pub fn discriminator(&self) -> [u8; DISCRIMINATOR_LEN] {
        discriminator("global", self.name())
    }

    /// Recognizes the instruction from its data.
    pub fn from_data(data: &[u8]) -> Option<Self> {
        [Self::CreateMintProposal, Self::ApproveMintProposal]
            .into_iter()
            .find(|ix| data.starts_with(&ix.discriminator()))
    }
}

/// Builds the instruction initializing the proposal account.
#[allow(clippy::too_many_arguments)]
pub fn create_mint_proposal(
    program_id: &Pubkey,
    bridge: &Pubkey,
    proposal: &Pubkey,
    to: &Pubkey,
    proposer: &Pubkey,
    resource_id: ResourceId,
    amount: u64,
    token_program: &Pubkey,
) -> Result<Instruction> {
    let args = CreateMintProposalArgs {
        resource_id: *resource_id.as_bytes(),
        amount,
        token_program: token_program.to_bytes(),
    };
    let mut data = BridgeInstruction::CreateMintProposal.discriminator().to_vec();
    args.serialize(&mut data)?;
    Ok(Instruction::new_with_bytes(
        *program_id,
        &data,
        vec![
            AccountMeta::new_readonly(*bridge, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*to, false),
            AccountMeta::new_readonly(*proposer, true),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
    ))
}

/// Builds the instruction voting for the proposal.
#[allow(clippy::too_many_arguments)]
pub fn approve_mint_proposal(
    program_id: &Pubkey,
    bridge: &Pubkey,
    bridge_authority: &Pubkey,
    proposal: &Pubkey,
    approver: &Pubkey,
    mint: &Pubkey,
    to: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    Instruction::new_with_bytes(
        *program_id,
        &BridgeInstruction::ApproveMintProposal.discriminator(),
        vec![
            AccountMeta::new_readonly(*bridge, false),
            AccountMeta::new_readonly(*bridge_authority, false),
            AccountMeta::new(*proposal, false),
            AccountMeta::new_readonly(*approver, true),
            AccountMeta::new(*mint, false),
            AccountMeta::new(*to, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
    )
}
