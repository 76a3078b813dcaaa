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

use borsh::BorshSerialize;
use solana_sdk::pubkey::Pubkey;

use super::proposal::MintProposalAccount;

/// The proposal content a relayer expects for a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalContent {
    /// The bridge account.
    pub bridge: Pubkey,
    /// The mint the resource id maps to.
    pub mint: Pubkey,
    /// The receiving account.
    pub to: Pubkey,
    /// Amount to mint.
    pub amount: u64,
    /// The token program.
    pub token_program: Pubkey,
}

/// Serializes both sides on their own and compares the bytes.
///
/// A side that cannot be serialized never matches.
fn same_encoding<A, B>(field: &'static str, expected: &A, onchain: &B) -> bool
where
    A: BorshSerialize + ?Sized,
    B: BorshSerialize + ?Sized,
{
    match (borsh::to_vec(expected), borsh::to_vec(onchain)) {
        (Ok(expected), Ok(onchain)) => expected == onchain,
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(field, error = %e, "Failed to serialize proposal field");
            false
        }
    }
}

/// The fields of `onchain` that differ from `expected`.
pub fn mismatches(
    expected: &ProposalContent,
    onchain: &MintProposalAccount,
) -> Vec<&'static str> {
    let checks = [
        (
            "bridge",
            same_encoding("bridge", &expected.bridge.to_bytes(), &onchain.bridge),
        ),
        (
            "mint",
            same_encoding("mint", &expected.mint.to_bytes(), &onchain.mint),
        ),
        ("to", same_encoding("to", &expected.to.to_bytes(), &onchain.to)),
        (
            "amount",
            same_encoding("amount", &expected.amount, &onchain.amount),
        ),
        (
            "token_program",
            same_encoding(
                "token_program",
                &expected.token_program.to_bytes(),
                &onchain.token_program,
            ),
        ),
    ];
    checks
        .into_iter()
        .filter_map(|(field, same)| (!same).then_some(field))
        .collect()
}

/// Whether the on-chain proposal holds exactly the expected content.
///
/// Only the recorded transfer is compared, approvals and the execution
/// flag are not.
pub fn equal(expected: &ProposalContent, onchain: &MintProposalAccount) -> bool {
    let differing = mismatches(expected, onchain);
    if !differing.is_empty() {
        tracing::debug!(fields = ?differing, "Proposal content differs");
    }
    differing.is_empty()
}
