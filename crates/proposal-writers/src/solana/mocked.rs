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

//! An in-memory cluster running a minimal bridge program.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use borsh::BorshDeserialize;
use bridge_relayer_utils::{Error, Result};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;

use super::proposal::{
    BridgeInstruction, CreateMintProposalArgs, MintProposalAccount,
};
use super::rpc::SolanaRpc;

#[derive(Default)]
struct Ledger {
    accounts: HashMap<Pubkey, Vec<u8>>,
    approvals: HashMap<Pubkey, HashSet<Pubkey>>,
}

/// Executes a proposal once `threshold` distinct relayers approved it.
pub struct MockedSolanaRpc {
    threshold: usize,
    mints: HashMap<[u8; 32], Pubkey>,
    ledger: Mutex<Ledger>,
    fetches: AtomicUsize,
    creates: AtomicUsize,
    approves: AtomicUsize,
    sent: AtomicUsize,
    fail_blockhash: AtomicBool,
    drop_creates: AtomicBool,
    zero_rent: AtomicBool,
}

impl MockedSolanaRpc {
    pub fn new(threshold: usize, mints: HashMap<[u8; 32], Pubkey>) -> Self {
        Self {
            threshold,
            mints,
            ledger: Mutex::default(),
            fetches: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            approves: AtomicUsize::new(0),
            sent: AtomicUsize::new(0),
            fail_blockhash: AtomicBool::new(false),
            drop_creates: AtomicBool::new(false),
            zero_rent: AtomicBool::new(false),
        }
    }

    /// Stores `record` at `address`, as if created by another relayer.
    pub fn insert_proposal(&self, address: Pubkey, record: &MintProposalAccount) {
        let data = record.to_account_data().unwrap();
        self.ledger.lock().unwrap().accounts.insert(address, data);
    }

    pub fn proposal(&self, address: &Pubkey) -> Option<MintProposalAccount> {
        let ledger = self.ledger.lock().unwrap();
        ledger.accounts.get(address).map(|data| {
            MintProposalAccount::from_account_data(address, data).unwrap()
        })
    }

    pub fn fail_blockhash(&self, fail: bool) {
        self.fail_blockhash.store(fail, Ordering::SeqCst);
    }

    /// Accepts create transactions without ever creating the account.
    pub fn drop_creates(&self, drop: bool) {
        self.drop_creates.store(drop, Ordering::SeqCst);
    }

    /// Reports accounts as rent exempt for free.
    pub fn zero_rent(&self, zero: bool) {
        self.zero_rent.store(zero, Ordering::SeqCst);
    }

    /// Transactions received, accepted or not.
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn approves(&self) -> usize {
        self.approves.load(Ordering::SeqCst)
    }

    fn create(
        &self,
        ledger: &mut Ledger,
        accounts: &[Pubkey],
        data: &[u8],
    ) -> Result<()> {
        let proposal = accounts[1];
        if ledger.accounts.contains_key(&proposal) {
            return Err(Error::TransactionRejected(format!(
                "account {proposal} already in use"
            )));
        }
        let args = CreateMintProposalArgs::try_from_slice(&data[8..])?;
        let mint = self.mints.get(&args.resource_id).ok_or_else(|| {
            Error::TransactionRejected("unknown resource id".into())
        })?;
        let record = MintProposalAccount {
            bridge: accounts[0].to_bytes(),
            signers: vec![false; self.threshold],
            did_execute: false,
            owner_set_seqno: 0,
            mint: mint.to_bytes(),
            to: accounts[2].to_bytes(),
            amount: args.amount,
            token_program: args.token_program,
        };
        self.creates.fetch_add(1, Ordering::SeqCst);
        if !self.drop_creates.load(Ordering::SeqCst) {
            ledger
                .accounts
                .insert(proposal, record.to_account_data()?);
        }
        Ok(())
    }

    fn approve(&self, ledger: &mut Ledger, accounts: &[Pubkey]) -> Result<()> {
        let proposal = accounts[2];
        let approver = accounts[3];
        let data = ledger.accounts.get(&proposal).ok_or_else(|| {
            Error::TransactionRejected(format!("account {proposal} not found"))
        })?;
        let mut record = MintProposalAccount::from_account_data(&proposal, data)?;
        let approvals = ledger.approvals.entry(proposal).or_default();
        self.approves.fetch_add(1, Ordering::SeqCst);
        // a second vote of the same relayer is a no-op.
        if approvals.insert(approver) {
            if let Some(slot) = record.signers.get_mut(approvals.len() - 1) {
                *slot = true;
            }
            record.did_execute = approvals.len() >= self.threshold;
        }
        ledger.accounts.insert(proposal, record.to_account_data()?);
        Ok(())
    }
}

#[async_trait::async_trait]
impl SolanaRpc for MockedSolanaRpc {
    async fn get_account_data(
        &self,
        address: &Pubkey,
    ) -> Result<Option<Vec<u8>>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.ledger.lock().unwrap().accounts.get(address).cloned())
    }

    async fn get_latest_blockhash(&self) -> Result<Hash> {
        if self.fail_blockhash.load(Ordering::SeqCst) {
            return Err(Error::Generic("blockhash unavailable"));
        }
        Ok(Hash::new_unique())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64> {
        if self.zero_rent.load(Ordering::SeqCst) {
            return Ok(0);
        }
        Ok(6_960 * data_len as u64)
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        transaction
            .verify()
            .map_err(|e| Error::TransactionRejected(e.to_string()))?;
        let keys = &transaction.message.account_keys;
        let mut ledger = self.ledger.lock().unwrap();
        for ix in &transaction.message.instructions {
            let program = keys[ix.program_id_index as usize];
            if program == system_program::id() {
                continue;
            }
            let accounts = ix
                .accounts
                .iter()
                .map(|idx| keys[*idx as usize])
                .collect::<Vec<_>>();
            match BridgeInstruction::from_data(&ix.data) {
                Some(BridgeInstruction::CreateMintProposal) => {
                    self.create(&mut ledger, &accounts, &ix.data)?
                }
                Some(BridgeInstruction::ApproveMintProposal) => {
                    self.approve(&mut ledger, &accounts)?
                }
                None => {
                    return Err(Error::TransactionRejected(
                        "unknown instruction".into(),
                    ))
                }
            }
        }
        Ok(transaction.signatures[0])
    }
}
