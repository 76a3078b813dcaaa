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

#![warn(missing_docs)]
//! # Proposal Writers 🕸️
//!
//! A module that completes cross-chain transfers on their destination chain.
//!
//! ## Overview
//!
//! Every destination chain runs the same protocol: derive the address of the
//! proposal for a deposit, create the proposal if no other relayer did,
//! check that what is recorded on-chain is exactly the deposit, vote for it
//! and wait until enough relayers voted for the proposal to execute.
//!
//! The protocol lives once in [`ProposalWriter`]; a destination chain only
//! supplies the [`ProposalChain`] capabilities. The [`Router`] hands every
//! message to the writer of its destination chain.

use std::fmt;

use bridge_relayer_types::message::{ChainId, Message};
use bridge_relayer_utils::Result;

/// Routes messages to the writer of their destination chain.
pub mod router;
/// Solana destination chains.
pub mod solana;
/// The proposal state machine.
pub mod writer;

pub use router::Router;
pub use writer::{ProposalState, ProposalWriter};

/// A proposal address together with the seed it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalAddress<A> {
    /// The proposal account address.
    pub address: A,
    /// The seed used to derive `address`.
    pub seed: String,
}

/// What a destination chain has to provide for [`ProposalWriter`] to run
/// the proposal protocol on it.
///
/// Every method re-reads the chain, no proposal state is cached between calls.
#[async_trait::async_trait]
pub trait ProposalChain: Send + Sync {
    /// Address of an account on this chain.
    type Address: fmt::Display + Send + Sync;
    /// The proposal content this relayer expects for a message.
    type Content: fmt::Debug + Send + Sync;
    /// A decoded on-chain proposal.
    type Record: fmt::Debug + Send + Sync;

    /// The bridge chain id of this chain.
    fn chain_id(&self) -> ChainId;
    /// Human readable name, used in logs.
    fn name(&self) -> &str;
    /// Block explorer of this chain, if any.
    fn explorer(&self) -> Option<&url::Url> {
        None
    }
    /// Derives the proposal address of the deposit carried by `message`.
    ///
    /// Must be a pure function of the source chain and the deposit nonce
    /// so that every relayer lands on the same account.
    fn derive(&self, message: &Message) -> ProposalAddress<Self::Address>;
    /// The proposal content `message` must produce on this chain.
    ///
    /// Fails when the message cannot be relayed to this chain at all.
    fn expected_content(&self, message: &Message) -> Result<Self::Content>;
    /// Fetches the raw proposal account, `None` when it does not exist.
    async fn fetch(&self, address: &Self::Address) -> Result<Option<Vec<u8>>>;
    /// Decodes a proposal account fetched with [`ProposalChain::fetch`].
    fn decode(
        &self,
        address: &Self::Address,
        data: &[u8],
    ) -> Result<Self::Record>;
    /// Whether `record` holds exactly the `expected` content.
    fn matches(&self, expected: &Self::Content, record: &Self::Record) -> bool;
    /// Whether the proposal reached its quorum and executed.
    fn is_executed(&self, record: &Self::Record) -> bool;
    /// Sends the transaction creating the proposal, returns its id.
    async fn create(
        &self,
        proposal: &ProposalAddress<Self::Address>,
        message: &Message,
        content: &Self::Content,
    ) -> Result<String>;
    /// Sends this relayer's vote for the proposal, returns the transaction id.
    async fn approve(
        &self,
        address: &Self::Address,
        content: &Self::Content,
    ) -> Result<String>;
}

/// Something that delivers messages to one destination chain.
#[async_trait::async_trait]
pub trait MessageWriter: Send + Sync {
    /// The destination chain this writer delivers to.
    fn chain_id(&self) -> ChainId;
    /// Relays `message`, returns `false` when it was not delivered and must
    /// be retried by the caller.
    async fn execute(&self, message: &Message) -> bool;
}
