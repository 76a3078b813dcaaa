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

use bridge_relayer_types::message::{ChainId, Message};
use bridge_relayer_utils::explorer::display_tx;
use bridge_relayer_utils::retry::RetryPolicy;
use bridge_relayer_utils::{probe, Error, Result};
use derive_more::Display;

use crate::{MessageWriter, ProposalAddress, ProposalChain};

/// The states a proposal goes through while a message is relayed.
///
/// `Failed` is reachable from every state but `Executed`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalState {
    /// A message was received.
    #[display(fmt = "start")]
    Start,
    /// The proposal address is known.
    #[display(fmt = "address_derived")]
    AddressDerived,
    /// The proposal account exists on-chain.
    #[display(fmt = "account_ensured")]
    AccountEnsured,
    /// The on-chain proposal holds exactly the deposit.
    #[display(fmt = "content_verified")]
    ContentVerified,
    /// Our vote was sent.
    #[display(fmt = "approved")]
    Approved,
    /// The proposal executed.
    #[display(fmt = "executed")]
    Executed,
    /// The message was not relayed.
    #[display(fmt = "failed")]
    Failed,
}

/// Outcome of making sure the proposal account exists.
enum Ensured {
    Ready,
    AlreadyExecuted,
}

/// Runs the proposal protocol for every message sent to one destination chain.
///
/// A writer holds no state about the proposals it handled, relaying the same
/// message twice is safe: creation is skipped when the proposal exists and
/// the chain ignores a second vote of the same relayer.
#[derive(Debug)]
pub struct ProposalWriter<C> {
    chain: C,
    retry: RetryPolicy,
}

impl<C> ProposalWriter<C>
where
    C: ProposalChain,
{
    /// Creates a writer polling the chain with the given `retry` policy.
    pub fn new(chain: C, retry: RetryPolicy) -> Self {
        Self { chain, retry }
    }

    /// The chain this writer relays to.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    fn transition(&self, process: &str, state: ProposalState) {
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::ProposalWriter,
            chain_id = self.chain.chain_id(),
            process,
            state = %state,
        );
    }

    async fn relay(&self, process: &str, message: &Message) -> Result<()> {
        let proposal = self.chain.derive(message);
        tracing::debug!(
            process,
            proposal = %proposal.address,
            seed = %proposal.seed,
            "Derived proposal account",
        );
        self.transition(process, ProposalState::AddressDerived);

        let expected = self.chain.expected_content(message).map_err(|e| {
            tracing::error!(
                process,
                source = message.source(),
                destination = message.destination(),
                error = %e,
                "Message cannot be resolved on this chain",
            );
            e
        })?;

        match self
            .ensure_account(process, &proposal, message, &expected)
            .await?
        {
            Ensured::AlreadyExecuted => {
                self.transition(process, ProposalState::Executed);
                return Ok(());
            }
            Ensured::Ready => {
                self.transition(process, ProposalState::AccountEnsured)
            }
        }

        self.verify_content(process, &proposal.address, &expected)
            .await?;
        self.transition(process, ProposalState::ContentVerified);

        let tx = self
            .chain
            .approve(&proposal.address, &expected)
            .await
            .map_err(|e| {
                tracing::error!(
                    process,
                    proposal = %proposal.address,
                    error = %e,
                    "Failed to send approve proposal transaction",
                );
                e
            })?;
        tracing::info!(
            process,
            proposal = %proposal.address,
            tx = %display_tx(self.chain.explorer(), &tx),
            "Approve proposal transaction sent",
        );
        self.transition(process, ProposalState::Approved);

        self.wait_for_execution(process, &proposal.address).await?;
        tracing::info!(
            process,
            proposal = %proposal.address,
            "Proposal executed",
        );
        self.transition(process, ProposalState::Executed);
        Ok(())
    }

    /// Creates the proposal account unless it exists, then waits until it
    /// can be read back.
    async fn ensure_account(
        &self,
        process: &str,
        proposal: &ProposalAddress<C::Address>,
        message: &Message,
        expected: &C::Content,
    ) -> Result<Ensured> {
        let address = &proposal.address;
        if let Some(data) = self.chain.fetch(address).await? {
            let executed = self
                .chain
                .decode(address, &data)
                .map(|record| self.chain.is_executed(&record))
                .unwrap_or(false);
            if executed {
                tracing::info!(
                    process,
                    proposal = %address,
                    "Proposal already executed, nothing to do",
                );
                return Ok(Ensured::AlreadyExecuted);
            }
            tracing::debug!(
                process,
                proposal = %address,
                "Proposal account already exists",
            );
            return Ok(Ensured::Ready);
        }

        // a concurrent relayer may have created it meanwhile, a failed
        // create is not retried.
        let tx = self
            .chain
            .create(proposal, message, expected)
            .await
            .map_err(|e| {
                tracing::error!(
                    process,
                    proposal = %address,
                    error = %e,
                    "Failed to send create proposal transaction",
                );
                e
            })?;
        tracing::info!(
            process,
            proposal = %address,
            tx = %display_tx(self.chain.explorer(), &tx),
            "Create proposal account transaction sent",
        );

        let chain = &self.chain;
        self.retry
            .poll("proposal account creation", move |attempt| async move {
                match chain.fetch(address).await {
                    Ok(Some(_)) => true,
                    Ok(None) => {
                        tracing::warn!(
                            process,
                            proposal = %address,
                            attempt,
                            "Proposal account not created yet, waiting...",
                        );
                        false
                    }
                    Err(e) => {
                        tracing::warn!(
                            process,
                            proposal = %address,
                            attempt,
                            error = %e,
                            "Failed to fetch proposal account, waiting...",
                        );
                        false
                    }
                }
            })
            .await
            .map_err(|e| {
                tracing::error!(
                    process,
                    proposal = %address,
                    error = %e,
                    "Proposal account creation reached the retry limit",
                );
                e
            })?;
        Ok(Ensured::Ready)
    }

    /// Refuses any proposal that does not hold exactly the expected content.
    async fn verify_content(
        &self,
        process: &str,
        address: &C::Address,
        expected: &C::Content,
    ) -> Result<()> {
        let data = self.chain.fetch(address).await?.ok_or(Error::Generic(
            "proposal account disappeared before verification",
        ))?;
        let record = match self.chain.decode(address, &data) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    process,
                    proposal = %address,
                    data = %hex::encode(&data),
                    error = %e,
                    "Failed to decode proposal account, refusing to approve",
                );
                return Err(e);
            }
        };
        if !self.chain.matches(expected, &record) {
            tracing::error!(
                process,
                proposal = %address,
                ?record,
                ?expected,
                "Proposal account does not match the deposit, refusing to approve",
            );
            return Err(Error::ProposalContentMismatch {
                proposal: address.to_string(),
            });
        }
        tracing::debug!(process, proposal = %address, "Proposal content verified");
        Ok(())
    }

    /// Polls the proposal until the chain reports it executed.
    async fn wait_for_execution(
        &self,
        process: &str,
        address: &C::Address,
    ) -> Result<()> {
        let chain = &self.chain;
        self.retry
            .poll("proposal execution", move |attempt| async move {
                let executed = chain
                    .fetch(address)
                    .await
                    .and_then(|data| {
                        data.ok_or(Error::Generic("proposal account missing"))
                    })
                    .and_then(|data| chain.decode(address, &data))
                    .map(|record| chain.is_executed(&record));
                match executed {
                    Ok(true) => true,
                    Ok(false) => {
                        tracing::warn!(
                            process,
                            proposal = %address,
                            attempt,
                            "Proposal not executed yet, waiting...",
                        );
                        false
                    }
                    Err(e) => {
                        tracing::warn!(
                            process,
                            proposal = %address,
                            attempt,
                            error = %e,
                            "Failed to read proposal account, waiting...",
                        );
                        false
                    }
                }
            })
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(
                    process,
                    proposal = %address,
                    error = %e,
                    "Proposal execution reached the retry limit",
                );
                e
            })
    }
}

#[async_trait::async_trait]
impl<C> MessageWriter for ProposalWriter<C>
where
    C: ProposalChain,
{
    fn chain_id(&self) -> ChainId {
        self.chain.chain_id()
    }

    async fn execute(&self, message: &Message) -> bool {
        let process = format!(
            "{}:{}/{}",
            self.chain.name(),
            message.source(),
            message.deposit_nonce()
        );
        self.transition(&process, ProposalState::Start);
        match self.relay(&process, message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    process = %process,
                    error = %e,
                    "Message not delivered",
                );
                self.transition(&process, ProposalState::Failed);
                false
            }
        }
    }
}
