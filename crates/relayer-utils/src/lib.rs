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
//! # Bridge Relayer Utils 🕸️
//!
//! Errors, retry policies and logging helpers shared by every crate of the relayer.

/// Block explorer links for submitted transactions.
pub mod explorer;
/// A module used for debugging relayer lifecycle, proposal progress, or other relayer state.
pub mod probe;
/// Retry functionality
pub mod retry;

/// An enum of all possible errors that could be encountered during the execution of the
/// Bridge Relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Error while decoding a hex string.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// Error from the Solana RPC client.
    #[error(transparent)]
    SolanaClient(#[from] solana_client::client_error::ClientError),
    /// Error while parsing a base58 public key.
    #[error(transparent)]
    ParsePubkey(#[from] solana_sdk::pubkey::ParsePubkeyError),
    /// Error while signing a transaction.
    #[error(transparent)]
    Signer(#[from] solana_sdk::signer::SignerError),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Chain not found in the config.
    #[error("Chain Not Found: {}", chain_id)]
    ChainNotFound {
        /// The chain id of the chain.
        chain_id: String,
    },
    /// A pool account role points to a key that is not in the keystore.
    #[error("Pool account `{}` ({}) is missing from the keystore", role, key)]
    MissingPoolAccount {
        /// The role of the account, like `fee-account`.
        role: &'static str,
        /// The configured public key.
        key: String,
    },
    /// A pool account role holds a value that is not a public key.
    #[error("Pool account `{}` has an invalid public key: {}", role, value)]
    InvalidPoolAccount {
        /// The role of the account, like `bridge-program-id`.
        role: &'static str,
        /// The configured value.
        value: String,
    },
    /// The keystore could not be opened.
    #[error("Failed to open keystore: {}", _0)]
    Decryption(String),
    /// None of the configured RPC endpoints answered.
    #[error("No reachable RPC endpoint for chain: {}", chain)]
    NoReachableEndpoint {
        /// The name of the chain.
        chain: String,
    },
    /// A polling loop gave up.
    #[error("{} reached the retry limit after {} attempts", what, attempts)]
    RetryLimitReached {
        /// What we were waiting for.
        what: &'static str,
        /// How many times the condition was checked.
        attempts: usize,
    },
    /// The on-chain proposal does not match the deposit we are relaying.
    #[error("Proposal {} content does not match the deposit", proposal)]
    ProposalContentMismatch {
        /// The proposal account address.
        proposal: String,
    },
    /// The proposal account data could not be decoded.
    #[error("Proposal {} holds invalid data: {}", proposal, reason)]
    InvalidProposalAccount {
        /// The proposal account address.
        proposal: String,
        /// Why decoding failed.
        reason: String,
    },
    /// The destination chain refused a transaction.
    #[error("Transaction rejected: {}", _0)]
    TransactionRejected(String),
    /// The message cannot be relayed to its destination as is.
    #[error("Invalid message: {}", _0)]
    InvalidMessage(String),
}

/// A type alias for the result for bridge relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;
