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

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Identifies a chain inside the bridge.
pub type ChainId = u8;

/// Per source chain, monotonically increasing identifier of a deposit.
pub type DepositNonce = u64;

/// Opaque 32 bytes naming the asset being transferred.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub [u8; 32]);

impl ResourceId {
    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for ResourceId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ResourceId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({self})")
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e| {
            serde::de::Error::custom(format!(
                "{e}: expected 32 hex encoded bytes, got {s}"
            ))
        })
    }
}

/// A deposit observed on a source chain that must be completed on a destination chain.
///
/// Messages are immutable once built; the amount is already adjusted to the
/// decimals of the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    source: ChainId,
    destination: ChainId,
    resource_id: ResourceId,
    deposit_nonce: DepositNonce,
    /// Receiver address, in the destination chain native encoding.
    #[builder(setter(into))]
    #[serde(with = "hex::serde")]
    receiver: Vec<u8>,
    amount: u64,
}

impl Message {
    /// The chain the deposit happened on.
    pub fn source(&self) -> ChainId {
        self.source
    }

    /// The chain that must complete the transfer.
    pub fn destination(&self) -> ChainId {
        self.destination
    }

    /// The asset being transferred.
    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    /// The nonce of the deposit on the source chain.
    pub fn deposit_nonce(&self) -> DepositNonce {
        self.deposit_nonce
    }

    /// The receiver address bytes.
    pub fn receiver(&self) -> &[u8] {
        &self.receiver
    }

    /// The transferred amount.
    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} #{} ({} of {})",
            self.source,
            self.destination,
            self.deposit_nonce,
            self.amount,
            self.resource_id
        )
    }
}
