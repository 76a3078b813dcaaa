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
//! # Relayer Keystore 🔑
//!
//! Wallet files holding the keys a relayer signs with on a destination chain.
//!
//! A wallet file is a small JSON document wrapping a bag of ed25519 keypairs.
//! With the `passphrase` wrap the bag is sealed with AES-256-GCM under a key
//! derived from the passphrase with PBKDF2-HMAC-SHA256; the `plain` wrap is
//! only meant for local test networks.

use std::collections::HashMap;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use bridge_relayer_types::passphrase::Passphrase;
use bridge_relayer_utils::Error;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 16;
/// PBKDF2 rounds used for newly created wallets.
pub const DEFAULT_ITERATIONS: u32 = 100_000;
const VAULT_VERSION: u32 = 1;

/// How the key bag inside a wallet file is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretBoxWrap {
    /// AES-256-GCM with a PBKDF2 derived key.
    Passphrase,
    /// Not protected at all.
    Plain,
}

/// The on-disk wallet file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vault {
    version: u32,
    #[serde(default)]
    comment: String,
    secret_box_wrap: SecretBoxWrap,
    #[serde(default, with = "hex::serde")]
    salt: Vec<u8>,
    #[serde(default, with = "hex::serde")]
    nonce: Vec<u8>,
    #[serde(default)]
    iterations: u32,
    #[serde(with = "hex::serde")]
    secret_box: Vec<u8>,
}

/// The plaintext payload of a wallet.
#[derive(Serialize, Deserialize)]
struct RawKeyBag {
    keys: Vec<String>,
}

/// The decrypted keys of a wallet, indexed by public key.
pub struct KeyBag {
    keys: HashMap<Pubkey, Keypair>,
}

impl std::fmt::Debug for KeyBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBag")
            .field("public_keys", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl KeyBag {
    /// Returns a copy of the keypair for `pubkey`, if the wallet holds it.
    pub fn keypair(&self, pubkey: &Pubkey) -> Option<Keypair> {
        self.keys
            .get(pubkey)
            .and_then(|k| Keypair::from_bytes(&k.to_bytes()).ok())
    }

    /// Whether the wallet holds the key for `pubkey`.
    pub fn contains(&self, pubkey: &Pubkey) -> bool {
        self.keys.contains_key(pubkey)
    }

    /// Number of keys in the wallet.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the wallet is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Vault {
    /// Seals `keys` into a new wallet.
    ///
    /// With `None` as passphrase the keys are stored in plain text.
    pub fn create(
        keys: &[&Keypair],
        passphrase: Option<&Passphrase>,
    ) -> bridge_relayer_utils::Result<Self> {
        let raw = RawKeyBag {
            keys: keys.iter().map(|k| hex::encode(k.to_bytes())).collect(),
        };
        let plaintext = serde_json::to_vec(&raw)?;
        let Some(passphrase) = passphrase else {
            return Ok(Self {
                version: VAULT_VERSION,
                comment: String::new(),
                secret_box_wrap: SecretBoxWrap::Plain,
                salt: Vec::new(),
                nonce: Vec::new(),
                iterations: 0,
                secret_box: plaintext,
            });
        };
        let mut salt = vec![0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let mut nonce = vec![0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        let cipher = cipher(passphrase, &salt, DEFAULT_ITERATIONS)?;
        let secret_box = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|e| Error::Decryption(format!("sealing failed: {e}")))?;
        Ok(Self {
            version: VAULT_VERSION,
            comment: String::new(),
            secret_box_wrap: SecretBoxWrap::Passphrase,
            salt,
            nonce,
            iterations: DEFAULT_ITERATIONS,
            secret_box,
        })
    }

    /// Attaches a human readable comment to the wallet.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Reads a wallet file.
    pub fn from_file(
        path: impl AsRef<Path>,
    ) -> bridge_relayer_utils::Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Reading wallet file");
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Decryption(format!("reading {}: {e}", path.display()))
        })?;
        let vault: Self = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Decryption(format!("parsing {}: {e}", path.display()))
        })?;
        if vault.version != VAULT_VERSION {
            return Err(Error::Decryption(format!(
                "unsupported wallet version {}",
                vault.version
            )));
        }
        Ok(vault)
    }

    /// Writes the wallet file.
    pub fn write_to_file(
        &self,
        path: impl AsRef<Path>,
    ) -> bridge_relayer_utils::Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// The protection of this wallet.
    pub fn secret_box_wrap(&self) -> SecretBoxWrap {
        self.secret_box_wrap
    }

    /// Opens the wallet and returns its keys.
    pub fn open(
        &self,
        passphrase: Option<&Passphrase>,
    ) -> bridge_relayer_utils::Result<KeyBag> {
        let plaintext = match self.secret_box_wrap {
            SecretBoxWrap::Plain => self.secret_box.clone(),
            SecretBoxWrap::Passphrase => {
                let passphrase = passphrase.ok_or_else(|| {
                    Error::Decryption(
                        "wallet is sealed but no passphrase was given".into(),
                    )
                })?;
                if self.nonce.len() != NONCE_SIZE {
                    return Err(Error::Decryption(format!(
                        "invalid nonce length {}",
                        self.nonce.len()
                    )));
                }
                let cipher = cipher(passphrase, &self.salt, self.iterations)?;
                cipher
                    .decrypt(
                        Nonce::from_slice(&self.nonce),
                        self.secret_box.as_slice(),
                    )
                    .map_err(|_| {
                        Error::Decryption(
                            "wrong passphrase or corrupted wallet".into(),
                        )
                    })?
            }
        };
        let raw: RawKeyBag = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::Decryption(format!("invalid key bag: {e}")))?;
        let mut keys = HashMap::with_capacity(raw.keys.len());
        for encoded in raw.keys {
            let bytes = hex::decode(encoded.trim_start_matches("0x"))
                .map_err(|e| Error::Decryption(format!("invalid key: {e}")))?;
            let keypair = Keypair::from_bytes(&bytes)
                .map_err(|e| Error::Decryption(format!("invalid key: {e}")))?;
            keys.insert(keypair.pubkey(), keypair);
        }
        tracing::debug!(keys = keys.len(), "Wallet opened");
        Ok(KeyBag { keys })
    }
}

fn cipher(
    passphrase: &Passphrase,
    salt: &[u8],
    iterations: u32,
) -> bridge_relayer_utils::Result<Aes256Gcm> {
    if iterations == 0 {
        return Err(Error::Decryption("zero key derivation rounds".into()));
    }
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passphrase.expose(), salt, iterations, &mut key);
    Aes256Gcm::new_from_slice(&key)
        .map_err(|e| Error::Decryption(format!("cipher init failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_wallet_round_trips_through_a_file() {
        let fee = Keypair::new();
        let base = Keypair::new();
        let passphrase = Passphrase::new("correct horse battery staple");
        let vault = Vault::create(&[&fee, &base], Some(&passphrase))
            .unwrap()
            .with_comment("relayer");
        assert_eq!(vault.secret_box_wrap(), SecretBoxWrap::Passphrase);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayer.json");
        vault.write_to_file(&path).unwrap();

        let bag = Vault::from_file(&path).unwrap().open(Some(&passphrase)).unwrap();
        assert_eq!(bag.len(), 2);
        assert!(bag.contains(&fee.pubkey()));
        let restored = bag.keypair(&base.pubkey()).unwrap();
        assert_eq!(restored.to_bytes(), base.to_bytes());
    }

    #[test]
    fn wrong_passphrase_is_a_decryption_error() {
        let key = Keypair::new();
        let vault =
            Vault::create(&[&key], Some(&Passphrase::new("right"))).unwrap();
        let err = vault.open(Some(&Passphrase::new("wrong"))).unwrap_err();
        assert!(matches!(err, Error::Decryption(_)));
        let err = vault.open(None).unwrap_err();
        assert!(matches!(err, Error::Decryption(_)));
    }

    #[test]
    fn plain_wallet_needs_no_passphrase() {
        let key = Keypair::new();
        let vault = Vault::create(&[&key], None).unwrap();
        let bag = vault.open(None).unwrap();
        assert!(bag.contains(&key.pubkey()));
    }

    #[test]
    fn missing_file_is_a_decryption_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Vault::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Decryption(_)));
    }
}
