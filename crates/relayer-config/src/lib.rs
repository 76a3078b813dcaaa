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

//! # Relayer Configuration Module 🕸️
//!
//! A module for configuring the relayer.
//!
//! ## Overview
//!
//! The relayer configuration module is responsible for configuring the relayer.
//! Possible configuration include:
//! * `solana`: Solana clusters the relayer completes transfers on, with the
//!   pool accounts, keystore and proposal polling options of each one.
//!   See [config/example](../../config/example) for an example.

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Default values of the optional configuration fields.
pub mod defaults;
/// Solana configuration
pub mod solana;
/// Utils for processing configuration
pub mod utils;

use serde::{Deserialize, Serialize};
use solana::SolanaChainConfig;
use std::collections::HashMap;

/// RelayerConfig is the configuration for the bridge relayer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RelayerConfig {
    /// Solana clusters and their configuration.
    ///
    /// a map between chain name and its configuration; after loading it is
    /// keyed by chain id instead.
    #[serde(default)]
    pub solana: HashMap<String, SolanaChainConfig>,
}

impl RelayerConfig {
    /// Returns the configuration of the destination chain with the given id.
    pub fn solana_chain(
        &self,
        chain_id: bridge_relayer_types::message::ChainId,
    ) -> bridge_relayer_utils::Result<&SolanaChainConfig> {
        self.solana.get(&chain_id.to_string()).ok_or_else(|| {
            bridge_relayer_utils::Error::ChainNotFound {
                chain_id: chain_id.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_config_files_are_correct() {
        // This walks all the directories inside the config directory of the
        // repository and tries to parse the config file(s) inside it.
        let config_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config");
        let config_dirs =
            glob::glob(config_dir.join("*").to_str().unwrap())
                .expect("Failed to read config directory")
                .filter_map(|p| p.ok())
                .filter(|p| p.is_dir())
                .collect::<Vec<_>>();
        assert!(
            !config_dirs.is_empty(),
            "No config directories found in the config directory"
        );
        for config_subdir in config_dirs {
            // Load the example dot env file.
            let vars = dotenv::from_path_iter(config_subdir.join(".env.example"))
                .map(|iter| iter.filter_map(|v| v.ok()).collect::<Vec<_>>())
                .unwrap_or_default();
            for (k, v) in &vars {
                std::env::set_var(k, v);
            }
            if let Err(e) = utils::load(&config_subdir) {
                panic!("Failed to parse config file in directory: {config_subdir:?} with error: {e}");
            }
            for (k, _) in &vars {
                std::env::remove_var(k);
            }
        }
    }
}
