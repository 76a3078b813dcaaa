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

use config::{Config, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::RelayerConfig;

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> bridge_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(bridge_relayer_utils::Error::from))
        .collect()
}

/// Try to parse the [`RelayerConfig`] from the given config file(s).
pub fn parse_from_files(
    files: &[PathBuf],
) -> bridge_relayer_utils::Result<RelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        let ext = config_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of BRIDGE).
    let builder = builder
        .add_source(config::Environment::with_prefix("BRIDGE").separator("_"));
    let cfg = builder.build()?;
    let config: Result<
        RelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files and
///
/// Returns `Ok(RelayerConfig)` on success, or `Err` on failure.
///
/// # Example
///
/// ```no_run
/// use bridge_relayer_config::utils::load;
///
/// let path = "/path/to/config";
/// let _ = load(path);
/// ```
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> bridge_relayer_utils::Result<RelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration and standardize
/// the format of the configuration
pub fn postloading_process(
    mut config: RelayerConfig,
) -> bridge_relayer_utils::Result<RelayerConfig> {
    tracing::trace!("Checking configration sanity ...");

    // 1. drain everything, and take enabled chains.
    let old_solana = config
        .solana
        .drain()
        .filter(|(_, chain)| chain.enabled)
        .collect::<HashMap<_, _>>();
    // 2. insert them again, keyed by chain id.
    for (_, v) in old_solana {
        let key = v.chain_id.to_string();
        if let Some(other) = config.solana.get(&key) {
            tracing::error!(
                "chains {} and {} share the chain id {}",
                other.name,
                v.name,
                key
            );
            return Err(bridge_relayer_utils::Error::Generic(
                "two enabled chains share the same chain id",
            ));
        }
        config.solana.insert(key, v);
    }

    for chain in config.solana.values() {
        if chain.endpoints.is_empty() {
            tracing::error!("chain {} has no endpoints", chain.name);
            return Err(bridge_relayer_utils::Error::NoReachableEndpoint {
                chain: chain.name.clone(),
            });
        }
        if !chain.from.ends_with(".json") {
            tracing::warn!(
                "!!WARNING!!: the vault ({}) of chain {} is expected to be a .json file",
                chain.from,
                chain.name
            );
        }
        if chain.resources.is_empty() {
            tracing::warn!(
                "!!WARNING!!: chain {} maps no resource to a mint, every message sent to it will be rejected",
                chain.name
            );
        }
    }

    tracing::trace!(
        "postloaded config: {}",
        serde_json::to_string_pretty(&config)?
    );

    Ok(config)
}
