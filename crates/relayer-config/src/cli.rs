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

use crate::RelayerConfig;
use anyhow::Context;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Package identifier, where the default configuration is defined.
/// If the user does not start the relayer with the `--config-dir`
/// it will default to read from the default location depending on the OS.
pub const PACKAGE_ID: [&str; 3] = ["tools", "bridge", "bridge-relayer"];

/// The Bridge Relayer Command-line tool
///
/// Relay a single message:
///
/// $ bridge-relayer -vvv -c <CONFIG_DIR> relay --source 1 --destination 3 ...
///
/// Relay messages read, one JSON object per line, from stdin:
///
/// $ bridge-relayer -vvv -c <CONFIG_DIR> listen
#[derive(StructOpt)]
#[structopt(name = "Bridge Relayer")]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory that contains configration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// What to do.
    #[structopt(subcommand)]
    pub command: Command,
}

/// The relayer subcommands.
#[derive(StructOpt)]
pub enum Command {
    /// Complete a single transfer on its destination chain.
    Relay(RelayOpts),
    /// Read messages from stdin, one JSON object per line, and relay each of them.
    Listen,
}

/// A message given on the command line.
#[derive(StructOpt)]
pub struct RelayOpts {
    /// Chain id the deposit was made on.
    #[structopt(long)]
    pub source: u8,
    /// Chain id the transfer is completed on.
    #[structopt(long)]
    pub destination: u8,
    /// Hex encoded 32 bytes resource id.
    #[structopt(long = "resource-id")]
    pub resource_id: bridge_relayer_types::message::ResourceId,
    /// Nonce of the deposit on the source chain.
    #[structopt(long)]
    pub nonce: u64,
    /// Hex encoded receiver account on the destination chain.
    #[structopt(long)]
    pub receiver: String,
    /// Amount to mint, in destination chain units.
    #[structopt(long)]
    pub amount: u64,
}

/// Loads the configuration from the given directory.
///
/// Returns `Ok(Config)` on success, or `Err(anyhow::Error)` on failure.
///
/// # Arguments
///
/// * `config_dir` - An optional `PathBuf` representing the directory that contains the configuration.
pub fn load_config<P>(
    config_dir: Option<P>,
) -> Result<RelayerConfig, anyhow::Error>
where
    P: AsRef<Path>,
{
    tracing::debug!("Getting default dirs for bridge relayer");
    let dirs = ProjectDirs::from(PACKAGE_ID[0], PACKAGE_ID[1], PACKAGE_ID[2])
        .context("failed to get config")?;
    let path = match config_dir {
        Some(p) => p.as_ref().to_path_buf(),
        None => dirs.config_dir().to_path_buf(),
    };
    // return an error if the path is not a directory.
    if !path.is_dir() {
        return Err(anyhow::anyhow!("{} is not a directory", path.display()));
    }
    tracing::trace!("Loading Config from {} ..", path.display());
    let v = crate::utils::load(path)?;
    tracing::trace!("Config loaded..");
    Ok(v)
}

/// Sets up the logger for the relayer, based on the verbosity level passed in.
///
/// `target` is the crate whose events the verbosity applies to.
pub fn setup_logger(verbosity: i32, target: &str) -> anyhow::Result<()> {
    use tracing::Level;
    let log_level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("{target}={log_level}").parse()?)
        .add_directive(format!("bridge_relayer_proposal_writers={log_level}").parse()?)
        .add_directive(
            format!("{}={log_level}", bridge_relayer_utils::probe::TARGET)
                .parse()?,
        );
    let logger = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .with_env_filter(env_filter);
    // if we are not compiling for integration tests, we should use pretty logs
    #[cfg(not(feature = "integration-tests"))]
    let logger = logger.pretty();
    // otherwise, we should use json, which is easy to parse.
    #[cfg(feature = "integration-tests")]
    let logger = logger.json().flatten_event(true).with_current_span(false);

    logger
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set up the logger: {e}"))
}
