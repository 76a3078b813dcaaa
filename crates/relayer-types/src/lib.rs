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

//! Types shared between the router, the proposal writers and the configuration.

/// Cross-chain messages, the unit of work of the relayer.
pub mod message;
/// Secrets that can be read from the environment.
pub mod passphrase;
/// RPC endpoint urls.
pub mod rpc_url;

/// Reads `value` from the environment when it starts with `$`, otherwise returns it as is.
pub(crate) fn from_env_or_literal(value: &str) -> Result<String, String> {
    match value.strip_prefix('$') {
        Some(var) => {
            tracing::trace!("Reading {} from env", var);
            std::env::var(var).map_err(|e| {
                format!("error while loading this env {var}: {e}")
            })
        }
        None => Ok(value.to_string()),
    }
}
