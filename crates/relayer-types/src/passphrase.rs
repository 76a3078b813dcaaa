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

use serde::Deserialize;

/// The passphrase protecting a keystore file.
///
/// In config files it is either the passphrase itself or, when it starts with
/// `$`, the name of the environment variable holding it.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wraps a passphrase.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the passphrase bytes.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Passphrase").finish()
    }
}

impl<'de> Deserialize<'de> for Passphrase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        crate::from_env_or_literal(&value)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_printed() {
        let p = Passphrase::new("hunter2");
        assert_eq!(format!("{p:?}"), "Passphrase");
        assert_eq!(p.expose(), b"hunter2");
    }

    #[test]
    fn missing_env_var_is_an_error() {
        let res: Result<Passphrase, _> =
            serde_json::from_str(r#""$BRIDGE_TEST_SURELY_UNSET_PASSPHRASE""#);
        assert!(res.is_err());
    }
}
