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

/// The namespace every relayer of the bridge uses when deriving proposal accounts.
pub fn proposal_namespace() -> String {
    String::from("stafi")
}
/// A proposal is polled `50` times by default before giving up.
pub const fn retry_limit() -> usize {
    50
}
/// Wait `5s` between two polls by default.
pub const fn wait_time() -> u64 {
    5_000
}
/// No jitter by default.
pub const fn jitter() -> u64 {
    0
}
