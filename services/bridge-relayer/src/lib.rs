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

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! # Bridge Relayer 🕸️
//!
//! Completes bridge deposits on their destination chains.
//!
//! The relayer is given messages, either one on the command line or a
//! stream of them on stdin, and hands each one to the proposal writer of
//! its destination chain.

/// Wiring of the writers, the router and the message listener.
pub mod service;
