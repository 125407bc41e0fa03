// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! FHE Swap - Confidential Token Swap Client Core
//!
//! Client-side orchestration of swaps between FHE-encrypted tokens on
//! Sepolia. Balances, reserves, and swap amounts are ciphertext handles;
//! plaintexts are obtained only through signer-authorized decryption.
//!
//! ## Modules
//!
//! - `blockchain` - Chain primitives, signers, contract collaborators
//! - `client` - Assembly of the core from configuration
//! - `compute` - Confidential-compute network requests
//! - `decryption` - Single-flight decryption service
//! - `stores` - Balance and reserve stores
//! - `swap` - Authorize / calculate / swap state machine
//! - `registry` - Token catalog
//! - `session` - Wallet session and its change notifications
//! - `watcher` - Background application of session changes

pub mod blockchain;
pub mod client;
pub mod compute;
pub mod config;
pub mod decryption;
pub mod error;
pub mod logging;
pub mod registry;
pub mod session;
pub mod stores;
pub mod swap;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use error::{SwapError, SwapResult};
