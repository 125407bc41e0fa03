// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-facing types and collaborators.
//!
//! This module provides:
//! - Token, ciphertext handle and fixed-point amount types
//! - The session signer seam and local PEM key loading
//! - The swap contract and ledger reader seams

pub mod contract;
pub mod signing;
pub mod types;

pub use contract::{AuthorizationReceipt, LedgerReader, ReserveHandles, SwapContract};
pub use signing::{load_signer, SessionSigner, SigningError};
pub use types::*;
