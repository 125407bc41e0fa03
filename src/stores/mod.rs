// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Observable stores of encrypted values and their decrypted plaintexts.
//!
//! Stores never prompt the signer on their own; decryption runs only when a
//! caller asks for it. Plaintexts are dropped whenever the wallet session
//! changes identity.

mod entry;

pub mod balance;
pub mod reserve;

pub use balance::{BalanceEntry, BalanceStore};
pub use entry::EntrySnapshot;
pub use reserve::{ReserveSide, ReserveStore, ReserveView};
