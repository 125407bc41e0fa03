// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-token encrypted balances of the session owner.

use std::sync::Arc;

use tracing::info;

use super::entry::{EntrySnapshot, EntryStore};
use crate::blockchain::{CiphertextHandle, ContractAddress, DecryptedAmount, LedgerReader};
use crate::decryption::DecryptionService;
use crate::error::{SwapError, SwapResult};
use crate::session::WalletSession;

/// Balance of one token: the encrypted handle, the plaintext once the
/// session signer decrypted it, and whether a decryption is in flight.
pub type BalanceEntry = EntrySnapshot;

/// Balances keyed by token contract address.
///
/// Balance ciphertexts belong to their token contract, so decryption is
/// requested against the token address.
#[derive(Clone)]
pub struct BalanceStore {
    entries: EntryStore<ContractAddress>,
    ledger: Arc<dyn LedgerReader>,
}

impl BalanceStore {
    pub fn new(
        service: Arc<DecryptionService>,
        session: WalletSession,
        ledger: Arc<dyn LedgerReader>,
    ) -> Self {
        Self {
            entries: EntryStore::new("balances", service, session),
            ledger,
        }
    }

    /// Record the encrypted balance handle of `token`.
    pub fn observe(&self, token: ContractAddress, encrypted: CiphertextHandle) {
        self.entries.observe(token, encrypted);
    }

    /// Read the owner's current balance handle from the ledger.
    pub async fn refresh(&self, token: ContractAddress) -> SwapResult<CiphertextHandle> {
        let snapshot = self.entries.session().snapshot();
        let owner = snapshot
            .active_signer()
            .map(|s| s.address())
            .ok_or_else(|| SwapError::precondition("wallet is not connected"))?;

        let encrypted = self.ledger.confidential_balance_of(token, owner).await?;

        if self.entries.session().epoch() != snapshot.epoch {
            return Err(SwapError::precondition(
                "wallet session changed while reading balance",
            ));
        }
        self.observe(token, encrypted);
        Ok(encrypted)
    }

    /// Decrypt the balance of `token`, joining a pending decryption.
    pub async fn decrypt(&self, token: ContractAddress) -> SwapResult<DecryptedAmount> {
        let amount = self
            .entries
            .decrypt(token, token, "no encrypted balance observed for token")
            .await?;
        info!(token = %token, "Balance decrypted");
        Ok(amount)
    }

    pub fn entry(&self, token: &ContractAddress) -> Option<BalanceEntry> {
        self.entries.get(token)
    }

    /// Clear every plaintext, keeping encrypted handles.
    pub fn invalidate(&self) {
        self.entries.invalidate();
    }
}
