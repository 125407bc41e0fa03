// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyed ciphertext entries with single-flight decryption.
//!
//! Each entry holds the latest encrypted handle, the plaintext once
//! decrypted, and the pending operation if one is in flight. Entries carry a
//! generation that is bumped whenever their plaintext becomes invalid (new
//! handle, session change); a decryption that settles under an older
//! generation is discarded.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::blockchain::{CiphertextHandle, ContractAddress, DecryptedAmount, SessionSigner};
use crate::decryption::DecryptionService;
use crate::error::{SwapError, SwapResult};
use crate::session::WalletSession;

type PendingDecrypt = Shared<BoxFuture<'static, SwapResult<DecryptedAmount>>>;

/// Observable state of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySnapshot {
    pub encrypted: CiphertextHandle,
    pub decrypted: Option<DecryptedAmount>,
    pub pending: bool,
}

struct Entry {
    encrypted: CiphertextHandle,
    decrypted: Option<DecryptedAmount>,
    pending: Option<PendingDecrypt>,
    generation: u64,
}

impl Entry {
    fn reset(&mut self) {
        self.decrypted = None;
        self.pending = None;
        self.generation += 1;
    }

    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            encrypted: self.encrypted,
            decrypted: self.decrypted,
            pending: self.pending.is_some(),
        }
    }
}

struct StoreState<K> {
    entries: HashMap<K, Entry>,
    /// Session epoch the plaintexts belong to
    epoch: u64,
}

struct StoreShared<K> {
    state: Mutex<StoreState<K>>,
    session: WalletSession,
    service: Arc<DecryptionService>,
    label: &'static str,
}

impl<K> StoreShared<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Lock the state, first dropping plaintexts of a superseded session.
    fn lock(&self) -> MutexGuard<'_, StoreState<K>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let epoch = self.session.epoch();
        if state.epoch != epoch {
            debug!(
                store = self.label,
                from = state.epoch,
                to = epoch,
                "Session changed, clearing plaintexts"
            );
            state.entries.values_mut().for_each(Entry::reset);
            state.epoch = epoch;
        }
        state
    }
}

pub(crate) struct EntryStore<K> {
    shared: Arc<StoreShared<K>>,
}

impl<K> Clone for EntryStore<K> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<K> EntryStore<K>
where
    K: Copy + Eq + Hash + Debug + Send + Sync + 'static,
{
    pub(crate) fn new(
        label: &'static str,
        service: Arc<DecryptionService>,
        session: WalletSession,
    ) -> Self {
        let epoch = session.epoch();
        Self {
            shared: Arc::new(StoreShared {
                state: Mutex::new(StoreState {
                    entries: HashMap::new(),
                    epoch,
                }),
                session,
                service,
                label,
            }),
        }
    }

    pub(crate) fn session(&self) -> &WalletSession {
        &self.shared.session
    }

    /// Record the current handle for `key`. A changed handle drops the
    /// plaintext of the old one.
    pub(crate) fn observe(&self, key: K, encrypted: CiphertextHandle) {
        let mut state = self.shared.lock();
        match state.entries.get_mut(&key) {
            Some(entry) if entry.encrypted == encrypted => {}
            Some(entry) => {
                entry.reset();
                entry.encrypted = encrypted;
            }
            None => {
                state.entries.insert(
                    key,
                    Entry {
                        encrypted,
                        decrypted: None,
                        pending: None,
                        generation: 0,
                    },
                );
            }
        }
    }

    pub(crate) fn get(&self, key: &K) -> Option<EntrySnapshot> {
        self.shared.lock().entries.get(key).map(Entry::snapshot)
    }

    /// Drop every plaintext and pending operation; handles are kept.
    pub(crate) fn invalidate(&self) {
        let mut state = self.shared.lock();
        state.entries.values_mut().for_each(Entry::reset);
    }

    /// Decrypt the entry for `key` against `contract`.
    ///
    /// Joins the pending operation if there is one. On failure the previous
    /// plaintext is kept.
    pub(crate) async fn decrypt(
        &self,
        key: K,
        contract: ContractAddress,
        missing: &'static str,
    ) -> SwapResult<DecryptedAmount> {
        let operation = {
            let mut state = self.shared.lock();
            let entry = state
                .entries
                .get_mut(&key)
                .ok_or_else(|| SwapError::precondition(missing))?;

            match &entry.pending {
                Some(pending) => {
                    debug!(store = self.shared.label, key = ?key, "Joining pending decryption");
                    pending.clone()
                }
                None => {
                    let signer = self
                        .shared
                        .session
                        .snapshot()
                        .active_signer()
                        .ok_or_else(|| SwapError::precondition("wallet is not connected"))?;
                    let operation = settle(
                        self.shared.clone(),
                        key,
                        entry.encrypted,
                        contract,
                        signer,
                        entry.generation,
                    )
                    .boxed()
                    .shared();
                    entry.pending = Some(operation.clone());
                    operation
                }
            }
        };

        operation.await
    }
}

async fn settle<K>(
    shared: Arc<StoreShared<K>>,
    key: K,
    encrypted: CiphertextHandle,
    contract: ContractAddress,
    signer: Arc<dyn SessionSigner>,
    generation: u64,
) -> SwapResult<DecryptedAmount>
where
    K: Copy + Eq + Hash + Debug,
{
    let result = shared
        .service
        .decrypt(encrypted, contract, Some(signer))
        .await;

    let mut state = shared.lock();
    let current = state
        .entries
        .get_mut(&key)
        .filter(|entry| entry.generation == generation);

    match current {
        Some(entry) => {
            entry.pending = None;
            if let Ok(amount) = &result {
                entry.decrypted = Some(*amount);
            }
            result
        }
        None => {
            debug!(store = shared.label, key = ?key, "Discarding superseded decryption");
            Err(SwapError::precondition(
                "wallet session changed while decrypting",
            ))
        }
    }
}
