// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Decryption Service
//!
//! Wraps the user-decryption protocol of the confidential-compute network:
//! given a ciphertext handle, the contract that owns it, and a signer, it
//! obtains an authorization signature and asks the network for the
//! plaintext.
//!
//! ## Single-flight
//!
//! Calls are keyed by (handle, contract, signer address, session epoch).
//! Concurrent calls with the same key share one in-flight operation, so the
//! holder sees one signature prompt and the network sees one request. Calls
//! with different keys run independently. Once an operation settles its entry
//! is removed; re-requesting the key afterwards is a fresh attempt, which is
//! how callers retry.
//!
//! ## Settled results
//!
//! Successful results are kept in a [`DecryptCache`] under the same key. The
//! epoch is part of the key, so a session change makes every earlier entry
//! unreachable without any background cleanup, and a result that settles
//! after the session moved on is never stored.

pub mod cache;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::blockchain::{CiphertextHandle, ContractAddress, DecryptedAmount, SessionSigner};
use crate::compute::{ComputeNetwork, DecryptAuthorization, SignedDecryptRequest};
use crate::error::{SwapError, SwapResult};
use crate::session::WalletSession;

pub use cache::DecryptCache;

/// Memoization key of a decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecryptKey {
    pub handle: CiphertextHandle,
    pub contract: ContractAddress,
    pub signer: Address,
    /// Session epoch the request was made in
    pub epoch: u64,
}

type SharedDecrypt = Shared<BoxFuture<'static, SwapResult<DecryptedAmount>>>;

/// Tunables of the decryption service.
#[derive(Debug, Clone)]
pub struct DecryptSettings {
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    /// Validity of each signed decryption authorization
    pub authorization_days: u32,
}

impl Default for DecryptSettings {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(300),
            authorization_days: 1,
        }
    }
}

pub struct DecryptionService {
    network: Arc<dyn ComputeNetwork>,
    session: WalletSession,
    cache: DecryptCache,
    in_flight: Mutex<HashMap<DecryptKey, SharedDecrypt>>,
    authorization_days: u32,
}

impl DecryptionService {
    pub fn new(
        network: Arc<dyn ComputeNetwork>,
        session: WalletSession,
        settings: DecryptSettings,
    ) -> Self {
        Self {
            network,
            session,
            cache: DecryptCache::new(settings.cache_capacity, settings.cache_ttl),
            in_flight: Mutex::new(HashMap::new()),
            authorization_days: settings.authorization_days,
        }
    }

    /// Decrypt `handle`, owned by `contract`, on behalf of `signer`.
    ///
    /// Fails with [`SwapError::Precondition`] when no signer is available,
    /// [`SwapError::UserRejected`] when the signature is declined, and
    /// [`SwapError::Network`] when the network fails. Never retries.
    pub async fn decrypt(
        &self,
        handle: CiphertextHandle,
        contract: ContractAddress,
        signer: Option<Arc<dyn SessionSigner>>,
    ) -> SwapResult<DecryptedAmount> {
        self.decrypt_with(handle, contract, signer, true).await
    }

    /// Like [`decrypt`](Self::decrypt) but never served from or stored in
    /// the settled cache, so the signer is always prompted unless an
    /// identical request is already in flight.
    pub async fn decrypt_uncached(
        &self,
        handle: CiphertextHandle,
        contract: ContractAddress,
        signer: Option<Arc<dyn SessionSigner>>,
    ) -> SwapResult<DecryptedAmount> {
        self.decrypt_with(handle, contract, signer, false).await
    }

    async fn decrypt_with(
        &self,
        handle: CiphertextHandle,
        contract: ContractAddress,
        signer: Option<Arc<dyn SessionSigner>>,
        cached: bool,
    ) -> SwapResult<DecryptedAmount> {
        let signer =
            signer.ok_or_else(|| SwapError::precondition("no signer available for decryption"))?;
        let key = DecryptKey {
            handle,
            contract,
            signer: signer.address(),
            epoch: self.session.epoch(),
        };

        if cached {
            if let Some(amount) = self.cache.get(&key) {
                debug!(handle = %key.handle, contract = %key.contract, "Decryption cache hit");
                return Ok(amount);
            }
        }

        let operation = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match in_flight.get(&key) {
                Some(existing) => {
                    debug!(handle = %key.handle, "Joining in-flight decryption");
                    existing.clone()
                }
                None => {
                    let operation = run_decrypt(
                        self.network.clone(),
                        key,
                        signer,
                        self.authorization_days,
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(key, operation.clone());
                    operation
                }
            }
        };

        let result = operation.clone().await;

        if let (true, Ok(amount)) = (cached, &result) {
            if self.session.epoch() == key.epoch {
                self.cache.put(key, *amount);
            } else {
                debug!(handle = %key.handle, "Session changed while decrypting, result not cached");
            }
        }
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if in_flight
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&operation))
        {
            in_flight.remove(&key);
        }

        result
    }

    /// Forget every settled plaintext obtained by `signer`.
    pub fn forget_signer(&self, signer: &Address) {
        self.cache.invalidate_signer(signer);
    }

    /// Number of decryptions currently awaiting the network.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }
}

async fn run_decrypt(
    network: Arc<dyn ComputeNetwork>,
    key: DecryptKey,
    signer: Arc<dyn SessionSigner>,
    authorization_days: u32,
) -> SwapResult<DecryptedAmount> {
    let authorization =
        DecryptAuthorization::new(key.handle, key.contract, key.signer, authorization_days);
    let payload = authorization.signing_payload()?;

    let signature = signer.sign_message(&payload).await.inspect_err(|e| {
        warn!(handle = %key.handle, error = %e, "Decryption authorization not signed");
    })?;

    let request = SignedDecryptRequest {
        handle: key.handle,
        contract: key.contract,
        authorization,
        signature,
    };

    let plaintext = network.request_decrypt(&request).await.inspect_err(|e| {
        warn!(handle = %key.handle, error = %e, "Decryption request failed");
    })?;

    info!(handle = %key.handle, contract = %key.contract, "Ciphertext decrypted");
    Ok(DecryptedAmount::from_raw(plaintext))
}
