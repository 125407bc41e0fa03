// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encrypted liquidity reserves of the swap pool.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::entry::{EntrySnapshot, EntryStore};
use crate::blockchain::{
    CiphertextHandle, ContractAddress, DecryptedAmount, LedgerReader, ReserveHandles,
};
use crate::decryption::DecryptionService;
use crate::error::{SwapError, SwapResult};
use crate::session::WalletSession;

/// One side of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveSide {
    TokenA,
    TokenB,
}

/// Both reserve entries; `None` until the pool reserves were observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveView {
    pub token_a: Option<EntrySnapshot>,
    pub token_b: Option<EntrySnapshot>,
}

/// Reserve ciphertexts are owned by the pool contract, so decryption is
/// requested against the pool address.
#[derive(Clone)]
pub struct ReserveStore {
    pool: ContractAddress,
    entries: EntryStore<ReserveSide>,
    ledger: Arc<dyn LedgerReader>,
}

impl ReserveStore {
    pub fn new(
        pool: ContractAddress,
        service: Arc<DecryptionService>,
        session: WalletSession,
        ledger: Arc<dyn LedgerReader>,
    ) -> Self {
        Self {
            pool,
            entries: EntryStore::new("reserves", service, session),
            ledger,
        }
    }

    pub fn pool(&self) -> ContractAddress {
        self.pool
    }

    pub fn observe(&self, handles: ReserveHandles) {
        self.entries.observe(ReserveSide::TokenA, handles.token_a);
        self.entries.observe(ReserveSide::TokenB, handles.token_b);
    }

    /// Read the pool's current reserve handles.
    pub async fn refresh(&self) -> SwapResult<ReserveHandles> {
        let epoch = self.entries.session().epoch();
        let handles = self.ledger.reserves(self.pool).await?;
        if self.entries.session().epoch() != epoch {
            return Err(SwapError::precondition(
                "wallet session changed while reading reserves",
            ));
        }
        self.observe(handles);
        Ok(handles)
    }

    /// Decrypt one reserve, joining a pending decryption of the same side.
    pub async fn decrypt(&self, side: ReserveSide) -> SwapResult<DecryptedAmount> {
        let amount = self
            .entries
            .decrypt(side, self.pool, "missing reserve data")
            .await?;
        info!(pool = %self.pool, side = ?side, "Reserve decrypted");
        Ok(amount)
    }

    pub fn entry(&self, side: ReserveSide) -> Option<EntrySnapshot> {
        self.entries.get(&side)
    }

    pub fn handle(&self, side: ReserveSide) -> Option<CiphertextHandle> {
        self.entry(side).map(|e| e.encrypted)
    }

    pub fn reserve(&self) -> ReserveView {
        ReserveView {
            token_a: self.entry(ReserveSide::TokenA),
            token_b: self.entry(ReserveSide::TokenB),
        }
    }

    pub fn invalidate(&self) {
        self.entries.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decryption::DecryptSettings;
    use crate::testing::{handle, FakeComputeNetwork, FakeLedger, FakeSigner};
    use alloy::primitives::Address;

    struct Fixture {
        network: Arc<FakeComputeNetwork>,
        ledger: Arc<FakeLedger>,
        session: WalletSession,
        store: ReserveStore,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(FakeComputeNetwork::new());
        let ledger = Arc::new(FakeLedger::new());
        let session = WalletSession::connected(FakeSigner::arc(0x11));
        let service = Arc::new(DecryptionService::new(
            network.clone(),
            session.clone(),
            DecryptSettings::default(),
        ));
        let store = ReserveStore::new(
            Address::repeat_byte(0x5a),
            service,
            session.clone(),
            ledger.clone(),
        );
        Fixture {
            network,
            ledger,
            session,
            store,
        }
    }

    fn pool_handles() -> ReserveHandles {
        ReserveHandles {
            token_a: handle(0x0a),
            token_b: handle(0x0b),
        }
    }

    #[tokio::test]
    async fn decrypt_without_reserves_is_missing_data() {
        let f = fixture();
        let err = f.store.decrypt(ReserveSide::TokenA).await.unwrap_err();
        assert_eq!(err, SwapError::precondition("missing reserve data"));
        assert_eq!(f.network.decrypt_calls(), 0);
        assert_eq!(f.store.reserve().token_a, None);
    }

    #[tokio::test]
    async fn both_sides_decrypt_independently() {
        let f = fixture();
        f.network.set_plaintext(handle(0x0a), 1_000_000_000);
        f.network.set_plaintext(handle(0x0b), 2_000_000_000);
        f.store.observe(pool_handles());

        let (a, b) = tokio::join!(
            f.store.decrypt(ReserveSide::TokenA),
            f.store.decrypt(ReserveSide::TokenB)
        );

        assert_eq!(a.unwrap().to_string(), "1000");
        assert_eq!(b.unwrap().to_string(), "2000");
        assert_eq!(f.network.decrypt_calls(), 2);
        let view = f.store.reserve();
        assert!(view.token_a.unwrap().decrypted.is_some());
        assert!(view.token_b.unwrap().decrypted.is_some());
    }

    #[tokio::test]
    async fn repeated_decrypt_of_one_side_is_single_flight() {
        let f = fixture();
        f.network.set_plaintext(handle(0x0a), 5);
        f.store.observe(pool_handles());

        let (first, second) = tokio::join!(
            f.store.decrypt(ReserveSide::TokenA),
            f.store.decrypt(ReserveSide::TokenA)
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(f.network.decrypt_calls(), 1);
    }

    #[tokio::test]
    async fn refresh_observes_pool_reserves() {
        let f = fixture();
        f.ledger.set_reserves(pool_handles());

        let handles = f.store.refresh().await.unwrap();

        assert_eq!(handles, pool_handles());
        assert_eq!(f.store.handle(ReserveSide::TokenB), Some(handle(0x0b)));
    }

    #[tokio::test]
    async fn refresh_failure_is_a_network_error() {
        let f = fixture();
        f.ledger.fail_reads(true);
        assert!(matches!(
            f.store.refresh().await,
            Err(SwapError::Network(_))
        ));
        assert_eq!(f.store.reserve().token_a, None);
    }

    #[tokio::test]
    async fn disconnect_clears_plaintexts() {
        let f = fixture();
        f.network.set_plaintext(handle(0x0a), 5);
        f.store.observe(pool_handles());
        f.store.decrypt(ReserveSide::TokenA).await.unwrap();

        f.session.disconnect();

        let entry = f.store.entry(ReserveSide::TokenA).unwrap();
        assert_eq!(entry.encrypted, handle(0x0a));
        assert_eq!(entry.decrypted, None);
        assert!(matches!(
            f.store.decrypt(ReserveSide::TokenA).await,
            Err(SwapError::Precondition(_))
        ));
    }
}
