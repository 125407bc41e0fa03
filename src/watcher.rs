// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Watcher
//!
//! Background task that applies wallet session changes eagerly: stores drop
//! their plaintexts, the orchestrator returns to `Idle`, and settled
//! decryptions of the previous signer are forgotten. Stores and the
//! orchestrator also check the session epoch lazily on every access, and the
//! decryption cache is keyed by epoch, so the watcher only shortens the time
//! stale plaintexts stay in memory.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::decryption::DecryptionService;
use crate::session::WalletSession;
use crate::stores::{BalanceStore, ReserveStore};
use crate::swap::SwapOrchestrator;

pub struct SessionWatcher {
    session: WalletSession,
    changes: watch::Receiver<u64>,
    decryption: Arc<DecryptionService>,
    balances: Option<BalanceStore>,
    reserves: Option<ReserveStore>,
    orchestrator: Option<Arc<SwapOrchestrator>>,
    /// Signer address the current plaintexts belong to
    address: Option<Address>,
}

impl SessionWatcher {
    /// Watch `session` from now on.
    pub fn new(session: WalletSession, decryption: Arc<DecryptionService>) -> Self {
        let changes = session.subscribe();
        let address = session.snapshot().address();
        Self {
            session,
            changes,
            decryption,
            balances: None,
            reserves: None,
            orchestrator: None,
            address,
        }
    }

    pub fn with_balances(mut self, balances: BalanceStore) -> Self {
        self.balances = Some(balances);
        self
    }

    pub fn with_reserves(mut self, reserves: ReserveStore) -> Self {
        self.reserves = Some(reserves);
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: Arc<SwapOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Run until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(watcher.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Session watcher starting");

        loop {
            tokio::select! {
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        debug!("Session closed");
                        break;
                    }
                    self.apply();
                }
                _ = shutdown.cancelled() => break,
            }
        }

        info!("Session watcher shutting down");
    }

    /// Bring every component in line with the current session.
    pub fn apply(&mut self) {
        let snapshot = self.session.snapshot();

        if let Some(balances) = &self.balances {
            balances.invalidate();
        }
        if let Some(reserves) = &self.reserves {
            reserves.invalidate();
        }
        let state = self.orchestrator.as_ref().map(|o| o.sync_session());

        let address = snapshot.address();
        if self.address != address {
            if let Some(previous) = self.address {
                self.decryption.forget_signer(&previous);
            }
            self.address = address;
        }

        info!(
            epoch = snapshot.epoch,
            connected = snapshot.connected,
            address = ?address,
            swap_state = ?state,
            "Session change applied"
        );
    }
}
