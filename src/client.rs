// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wiring of the swap core from a [`SwapConfig`].
//!
//! The host supplies the session and the chain / compute-network
//! collaborators; everything else is built here so the stores, the
//! orchestrator and the watcher share one decryption service.

use std::sync::Arc;

use crate::blockchain::{LedgerReader, SwapContract};
use crate::compute::ComputeNetwork;
use crate::config::SwapConfig;
use crate::decryption::DecryptionService;
use crate::error::{SwapError, SwapResult};
use crate::registry::TokenRegistry;
use crate::session::WalletSession;
use crate::stores::{BalanceStore, ReserveStore};
use crate::swap::SwapOrchestrator;
use crate::watcher::SessionWatcher;

#[derive(Clone)]
pub struct SwapClient {
    pub session: WalletSession,
    pub decryption: Arc<DecryptionService>,
    pub balances: BalanceStore,
    pub reserves: ReserveStore,
    pub orchestrator: Arc<SwapOrchestrator>,
}

impl SwapClient {
    pub fn new(
        config: &SwapConfig,
        registry: &TokenRegistry,
        session: WalletSession,
        contract: Arc<dyn SwapContract>,
        network: Arc<dyn ComputeNetwork>,
        ledger: Arc<dyn LedgerReader>,
    ) -> SwapResult<Self> {
        if contract.address() != config.swap_contract {
            return Err(SwapError::validation(format!(
                "swap contract {} does not match configured {}",
                contract.address(),
                config.swap_contract
            )));
        }

        let decryption = Arc::new(DecryptionService::new(
            network.clone(),
            session.clone(),
            config.decrypt.clone(),
        ));
        let balances = BalanceStore::new(decryption.clone(), session.clone(), ledger.clone());
        let reserves = ReserveStore::new(
            config.swap_contract,
            decryption.clone(),
            session.clone(),
            ledger,
        );
        let orchestrator = Arc::new(SwapOrchestrator::new(
            registry,
            session.clone(),
            decryption.clone(),
            contract,
            network,
            config.slippage_bps,
        )?);

        Ok(Self {
            session,
            decryption,
            balances,
            reserves,
            orchestrator,
        })
    }

    /// A watcher applying session changes to every component of this client.
    pub fn watcher(&self) -> SessionWatcher {
        SessionWatcher::new(self.session.clone(), self.decryption.clone())
            .with_balances(self.balances.clone())
            .with_reserves(self.reserves.clone())
            .with_orchestrator(self.orchestrator.clone())
    }
}
