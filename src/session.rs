// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide wallet session.
//!
//! The host (wallet connector) reports connection and signer changes here;
//! the swap core only observes them. Every change of the connected identity
//! bumps the session epoch. Plaintexts and signatures obtained under one
//! epoch must not be used under another.

use std::sync::{Arc, RwLock};

use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::info;

use crate::blockchain::SessionSigner;

/// Point-in-time view of the session.
#[derive(Clone)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub signer: Option<Arc<dyn SessionSigner>>,
    pub epoch: u64,
}

impl SessionSnapshot {
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Signer usable for new requests: present and connected.
    pub fn active_signer(&self) -> Option<Arc<dyn SessionSigner>> {
        if self.connected {
            self.signer.clone()
        } else {
            None
        }
    }
}

impl std::fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("connected", &self.connected)
            .field("address", &self.address())
            .field("epoch", &self.epoch)
            .finish()
    }
}

struct SessionInner {
    connected: bool,
    signer: Option<Arc<dyn SessionSigner>>,
    epoch: u64,
}

/// Shared handle to the wallet session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<RwLock<SessionInner>>,
    changes: Arc<watch::Sender<u64>>,
}

impl WalletSession {
    /// A disconnected session without a signer.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(RwLock::new(SessionInner {
                connected: false,
                signer: None,
                epoch: 0,
            })),
            changes: Arc::new(changes),
        }
    }

    /// A session already connected with `signer`.
    pub fn connected(signer: Arc<dyn SessionSigner>) -> Self {
        let session = Self::new();
        session.connect(signer);
        session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        SessionSnapshot {
            connected: inner.connected,
            signer: inner.signer.clone(),
            epoch: inner.epoch,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.snapshot().epoch
    }

    /// Connect with `signer`, replacing any previous one.
    pub fn connect(&self, signer: Arc<dyn SessionSigner>) {
        self.update(true, Some(signer));
    }

    /// Switch to another account without disconnecting.
    pub fn switch_signer(&self, signer: Arc<dyn SessionSigner>) {
        self.update(true, Some(signer));
    }

    pub fn disconnect(&self) {
        self.update(false, None);
    }

    /// Subscribe to epoch changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn update(&self, connected: bool, signer: Option<Arc<dyn SessionSigner>>) {
        let epoch = {
            let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
            let before = (inner.connected, inner.signer.as_ref().map(|s| s.address()));
            let after = (connected, signer.as_ref().map(|s| s.address()));

            inner.connected = connected;
            inner.signer = signer;
            if before == after {
                return;
            }
            inner.epoch += 1;

            info!(
                connected,
                address = ?after.1,
                epoch = inner.epoch,
                "Wallet session changed"
            );
            inner.epoch
        };
        self.changes.send_replace(epoch);
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}
