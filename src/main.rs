// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `fhe-swap`: validates the runtime configuration of the swap core.
//!
//! Loads the configuration, token catalog, and optional local signer, then
//! reports what a host would start with. Contract and compute-network
//! transports are supplied by the host application, which assembles the
//! core with `fhe_swap_client::client::SwapClient::new`.

use std::error::Error;
use std::sync::Arc;

use tracing::{info, warn};

use fhe_swap_client::blockchain::{load_signer, SessionSigner};
use fhe_swap_client::config::SwapConfig;
use fhe_swap_client::logging::{init_tracing, LogFormat};
use fhe_swap_client::registry::TokenRegistry;
use fhe_swap_client::session::WalletSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing(LogFormat::from_env())?;

    let config = SwapConfig::from_env()?;
    info!(
        network = config.network.name,
        chain_id = config.network.chain_id,
        swap_contract = %config.swap_contract,
        slippage_bps = config.slippage_bps,
        "Configuration loaded"
    );
    info!(
        cache_capacity = config.decrypt.cache_capacity,
        cache_ttl_secs = config.decrypt.cache_ttl.as_secs(),
        authorization_days = config.decrypt.authorization_days,
        "Decryption settings"
    );

    let registry = match &config.token_catalog_path {
        Some(path) => TokenRegistry::load(path)?,
        None => TokenRegistry::builtin()?,
    };
    for token in registry.tokens() {
        info!(ticker = %token.ticker, address = %token.address, "Catalog token");
    }
    let (input, output) = registry.defaults()?;
    info!(input = %input.ticker, output = %output.ticker, "Default swap pair");

    let session = WalletSession::new();
    match &config.signer_key_path {
        Some(path) => {
            let signer: Arc<dyn SessionSigner> = Arc::new(load_signer(path)?);
            info!(address = %signer.address(), "Local signer loaded");
            session.connect(signer);
        }
        None => warn!("No signer configured, session stays disconnected"),
    }

    let snapshot = session.snapshot();
    info!(
        connected = snapshot.connected,
        address = ?snapshot.address(),
        explorer = config.network.explorer_url,
        "Swap core ready"
    );
    Ok(())
}
