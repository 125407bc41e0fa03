// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token catalog.
//!
//! Read-only list of tradeable confidential tokens, loaded once at startup
//! from a JSON file or the built-in defaults. The registry imposes no
//! uniqueness rule; keeping the two sides of a swap distinct is the
//! orchestrator's job.

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::blockchain::{ContractAddress, Token};
use crate::config::ConfigError;
use crate::error::{SwapError, SwapResult};

/// Built-in catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogToken {
    pub ticker: &'static str,
    pub address: &'static str,
}

/// Confidential TokenA deployed with the FHE swap pool.
pub const TOKEN_A: CatalogToken = CatalogToken {
    ticker: "TokenA",
    address: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
};

/// Confidential TokenB deployed with the FHE swap pool.
pub const TOKEN_B: CatalogToken = CatalogToken {
    ticker: "TokenB",
    address: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
};

/// Catalog file entry: `{ "ticker": "...", "address": "0x..." }`.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    ticker: String,
    address: String,
}

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// The built-in TokenA/TokenB catalog.
    pub fn builtin() -> Result<Self, ConfigError> {
        let tokens = [TOKEN_A, TOKEN_B]
            .iter()
            .map(|t| parse_entry(t.ticker, t.address))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tokens))
    }

    /// Parse a JSON array of `{ticker, address}` entries.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidCatalog(e.to_string()))?;
        let tokens = entries
            .iter()
            .map(|e| parse_entry(&e.ticker, &e.address))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(tokens))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidCatalog(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn get(&self, address: &ContractAddress) -> Option<&Token> {
        self.tokens.iter().find(|t| &t.address == address)
    }

    /// Case-insensitive substring match on ticker or address, in catalog
    /// order. An empty query returns the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&Token> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.tokens.iter().collect();
        }
        self.tokens
            .iter()
            .filter(|t| {
                t.ticker.to_lowercase().contains(&needle) || t.address_hex().contains(&needle)
            })
            .collect()
    }

    /// Initial (input, output) pair: the first two distinct tokens.
    pub fn defaults(&self) -> SwapResult<(Token, Token)> {
        let input = self
            .tokens
            .first()
            .ok_or_else(|| SwapError::validation("token catalog is empty"))?;
        let output = self
            .tokens
            .iter()
            .find(|t| t.address != input.address)
            .ok_or_else(|| SwapError::validation("token catalog needs two distinct tokens"))?;
        Ok((input.clone(), output.clone()))
    }
}

fn parse_entry(ticker: &str, address: &str) -> Result<Token, ConfigError> {
    let address = Address::from_str(address.trim())
        .map_err(|e| ConfigError::InvalidCatalog(format!("{ticker}: invalid address: {e}")))?;
    Ok(Token::new(address, ticker.trim()))
}
