// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. Empty values are
//! treated as unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FHE_SWAP_CONTRACT` | Address of the confidential swap (pool) contract | Required |
//! | `FHE_SWAP_NETWORK` | Network name, only `sepolia` is supported | `sepolia` |
//! | `TOKEN_CATALOG_PATH` | JSON token catalog (`[{ticker, address}]`) | Built-in TokenA/TokenB |
//! | `SWAP_SLIPPAGE_BPS` | Slippage tolerance for minimum output, basis points | `50` |
//! | `DECRYPT_CACHE_CAPACITY` | Settled decryptions kept in memory | `256` |
//! | `DECRYPT_CACHE_TTL_SECS` | Lifetime of a settled decryption | `300` |
//! | `DECRYPT_AUTH_DURATION_DAYS` | Validity of a signed decryption authorization | `1` |
//! | `SIGNER_KEY_PATH` | PEM private key for a local signer | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{ensure_sepolia_network, ContractAddress, NetworkConfig};
use crate::decryption::DecryptSettings;

pub const SWAP_CONTRACT_ENV: &str = "FHE_SWAP_CONTRACT";
pub const NETWORK_ENV: &str = "FHE_SWAP_NETWORK";
pub const TOKEN_CATALOG_PATH_ENV: &str = "TOKEN_CATALOG_PATH";
pub const SLIPPAGE_BPS_ENV: &str = "SWAP_SLIPPAGE_BPS";
pub const DECRYPT_CACHE_CAPACITY_ENV: &str = "DECRYPT_CACHE_CAPACITY";
pub const DECRYPT_CACHE_TTL_SECS_ENV: &str = "DECRYPT_CACHE_TTL_SECS";
pub const DECRYPT_AUTH_DURATION_DAYS_ENV: &str = "DECRYPT_AUTH_DURATION_DAYS";
pub const SIGNER_KEY_PATH_ENV: &str = "SIGNER_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration missing: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("Invalid token catalog: {0}")]
    InvalidCatalog(String),
}

/// Settings of the swap core.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub network: NetworkConfig,
    pub swap_contract: ContractAddress,
    pub token_catalog_path: Option<PathBuf>,
    pub slippage_bps: u16,
    pub decrypt: DecryptSettings,
    pub signer_key_path: Option<PathBuf>,
}

impl SwapConfig {
    /// Defaults for everything except the swap contract address.
    pub fn new(swap_contract: ContractAddress) -> Self {
        Self {
            network: crate::blockchain::FHE_SEPOLIA,
            swap_contract,
            token_catalog_path: None,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            decrypt: DecryptSettings::default(),
            signer_key_path: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let swap_contract = get(SWAP_CONTRACT_ENV)
            .ok_or_else(|| ConfigError::Missing(SWAP_CONTRACT_ENV.to_string()))?;
        let swap_contract = Address::from_str(&swap_contract).map_err(|e| ConfigError::Invalid {
            name: SWAP_CONTRACT_ENV.to_string(),
            reason: e.to_string(),
        })?;

        let network =
            ensure_sepolia_network(get(NETWORK_ENV).as_deref()).map_err(|reason| {
                ConfigError::Invalid {
                    name: NETWORK_ENV.to_string(),
                    reason,
                }
            })?;

        let slippage_bps = parse_or(get(SLIPPAGE_BPS_ENV), SLIPPAGE_BPS_ENV, DEFAULT_SLIPPAGE_BPS)?;
        if slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(ConfigError::Invalid {
                name: SLIPPAGE_BPS_ENV.to_string(),
                reason: format!("must be at most {MAX_SLIPPAGE_BPS}"),
            });
        }

        let defaults = DecryptSettings::default();
        let decrypt = DecryptSettings {
            cache_capacity: parse_or(
                get(DECRYPT_CACHE_CAPACITY_ENV),
                DECRYPT_CACHE_CAPACITY_ENV,
                defaults.cache_capacity,
            )?,
            cache_ttl: Duration::from_secs(parse_or(
                get(DECRYPT_CACHE_TTL_SECS_ENV),
                DECRYPT_CACHE_TTL_SECS_ENV,
                defaults.cache_ttl.as_secs(),
            )?),
            authorization_days: parse_or(
                get(DECRYPT_AUTH_DURATION_DAYS_ENV),
                DECRYPT_AUTH_DURATION_DAYS_ENV,
                defaults.authorization_days,
            )?,
        };

        Ok(Self {
            network,
            swap_contract,
            token_catalog_path: get(TOKEN_CATALOG_PATH_ENV).map(PathBuf::from),
            slippage_bps,
            decrypt,
            signer_key_path: get(SIGNER_KEY_PATH_ENV).map(PathBuf::from),
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
