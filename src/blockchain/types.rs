// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain types and constants.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, B256, U256};

use crate::error::SwapError;

/// Contract address of a token, pool, or swap contract.
pub type ContractAddress = Address;

/// Number of fractional digits carried by confidential token amounts.
pub const AMOUNT_DECIMALS: u8 = 6;

/// FHE-enabled network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum Sepolia with the FHE coprocessor deployment.
pub const FHE_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Sepolia (FHE)",
    chain_id: 11155111,
    explorer_url: "https://sepolia.etherscan.io",
};

/// Supported network identifier for this build.
pub const NETWORK_SEPOLIA: &str = "sepolia";

/// Validate network input for a Sepolia-only runtime.
pub fn ensure_sepolia_network(raw: Option<&str>) -> Result<NetworkConfig, String> {
    let value = raw.unwrap_or(NETWORK_SEPOLIA).trim().to_ascii_lowercase();
    if value == NETWORK_SEPOLIA {
        Ok(FHE_SEPOLIA)
    } else {
        Err(format!(
            "Only `{NETWORK_SEPOLIA}` network is supported in this deployment."
        ))
    }
}

/// A tradeable confidential token. Identity is the contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub address: ContractAddress,
    pub ticker: String,
}

impl Token {
    pub fn new(address: ContractAddress, ticker: impl Into<String>) -> Self {
        Self {
            address,
            ticker: ticker.into(),
        }
    }

    /// Lowercase `0x`-prefixed hex form of the address, used for matching.
    pub fn address_hex(&self) -> String {
        format!("{:?}", self.address)
    }
}

/// Opaque reference to an FHE ciphertext, only meaningful inside the
/// contract that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CiphertextHandle(B256);

impl CiphertextHandle {
    pub const fn new(raw: B256) -> Self {
        Self(raw)
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<B256> for CiphertextHandle {
    fn from(raw: B256) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-point amount with [`AMOUNT_DECIMALS`] fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DecryptedAmount {
    raw: U256,
}

impl DecryptedAmount {
    pub const ZERO: Self = Self { raw: U256::ZERO };

    /// Build an amount from its smallest-unit representation.
    pub const fn from_raw(raw: U256) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for DecryptedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.raw, AMOUNT_DECIMALS))
    }
}

impl FromStr for DecryptedAmount {
    type Err = SwapError;

    /// Parse a user-entered decimal such as `"12.5"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(SwapError::validation("amount is empty"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(SwapError::validation(format!("invalid amount: {trimmed}")));
        }
        if fraction.len() > AMOUNT_DECIMALS as usize {
            return Err(SwapError::validation(format!(
                "amount supports at most {AMOUNT_DECIMALS} decimal places"
            )));
        }

        let parse = |digits: &str| -> Result<U256, SwapError> {
            if digits.is_empty() {
                return Ok(U256::ZERO);
            }
            U256::from_str_radix(digits, 10)
                .map_err(|e| SwapError::validation(format!("invalid amount: {e}")))
        };

        let scale = U256::from(10u64).pow(U256::from(AMOUNT_DECIMALS));
        let padded = format!("{:0<width$}", fraction, width = AMOUNT_DECIMALS as usize);
        let whole_raw = parse(whole)?;
        let fraction_raw = parse(&padded)?;
        let raw = whole_raw
            .checked_mul(scale)
            .and_then(|w| w.checked_add(fraction_raw))
            .ok_or_else(|| SwapError::validation("amount is too large"))?;

        Ok(Self { raw })
    }
}

/// Format a raw amount with the specified number of decimals.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    if raw.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw / divisor;
    let remainder = raw % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Receipt of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: B256,
    /// Block number where the transaction was included
    pub block_number: u64,
}

impl TxReceipt {
    /// Explorer link for this transaction on the given network.
    pub fn explorer_url(&self, network: &NetworkConfig) -> String {
        format!("{}/tx/{}", network.explorer_url, self.tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(1_000_000u64), 6), "1");
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_amount(U256::ZERO, 6), "0");
    }

    #[test]
    fn parse_amount_scales_to_six_decimals() {
        let amount: DecryptedAmount = "12.5".parse().unwrap();
        assert_eq!(amount.raw(), U256::from(12_500_000u64));
        assert_eq!(amount.to_string(), "12.5");

        let whole: DecryptedAmount = "3".parse().unwrap();
        assert_eq!(whole.raw(), U256::from(3_000_000u64));

        let leading_dot: DecryptedAmount = ".25".parse().unwrap();
        assert_eq!(leading_dot.raw(), U256::from(250_000u64));
    }

    #[test]
    fn parse_amount_rejects_bad_input() {
        assert!(matches!(
            "1.0000001".parse::<DecryptedAmount>(),
            Err(SwapError::Validation(_))
        ));
        assert!(matches!(
            "-1".parse::<DecryptedAmount>(),
            Err(SwapError::Validation(_))
        ));
        assert!(matches!(
            "0x10".parse::<DecryptedAmount>(),
            Err(SwapError::Validation(_))
        ));
        assert!(matches!(
            "".parse::<DecryptedAmount>(),
            Err(SwapError::Validation(_))
        ));
    }

    #[test]
    fn network_validation() {
        assert_eq!(ensure_sepolia_network(None).unwrap().chain_id, 11155111);
        assert!(ensure_sepolia_network(Some(" Sepolia ")).is_ok());
        assert!(ensure_sepolia_network(Some("mainnet")).is_err());
    }

    #[test]
    fn receipt_explorer_url() {
        let receipt = TxReceipt {
            tx_hash: B256::repeat_byte(0xab),
            block_number: 7,
        };
        let url = receipt.explorer_url(&FHE_SEPOLIA);
        assert!(url.starts_with("https://sepolia.etherscan.io/tx/0xabab"));
    }
}
