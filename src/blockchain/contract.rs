// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain collaborators of the swap core.
//!
//! The core treats contract calls as opaque async operations: call-data
//! encoding, gas, and transport belong to the implementor.

use alloy::primitives::Address;
use async_trait::async_trait;

use super::signing::SessionSigner;
use super::types::{CiphertextHandle, ContractAddress, DecryptedAmount, Token, TxReceipt};
use crate::error::SwapResult;

/// Result of authorizing the swap contract on the caller's encrypted balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationReceipt {
    pub receipt: TxReceipt,
    /// Encrypted input amount the swap contract is now allowed to spend.
    pub encrypted_amount: CiphertextHandle,
}

/// The confidential swap contract.
#[async_trait]
pub trait SwapContract: Send + Sync {
    /// Address of the swap contract; decryption of swap-scoped ciphertexts
    /// is requested against it.
    fn address(&self) -> ContractAddress;

    /// Allow the swap contract to operate on `amount` of the caller's
    /// encrypted `token` balance.
    async fn authorize(
        &self,
        token: &Token,
        amount: DecryptedAmount,
        signer: &dyn SessionSigner,
    ) -> SwapResult<AuthorizationReceipt>;

    /// Submit the swap using previously computed ciphertexts.
    async fn swap(
        &self,
        output_amount: CiphertextHandle,
        min_out_amount: CiphertextHandle,
        signer: &dyn SessionSigner,
    ) -> SwapResult<TxReceipt>;
}

/// Current ciphertext handles of a pool's reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveHandles {
    pub token_a: CiphertextHandle,
    pub token_b: CiphertextHandle,
}

/// Read-only view of confidential ledger state.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Encrypted balance handle of `owner` in `token`.
    async fn confidential_balance_of(
        &self,
        token: ContractAddress,
        owner: Address,
    ) -> SwapResult<CiphertextHandle>;

    /// Encrypted reserve handles of `pool`.
    async fn reserves(&self, pool: ContractAddress) -> SwapResult<ReserveHandles>;
}
