// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Confidential-compute network collaborator.
//!
//! The network decrypts ciphertexts for a user who proves, by signature,
//! that they hold the key the ciphertext was shared with, and evaluates
//! swap quotes homomorphically. Requests are unauthenticated without the
//! signature and are rejected by the network.

use alloy::primitives::{Address, Signature, U256};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::blockchain::{CiphertextHandle, ContractAddress, Token};
use crate::error::{SwapError, SwapResult};

/// Message a signer signs to authorize one user decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptAuthorization {
    pub request_id: Uuid,
    pub handle: String,
    pub contract_address: String,
    pub user_address: String,
    /// Unix seconds from which the authorization is valid
    pub start_timestamp: i64,
    pub duration_days: u32,
}

impl DecryptAuthorization {
    pub fn new(
        handle: CiphertextHandle,
        contract: ContractAddress,
        user: Address,
        duration_days: u32,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            handle: handle.to_string(),
            contract_address: format!("{contract:?}"),
            user_address: format!("{user:?}"),
            start_timestamp: Utc::now().timestamp(),
            duration_days,
        }
    }

    /// Canonical bytes handed to the signer.
    pub fn signing_payload(&self) -> SwapResult<Vec<u8>> {
        signing_payload(self)
    }
}

/// A decryption request together with its authorization signature.
#[derive(Debug, Clone)]
pub struct SignedDecryptRequest {
    pub handle: CiphertextHandle,
    pub contract: ContractAddress,
    pub authorization: DecryptAuthorization,
    pub signature: Signature,
}

/// Homomorphic operation evaluated by the compute network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ComputeOperation {
    /// Evaluate output amount and minimum output after slippage.
    SwapQuote { slippage_bps: u16 },
}

/// Inputs of a swap quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteInputs {
    pub input_token: String,
    pub output_token: String,
    pub encrypted_input: String,
    /// Decrypted input amount in smallest units
    pub input_amount: String,
    pub user_address: String,
}

impl QuoteInputs {
    pub fn new(
        input_token: &Token,
        output_token: &Token,
        encrypted_input: CiphertextHandle,
        input_amount: U256,
        user: Address,
    ) -> Self {
        Self {
            input_token: input_token.address_hex(),
            output_token: output_token.address_hex(),
            encrypted_input: encrypted_input.to_string(),
            input_amount: input_amount.to_string(),
            user_address: format!("{user:?}"),
        }
    }
}

/// A compute request; serialized form is what the signer signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeRequest {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub operation: ComputeOperation,
    pub inputs: QuoteInputs,
}

impl ComputeRequest {
    pub fn swap_quote(inputs: QuoteInputs, slippage_bps: u16) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation: ComputeOperation::SwapQuote { slippage_bps },
            inputs,
        }
    }

    /// Canonical bytes handed to the signer.
    pub fn signing_payload(&self) -> SwapResult<Vec<u8>> {
        signing_payload(self)
    }
}

fn signing_payload<T: Serialize>(value: &T) -> SwapResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| SwapError::validation(format!("failed to encode request: {e}")))
}

/// The confidential-compute network (relayer / coprocessor gateway).
#[async_trait]
pub trait ComputeNetwork: Send + Sync {
    /// Decrypt a ciphertext for the signer named in the authorization.
    async fn request_decrypt(&self, request: &SignedDecryptRequest) -> SwapResult<U256>;

    /// Evaluate `request` homomorphically, returning freshly produced
    /// ciphertexts in operation-defined order.
    async fn request_compute(
        &self,
        request: &ComputeRequest,
        signature: &Signature,
    ) -> SwapResult<Vec<CiphertextHandle>>;
}
