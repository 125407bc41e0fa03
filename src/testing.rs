// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Signature, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::blockchain::{
    AuthorizationReceipt, CiphertextHandle, ContractAddress, DecryptedAmount, LedgerReader,
    ReserveHandles, SessionSigner, SwapContract, Token, TxReceipt,
};
use crate::compute::{ComputeNetwork, ComputeOperation, ComputeRequest, SignedDecryptRequest};
use crate::error::{SwapError, SwapResult};

pub fn handle(byte: u8) -> CiphertextHandle {
    CiphertextHandle::new(B256::repeat_byte(byte))
}

fn numbered_handle(base: u64, n: u64) -> CiphertextHandle {
    CiphertextHandle::new(B256::from(U256::from(base + n).to_be_bytes::<32>()))
}

pub fn token_a() -> Token {
    Token::new(Address::repeat_byte(0xaa), "TokenA")
}

pub fn token_b() -> Token {
    Token::new(Address::repeat_byte(0xbb), "TokenB")
}

pub fn amount(text: &str) -> DecryptedAmount {
    text.parse().unwrap()
}

/// Signer backed by a deterministic local key that can be told to decline.
pub struct FakeSigner {
    inner: PrivateKeySigner,
    prompts: AtomicUsize,
    /// Prompts beyond this many are declined
    allow: Mutex<Option<usize>>,
}

impl FakeSigner {
    pub fn new(key_byte: u8) -> Self {
        Self {
            inner: PrivateKeySigner::from_slice(&[key_byte; 32]).unwrap(),
            prompts: AtomicUsize::new(0),
            allow: Mutex::new(None),
        }
    }

    pub fn arc(key_byte: u8) -> Arc<Self> {
        Arc::new(Self::new(key_byte))
    }

    pub fn reject_all(&self) {
        *self.allow.lock().unwrap() = Some(self.prompts());
    }

    /// Accept `n` more prompts, then decline.
    pub fn accept_next(&self, n: usize) {
        *self.allow.lock().unwrap() = Some(self.prompts() + n);
    }

    pub fn accept_all(&self) {
        *self.allow.lock().unwrap() = None;
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionSigner for FakeSigner {
    fn address(&self) -> Address {
        SessionSigner::address(&self.inner)
    }

    async fn sign_message(&self, message: &[u8]) -> SwapResult<Signature> {
        let prompt = self.prompts.fetch_add(1, Ordering::SeqCst);
        if let Some(allowed) = *self.allow.lock().unwrap() {
            if prompt >= allowed {
                return Err(SwapError::user_rejected("signature request declined"));
            }
        }
        SessionSigner::sign_message(&self.inner, message).await
    }
}

/// Compute network that checks signatures and evaluates quotes at a fixed
/// 2:1 rate.
#[derive(Default)]
pub struct FakeComputeNetwork {
    plaintexts: Mutex<HashMap<CiphertextHandle, U256>>,
    decrypt_calls: AtomicUsize,
    compute_calls: AtomicU64,
    fail_decrypt: AtomicBool,
    fail_compute: AtomicBool,
    truncate_outputs: AtomicBool,
}

impl FakeComputeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_plaintext(&self, handle: CiphertextHandle, raw: u64) {
        self.set_plaintext_raw(handle, U256::from(raw));
    }

    pub fn set_plaintext_raw(&self, handle: CiphertextHandle, raw: U256) {
        self.plaintexts.lock().unwrap().insert(handle, raw);
    }

    pub fn fail_decrypts(&self, fail: bool) {
        self.fail_decrypt.store(fail, Ordering::SeqCst);
    }

    pub fn fail_computes(&self, fail: bool) {
        self.fail_compute.store(fail, Ordering::SeqCst);
    }

    /// Return a single ciphertext from the next computations.
    pub fn truncate_outputs(&self, truncate: bool) {
        self.truncate_outputs.store(truncate, Ordering::SeqCst);
    }

    pub fn decrypt_calls(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    pub fn compute_calls(&self) -> u64 {
        self.compute_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComputeNetwork for FakeComputeNetwork {
    async fn request_decrypt(&self, request: &SignedDecryptRequest) -> SwapResult<U256> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let payload = request.authorization.signing_payload()?;
        let recovered = request
            .signature
            .recover_address_from_msg(&payload)
            .map_err(|e| SwapError::network(e.to_string()))?;
        if format!("{recovered:?}") != request.authorization.user_address {
            return Err(SwapError::network("authorization signature mismatch"));
        }
        if self.fail_decrypt.load(Ordering::SeqCst) {
            return Err(SwapError::network("relayer unavailable"));
        }

        self.plaintexts
            .lock()
            .unwrap()
            .get(&request.handle)
            .copied()
            .ok_or_else(|| SwapError::network("unknown ciphertext"))
    }

    async fn request_compute(
        &self,
        request: &ComputeRequest,
        signature: &Signature,
    ) -> SwapResult<Vec<CiphertextHandle>> {
        let n = self.compute_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let payload = request.signing_payload()?;
        let recovered = signature
            .recover_address_from_msg(&payload)
            .map_err(|e| SwapError::network(e.to_string()))?;
        if format!("{recovered:?}") != request.inputs.user_address {
            return Err(SwapError::network("compute signature mismatch"));
        }
        if self.fail_compute.load(Ordering::SeqCst) {
            return Err(SwapError::network("coprocessor unavailable"));
        }

        let ComputeOperation::SwapQuote { slippage_bps } = request.operation;
        let input = U256::from_str_radix(&request.inputs.input_amount, 10)
            .map_err(|e| SwapError::network(e.to_string()))?;
        let output = input * U256::from(2u64);
        let min_out = output * U256::from(10_000u64 - slippage_bps as u64) / U256::from(10_000u64);

        let output_handle = numbered_handle(0xf000, n * 2);
        let min_out_handle = numbered_handle(0xf000, n * 2 + 1);
        self.set_plaintext_raw(output_handle, output);
        self.set_plaintext_raw(min_out_handle, min_out);

        if self.truncate_outputs.load(Ordering::SeqCst) {
            Ok(vec![output_handle])
        } else {
            Ok(vec![output_handle, min_out_handle])
        }
    }
}

/// Swap contract that records encrypted amounts with the fake network.
pub struct FakeSwapContract {
    address: ContractAddress,
    network: Arc<FakeComputeNetwork>,
    authorize_calls: AtomicU64,
    swap_calls: AtomicU64,
    fail_swap: AtomicBool,
    /// Plaintext recorded for the next authorization instead of the amount
    misreport: Mutex<Option<U256>>,
    last_swap: Mutex<Option<(CiphertextHandle, CiphertextHandle)>>,
}

impl FakeSwapContract {
    pub fn new(network: Arc<FakeComputeNetwork>) -> Self {
        Self {
            address: Address::repeat_byte(0x5a),
            network,
            authorize_calls: AtomicU64::new(0),
            swap_calls: AtomicU64::new(0),
            fail_swap: AtomicBool::new(false),
            misreport: Mutex::new(None),
            last_swap: Mutex::new(None),
        }
    }

    pub fn fail_swaps(&self, fail: bool) {
        self.fail_swap.store(fail, Ordering::SeqCst);
    }

    pub fn misreport_next(&self, raw: u64) {
        *self.misreport.lock().unwrap() = Some(U256::from(raw));
    }

    pub fn authorize_calls(&self) -> u64 {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn swap_calls(&self) -> u64 {
        self.swap_calls.load(Ordering::SeqCst)
    }

    pub fn last_swap(&self) -> Option<(CiphertextHandle, CiphertextHandle)> {
        *self.last_swap.lock().unwrap()
    }

    fn receipt(&self, n: u64) -> TxReceipt {
        TxReceipt {
            tx_hash: B256::from(U256::from(n + 1).to_be_bytes::<32>()),
            block_number: 100 + n,
        }
    }
}

#[async_trait]
impl SwapContract for FakeSwapContract {
    fn address(&self) -> ContractAddress {
        self.address
    }

    async fn authorize(
        &self,
        token: &Token,
        amount: DecryptedAmount,
        signer: &dyn SessionSigner,
    ) -> SwapResult<AuthorizationReceipt> {
        let n = self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        signer
            .sign_message(format!("approve {}", token.address_hex()).as_bytes())
            .await?;
        tokio::task::yield_now().await;

        let encrypted_amount = numbered_handle(0xa000, n);
        let recorded = self
            .misreport
            .lock()
            .unwrap()
            .take()
            .unwrap_or(amount.raw());
        self.network.set_plaintext_raw(encrypted_amount, recorded);

        Ok(AuthorizationReceipt {
            receipt: self.receipt(n),
            encrypted_amount,
        })
    }

    async fn swap(
        &self,
        output_amount: CiphertextHandle,
        min_out_amount: CiphertextHandle,
        signer: &dyn SessionSigner,
    ) -> SwapResult<TxReceipt> {
        let n = self.swap_calls.fetch_add(1, Ordering::SeqCst);
        signer.sign_message(b"swap").await?;
        tokio::task::yield_now().await;

        if self.fail_swap.load(Ordering::SeqCst) {
            return Err(SwapError::network("transaction reverted"));
        }
        *self.last_swap.lock().unwrap() = Some((output_amount, min_out_amount));
        Ok(self.receipt(1_000 + n))
    }
}

/// Ledger with settable balance and reserve handles.
#[derive(Default)]
pub struct FakeLedger {
    balances: Mutex<HashMap<(ContractAddress, Address), CiphertextHandle>>,
    reserves: Mutex<Option<ReserveHandles>>,
    fail: AtomicBool,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, token: ContractAddress, owner: Address, handle: CiphertextHandle) {
        self.balances.lock().unwrap().insert((token, owner), handle);
    }

    pub fn set_reserves(&self, reserves: ReserveHandles) {
        *self.reserves.lock().unwrap() = Some(reserves);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerReader for FakeLedger {
    async fn confidential_balance_of(
        &self,
        token: ContractAddress,
        owner: Address,
    ) -> SwapResult<CiphertextHandle> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SwapError::network("rpc unavailable"));
        }
        self.balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .ok_or_else(|| SwapError::network("balance not initialized"))
    }

    async fn reserves(&self, _pool: ContractAddress) -> SwapResult<ReserveHandles> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SwapError::network("rpc unavailable"));
        }
        self.reserves
            .lock()
            .unwrap()
            .ok_or_else(|| SwapError::network("pool has no reserves"))
    }
}
