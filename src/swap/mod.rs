// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Orchestrator
//!
//! Drives one confidential swap through `Idle -> Authorized -> Calculated ->
//! Swapped`:
//!
//! 1. **authorize**: the swap contract is allowed to spend the entered amount
//!    of the encrypted input balance; the contract returns the encrypted
//!    input handle.
//! 2. **calculate**: two signatures. The encrypted input is decrypted and
//!    checked against the entered amount, then the compute network
//!    evaluates the output and the minimum output after slippage.
//! 3. **swap**: the swap is submitted with the two computed ciphertexts.
//!
//! Each transition either applies completely or leaves the state as it was.
//! While a transition is pending every other mutation is rejected. Any
//! change of the wallet session resets the swap to `Idle`, and a transition
//! that completes under a different session is discarded.

pub mod intent;

use std::sync::{Arc, Mutex, MutexGuard};

use futures::try_join;
use tracing::{debug, info, warn};

use crate::blockchain::{
    CiphertextHandle, DecryptedAmount, SessionSigner, SwapContract, Token, TxReceipt,
};
use crate::compute::{ComputeNetwork, ComputeRequest, QuoteInputs};
use crate::decryption::DecryptionService;
use crate::error::{SwapError, SwapResult};
use crate::registry::TokenRegistry;
use crate::session::WalletSession;

pub use intent::{
    next_action, NextAction, QuoteReveal, Side, SwapIntent, SwapState, SwapView, Transition,
};

/// Number of ciphertexts a swap quote produces: output and minimum output.
const QUOTE_OUTPUTS: usize = 2;

struct PendingTransition {
    kind: Transition,
    ticket: u64,
}

struct OrchestratorState {
    state: SwapState,
    intent: SwapIntent,
    pending: Option<PendingTransition>,
    /// Encrypted input amount returned by the last authorization
    encrypted_input: Option<CiphertextHandle>,
    last_receipt: Option<TxReceipt>,
    epoch: u64,
    next_ticket: u64,
}

impl OrchestratorState {
    fn reset(&mut self) {
        self.state = SwapState::Idle;
        self.intent.clear_quote();
        self.encrypted_input = None;
    }

    fn ensure_idle_for_edit(&self) -> SwapResult<()> {
        match &self.pending {
            Some(pending) => Err(SwapError::precondition(format!(
                "{} already in progress",
                pending.kind
            ))),
            None => Ok(()),
        }
    }
}

pub struct SwapOrchestrator {
    session: WalletSession,
    decryption: Arc<DecryptionService>,
    contract: Arc<dyn SwapContract>,
    network: Arc<dyn ComputeNetwork>,
    slippage_bps: u16,
    inner: Mutex<OrchestratorState>,
}

/// Marks a transition as pending until dropped.
///
/// Dropping without [`TransitionGuard::complete`] (error or cancellation)
/// releases the pending slot and leaves the state untouched.
struct TransitionGuard<'a> {
    owner: &'a SwapOrchestrator,
    kind: Transition,
    ticket: u64,
    epoch: u64,
}

impl TransitionGuard<'_> {
    fn complete<F>(self, apply: F) -> SwapResult<()>
    where
        F: FnOnce(&mut OrchestratorState),
    {
        let mut inner = self.owner.lock();
        let current = inner
            .pending
            .as_ref()
            .is_some_and(|p| p.ticket == self.ticket);
        if !current || inner.epoch != self.epoch {
            warn!(transition = %self.kind, "Wallet session changed, discarding result");
            return Err(SwapError::precondition(format!(
                "wallet session changed during {}",
                self.kind
            )));
        }
        apply(&mut *inner);
        Ok(())
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.owner.lock();
        if inner
            .pending
            .as_ref()
            .is_some_and(|p| p.ticket == self.ticket)
        {
            inner.pending = None;
        }
    }
}

impl SwapOrchestrator {
    /// Start with the first two distinct catalog tokens.
    pub fn new(
        registry: &TokenRegistry,
        session: WalletSession,
        decryption: Arc<DecryptionService>,
        contract: Arc<dyn SwapContract>,
        network: Arc<dyn ComputeNetwork>,
        slippage_bps: u16,
    ) -> SwapResult<Self> {
        let (input, output) = registry.defaults()?;
        let intent = SwapIntent::new(input, output)?;
        let epoch = session.epoch();
        Ok(Self {
            session,
            decryption,
            contract,
            network,
            slippage_bps,
            inner: Mutex::new(OrchestratorState {
                state: SwapState::Idle,
                intent,
                pending: None,
                encrypted_input: None,
                last_receipt: None,
                epoch,
                next_ticket: 0,
            }),
        })
    }

    /// Lock the state, first resetting it if the session changed.
    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let epoch = self.session.epoch();
        if inner.epoch != epoch {
            debug!(from = inner.epoch, to = epoch, state = ?inner.state, "Session changed, resetting swap");
            inner.epoch = epoch;
            inner.pending = None;
            inner.reset();
        }
        inner
    }

    /// Apply a pending session change now. Returns the current state.
    pub fn sync_session(&self) -> SwapState {
        self.lock().state
    }

    /// Reserve the pending slot for `kind` if the state allows it.
    fn begin(
        &self,
        kind: Transition,
        required: &[SwapState],
    ) -> SwapResult<(TransitionGuard<'_>, Arc<dyn SessionSigner>)> {
        let mut inner = self.lock();
        inner.ensure_idle_for_edit()?;

        let signer = self
            .session
            .snapshot()
            .active_signer()
            .ok_or_else(|| SwapError::precondition("wallet is not connected"))?;

        if !required.contains(&inner.state) {
            return Err(SwapError::precondition(format!(
                "{kind} is not possible in state {:?}",
                inner.state
            )));
        }

        let ticket = inner.next_ticket;
        inner.next_ticket += 1;
        inner.pending = Some(PendingTransition { kind, ticket });
        let epoch = inner.epoch;
        drop(inner);

        Ok((
            TransitionGuard {
                owner: self,
                kind,
                ticket,
                epoch,
            },
            signer,
        ))
    }

    /// Authorize the swap contract on the entered input amount.
    pub async fn authorize(&self) -> SwapResult<TxReceipt> {
        let (guard, signer) = self.begin(Transition::Authorize, &[SwapState::Idle])?;
        let (token, amount) = {
            let inner = self.lock();
            (inner.intent.input_token.clone(), inner.intent.input_amount)
        };
        if amount.is_zero() {
            return Err(SwapError::validation("enter an amount to swap"));
        }

        let authorization = self
            .contract
            .authorize(&token, amount, signer.as_ref())
            .await
            .inspect_err(|e| warn!(token = %token.ticker, error = %e, "Authorization failed"))?;

        let receipt = authorization.receipt.clone();
        guard.complete(|s| {
            s.state = SwapState::Authorized;
            s.intent.clear_quote();
            s.encrypted_input = Some(authorization.encrypted_amount);
            s.last_receipt = Some(authorization.receipt);
        })?;

        info!(
            token = %token.ticker,
            encrypted_input = %authorization.encrypted_amount,
            tx_hash = %receipt.tx_hash,
            "Swap authorized"
        );
        Ok(receipt)
    }

    /// Compute the encrypted output and minimum output of the swap.
    pub async fn calculate(&self) -> SwapResult<(CiphertextHandle, CiphertextHandle)> {
        let (guard, signer) = self.begin(Transition::Calculate, &[SwapState::Authorized])?;
        let (input_token, output_token, amount, encrypted_input) = {
            let inner = self.lock();
            let encrypted_input = inner
                .encrypted_input
                .ok_or_else(|| SwapError::precondition("authorize the swap first"))?;
            (
                inner.intent.input_token.clone(),
                inner.intent.output_token.clone(),
                inner.intent.input_amount,
                encrypted_input,
            )
        };

        // First signature: reveal the authorized input amount. Never served
        // from settled results, so every attempt asks for both signatures.
        let authorized = self
            .decryption
            .decrypt_uncached(encrypted_input, self.contract.address(), Some(signer.clone()))
            .await?;
        if authorized != amount {
            warn!(
                encrypted_input = %encrypted_input,
                "Authorized amount differs from entered amount"
            );
            return Err(SwapError::validation(
                "authorized amount does not match the entered amount",
            ));
        }

        // Second signature: evaluate the quote on the compute network.
        let (output, min_out) = self
            .quote(&input_token, &output_token, encrypted_input, amount, signer.as_ref())
            .await
            .inspect_err(|e| warn!(error = %e, "Swap calculation failed"))?;

        guard.complete(|s| {
            s.state = SwapState::Calculated;
            s.intent.output_amount = Some(output);
            s.intent.min_out_amount = Some(min_out);
        })?;

        info!(
            input = %input_token.ticker,
            output = %output_token.ticker,
            output_handle = %output,
            "Swap calculated"
        );
        Ok((output, min_out))
    }

    async fn quote(
        &self,
        input_token: &Token,
        output_token: &Token,
        encrypted_input: CiphertextHandle,
        amount: DecryptedAmount,
        signer: &dyn SessionSigner,
    ) -> SwapResult<(CiphertextHandle, CiphertextHandle)> {
        let inputs = QuoteInputs::new(
            input_token,
            output_token,
            encrypted_input,
            amount.raw(),
            signer.address(),
        );
        let request = ComputeRequest::swap_quote(inputs, self.slippage_bps);
        let signature = signer.sign_message(&request.signing_payload()?).await?;

        let handles = self.network.request_compute(&request, &signature).await?;
        match handles.as_slice() {
            [output, min_out] => Ok((*output, *min_out)),
            other => Err(SwapError::network(format!(
                "compute network returned {} ciphertexts, expected {QUOTE_OUTPUTS}",
                other.len()
            ))),
        }
    }

    /// Submit the calculated swap.
    pub async fn swap(&self) -> SwapResult<TxReceipt> {
        let (guard, signer) = self.begin(Transition::Swap, &[SwapState::Calculated])?;
        let (output, min_out) = {
            let inner = self.lock();
            match (inner.intent.output_amount, inner.intent.min_out_amount) {
                (Some(output), Some(min_out)) => (output, min_out),
                _ => return Err(SwapError::precondition("calculate the swap first")),
            }
        };

        let receipt = self
            .contract
            .swap(output, min_out, signer.as_ref())
            .await
            .inspect_err(|e| warn!(error = %e, "Swap submission failed"))?;

        let confirmed = receipt.clone();
        guard.complete(|s| {
            s.state = SwapState::Swapped;
            s.last_receipt = Some(confirmed);
        })?;

        info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "Swap submitted");
        Ok(receipt)
    }

    /// Swap input and output tokens.
    pub fn change(&self) -> SwapResult<()> {
        let mut inner = self.lock();
        inner.ensure_idle_for_edit()?;
        inner.intent.flip();
        inner.reset();
        debug!(
            input = %inner.intent.input_token.ticker,
            output = %inner.intent.output_token.ticker,
            "Swap direction changed"
        );
        Ok(())
    }

    /// Select `token` for `side`. Selecting the token of the other side is
    /// rejected; re-selecting the current token changes nothing.
    pub fn select_token(&self, side: Side, token: Token) -> SwapResult<()> {
        let mut inner = self.lock();
        inner.ensure_idle_for_edit()?;
        if let Some(intent) = inner.intent.with_token(side, token)? {
            debug!(side = ?side, token = %intent.token(side).ticker, "Token selected");
            inner.intent = intent;
            inner.reset();
        }
        Ok(())
    }

    /// Set the amount to sell. A different amount voids any authorization.
    pub fn set_input_amount(&self, amount: DecryptedAmount) -> SwapResult<()> {
        let mut inner = self.lock();
        inner.ensure_idle_for_edit()?;
        if inner.intent.input_amount != amount {
            inner.intent.input_amount = amount;
            inner.reset();
        }
        Ok(())
    }

    /// Decrypt the calculated output and minimum output for display.
    pub async fn reveal_quote(&self) -> SwapResult<QuoteReveal> {
        let snapshot = self.session.snapshot();
        let (output, min_out) = {
            let inner = self.lock();
            match (inner.intent.output_amount, inner.intent.min_out_amount) {
                (Some(output), Some(min_out))
                    if matches!(inner.state, SwapState::Calculated | SwapState::Swapped) =>
                {
                    (output, min_out)
                }
                _ => return Err(SwapError::precondition("calculate the swap first")),
            }
        };

        let contract = self.contract.address();
        let signer = snapshot.active_signer();
        let (output, min_out) = try_join!(
            self.decryption.decrypt(output, contract, signer.clone()),
            self.decryption.decrypt(min_out, contract, signer),
        )?;

        if self.session.epoch() != snapshot.epoch {
            return Err(SwapError::precondition(
                "wallet session changed while decrypting",
            ));
        }
        Ok(QuoteReveal { output, min_out })
    }

    pub fn state(&self) -> SwapState {
        self.lock().state
    }

    pub fn intent(&self) -> SwapIntent {
        self.lock().intent.clone()
    }

    pub fn view(&self) -> SwapView {
        let connected = self.session.snapshot().active_signer().is_some();
        let inner = self.lock();
        SwapView {
            state: inner.state,
            intent: inner.intent.clone(),
            pending: inner.pending.as_ref().map(|p| p.kind),
            next_action: next_action(inner.state, connected),
            last_receipt: inner.last_receipt.clone(),
        }
    }
}
