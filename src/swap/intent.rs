// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap state, intent, and the pure derivations over them.

use std::fmt;

use serde::Serialize;

use crate::blockchain::{CiphertextHandle, DecryptedAmount, Token, TxReceipt};
use crate::error::{SwapError, SwapResult};

/// Progress of the current swap. Moves forward one step at a time; resets
/// go back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapState {
    #[default]
    Idle,
    Authorized,
    Calculated,
    Swapped,
}

/// Side of the swap a token is selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Input token
    Sell,
    /// Output token
    Buy,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Sell => Side::Buy,
            Side::Buy => Side::Sell,
        }
    }
}

/// A state-advancing operation of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Authorize,
    Calculate,
    Swap,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transition::Authorize => "authorization",
            Transition::Calculate => "calculation",
            Transition::Swap => "swap",
        })
    }
}

/// What the user is trying to swap.
///
/// `input_token` and `output_token` always have different addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapIntent {
    pub input_token: Token,
    pub output_token: Token,
    pub input_amount: DecryptedAmount,
    pub output_amount: Option<CiphertextHandle>,
    pub min_out_amount: Option<CiphertextHandle>,
}

impl SwapIntent {
    pub fn new(input_token: Token, output_token: Token) -> SwapResult<Self> {
        if input_token.address == output_token.address {
            return Err(SwapError::validation("cannot select the same token"));
        }
        Ok(Self {
            input_token,
            output_token,
            input_amount: DecryptedAmount::ZERO,
            output_amount: None,
            min_out_amount: None,
        })
    }

    pub fn token(&self, side: Side) -> &Token {
        match side {
            Side::Sell => &self.input_token,
            Side::Buy => &self.output_token,
        }
    }

    /// Intent with `token` on `side`, or `None` if it is already there.
    pub(crate) fn with_token(&self, side: Side, token: Token) -> SwapResult<Option<Self>> {
        if self.token(side.other()).address == token.address {
            return Err(SwapError::validation("cannot select the same token"));
        }
        if self.token(side).address == token.address {
            return Ok(None);
        }
        let mut next = self.clone();
        match side {
            Side::Sell => next.input_token = token,
            Side::Buy => next.output_token = token,
        }
        next.clear_quote();
        Ok(Some(next))
    }

    pub(crate) fn flip(&mut self) {
        std::mem::swap(&mut self.input_token, &mut self.output_token);
        self.clear_quote();
    }

    pub(crate) fn clear_quote(&mut self) {
        self.output_amount = None;
        self.min_out_amount = None;
    }
}

/// The single action offered to the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Connect,
    Authorize,
    Calculate,
    Swap,
    Done,
}

pub fn next_action(state: SwapState, connected: bool) -> NextAction {
    if !connected {
        return NextAction::Connect;
    }
    match state {
        SwapState::Idle => NextAction::Authorize,
        SwapState::Authorized => NextAction::Calculate,
        SwapState::Calculated => NextAction::Swap,
        SwapState::Swapped => NextAction::Done,
    }
}

/// Decrypted quote of a calculated swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteReveal {
    pub output: DecryptedAmount,
    pub min_out: DecryptedAmount,
}

/// Snapshot of the orchestrator for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapView {
    pub state: SwapState,
    pub intent: SwapIntent,
    pub pending: Option<Transition>,
    pub next_action: NextAction,
    pub last_receipt: Option<TxReceipt>,
}
