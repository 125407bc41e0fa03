// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap error taxonomy.
//!
//! Every core operation either succeeds or fails with one of these variants,
//! leaving all state exactly as it was before the call. The presentation
//! layer decides how to surface them (toast, inline message).

/// Errors returned by the swap core.
///
/// `Clone` because a single in-flight decryption hands its result to every
/// caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    /// Missing signer, connection, reserve data, or wrong swap state.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Duplicate token selection or another input-side violation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The signer declined a signature or authorization prompt.
    #[error("User rejected the request: {0}")]
    UserRejected(String),

    /// Compute-network or chain RPC failure.
    #[error("Network error: {0}")]
    Network(String),
}

impl SwapError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::UserRejected(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            SwapError::Precondition(_) => "precondition_failed",
            SwapError::Validation(_) => "validation_failed",
            SwapError::UserRejected(_) => "user_rejected",
            SwapError::Network(_) => "network_error",
        }
    }
}

pub type SwapResult<T> = Result<T, SwapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_variant_and_message() {
        let pre = SwapError::precondition("no signer");
        assert_eq!(pre, SwapError::Precondition("no signer".to_string()));
        assert_eq!(pre.error_code(), "precondition_failed");

        let val = SwapError::validation("same token");
        assert_eq!(val.error_code(), "validation_failed");

        let rej = SwapError::user_rejected("declined");
        assert_eq!(rej.error_code(), "user_rejected");

        let net = SwapError::network("timeout");
        assert_eq!(net.error_code(), "network_error");
    }

    #[test]
    fn display_includes_message() {
        let err = SwapError::validation("cannot select the same token");
        assert_eq!(
            err.to_string(),
            "Validation failed: cannot select the same token"
        );
    }
}
