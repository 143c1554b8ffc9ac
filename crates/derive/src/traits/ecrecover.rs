//! This module contains the [SignedRecoverable] trait.
//!
//! The trait exists to allow for alternative implementations of sender
//! recovery for signed types that can supply the original message hash. It
//! is implemented for [alloy_consensus::TxEnvelope] when the `k256` feature
//! is enabled.

use alloy_primitives::Address;
use thiserror::Error;

#[cfg(feature = "k256")]
use alloy_consensus::TxEnvelope;
#[cfg(feature = "k256")]
use alloy_primitives::{Signature, B256};

/// A failure to recover the sender of a signed transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to recover transaction sender")]
pub struct RecoveryError;

/// Represents a signed transaction whose sender can be recovered.
pub trait SignedRecoverable {
    /// Recovers the sender address from the signature and the message hash.
    fn recover_public_key(&self) -> Result<Address, RecoveryError>;
}

#[cfg(feature = "k256")]
impl SignedRecoverable for TxEnvelope {
    fn recover_public_key(&self) -> Result<Address, RecoveryError> {
        match self {
            Self::Legacy(signed_tx) => {
                recover_address(*signed_tx.signature(), &signed_tx.signature_hash())
            }
            Self::Eip2930(signed_tx) => {
                recover_address(*signed_tx.signature(), &signed_tx.signature_hash())
            }
            Self::Eip1559(signed_tx) => {
                recover_address(*signed_tx.signature(), &signed_tx.signature_hash())
            }
            Self::Eip4844(signed_tx) => {
                recover_address(*signed_tx.signature(), &signed_tx.signature_hash())
            }
            _ => Err(RecoveryError),
        }
    }
}

/// Recovers the sender address from a signature and a message hash.
#[cfg(feature = "k256")]
#[inline]
fn recover_address(sig: Signature, message_hash: &B256) -> Result<Address, RecoveryError> {
    sig.recover_address_from_prehash(message_hash).map_err(|_| RecoveryError)
}
