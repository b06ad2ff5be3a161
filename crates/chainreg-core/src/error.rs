//! Error types for collaborators and the registration workflow.

use alloy_primitives::Address;
use thiserror::Error;

use crate::types::Cost;

/// Errors returned by a registry backend (probe, query or submission).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport or JSON-RPC level failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    /// The operation did not complete within the configured duration.
    #[error("timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Calldata could not be encoded or return data could not be decoded.
    #[error("ABI error: {0}")]
    Abi(String),

    #[error("{0}")]
    Other(String),
}

/// Errors that terminate a registration run.
///
/// None of these are retried. Recovery is re-running the whole workflow with
/// filtering enabled, which skips every address already registered.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A single-address batch already costs more than the limit.
    #[error("gas limit {limit} is not enough to register a single address (needs {single_cost})")]
    LimitTooLow { limit: u64, single_cost: Cost },

    /// Batch sizes must be at least 1.
    #[error("invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// Registration state of an address could not be read.
    #[error("registration query for {address} failed after {checked}/{total} checks: {source}")]
    QueryFailed {
        address: Address,
        checked: usize,
        total: usize,
        #[source]
        source: RegistryError,
    },

    /// A batch submission failed; later batches were not attempted.
    #[error("batch {batch_index} failed ({completed}/{total} batches submitted): {source}")]
    SubmissionFailed {
        batch_index: usize,
        completed: usize,
        total: usize,
        #[source]
        source: RegistryError,
    },

    /// Resolving the submitting identity failed.
    #[error("could not resolve submitting identity: {0}")]
    Identity(#[source] RegistryError),
}

impl RegistrationError {
    /// Returns `true` if the run stopped before any batch was submitted.
    pub fn is_fatal_before_submission(&self) -> bool {
        match self {
            Self::SubmissionFailed { completed, .. } => *completed == 0,
            _ => true,
        }
    }

    /// Number of batches that were submitted successfully before the failure.
    pub fn completed_batches(&self) -> usize {
        match self {
            Self::SubmissionFailed { completed, .. } => *completed,
            _ => 0,
        }
    }
}
