//! Shared data types for calibration, planning and submission.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::calibrator::CalibratorConfig;

/// Gas cost of an operation as reported by a probe.
///
/// `Exceeded` means the remote node refused to estimate the operation at all
/// (it would not fit in a block). It orders above every finite cost so it can
/// be compared against a limit like any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cost {
    Units(u64),
    Exceeded,
}

impl Cost {
    /// The finite gas amount, if any.
    pub fn units(self) -> Option<u64> {
        match self {
            Self::Units(n) => Some(n),
            Self::Exceeded => None,
        }
    }

    /// Returns `true` if this cost stays at or below `limit`.
    pub fn fits(self, limit: u64) -> bool {
        self <= Cost::Units(limit)
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Units(n) => write!(f, "{n}"),
            Self::Exceeded => write!(f, "exceeded"),
        }
    }
}

/// Calibrated batch size together with the gas measured for exactly that size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Addresses per batch (always >= 1).
    pub size: usize,
    /// Gas measured for a batch of `size` addresses.
    pub resource_usage: Cost,
}

/// Batch progress counters for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Configuration for one registration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Max gas for every batch transaction.
    #[serde(default = "default_resource_limit")]
    pub resource_limit: u64,
    /// Explicit batch size. `None` = calibrate against `resource_limit`.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Skip addresses the registry already reports as registered.
    #[serde(default = "default_filter_registered")]
    pub filter_registered: bool,
    /// Binary-search settings.
    #[serde(default)]
    pub calibration: CalibratorConfig,
}

fn default_resource_limit() -> u64 {
    1_000_000
}

fn default_filter_registered() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            resource_limit: default_resource_limit(),
            batch_size: None,
            filter_registered: default_filter_registered(),
            calibration: CalibratorConfig::default(),
        }
    }
}

/// Everything decided before the first submission.
///
/// `batches` is fixed once the plan is built; executing the plan never
/// re-reads registration state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPlan {
    /// The single identity every batch is submitted from.
    pub identity: Address,
    pub batch_config: BatchConfig,
    /// Number of addresses supplied by the caller.
    pub input_count: usize,
    /// Number of addresses dropped because they were already registered.
    pub skipped_count: usize,
    pub batches: Vec<Vec<Address>>,
}

impl RegistrationPlan {
    /// Number of addresses that will be submitted.
    pub fn address_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

/// Outcome of a fully completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub batches_submitted: usize,
    pub addresses_registered: usize,
}
