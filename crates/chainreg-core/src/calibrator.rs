//! Binary search for the largest batch size whose gas stays under a limit.
//!
//! The search keeps two bounds: `known_good`, a size measured at or below the
//! limit, and `known_bad`, a size assumed to be above it (initially the
//! configured upper bound). Each probe halves the gap, so a search costs at
//! most `1 + ceil(log2(upper_bound))` probes.
//!
//! Correctness assumes gas is non-decreasing in batch size. This is not
//! checked.

use serde::{Deserialize, Serialize};

use crate::error::RegistrationError;
use crate::registry::CostProbe;
use crate::synthetic;
use crate::types::{BatchConfig, Cost};

/// Configuration for the batch-size search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratorConfig {
    /// Batch size assumed to exceed any realistic limit. With a bound of 2 or
    /// more the search never returns a size at or above it; with a bound of 0
    /// or 1 it returns 1 after the single-address probe.
    ///
    /// The default of 400 registrations is roughly 9M gas. It tracks the
    /// network's block gas limit and needs revisiting when that changes.
    #[serde(default = "default_upper_bound")]
    pub upper_bound: usize,
}

fn default_upper_bound() -> usize {
    400
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            upper_bound: default_upper_bound(),
        }
    }
}

/// Discovers the maximum safe batch size against a [`CostProbe`].
pub struct Calibrator<'a, P: ?Sized> {
    probe: &'a P,
    config: CalibratorConfig,
}

impl<'a, P: CostProbe + ?Sized> Calibrator<'a, P> {
    pub fn new(probe: &'a P, config: CalibratorConfig) -> Self {
        Self { probe, config }
    }

    /// Measure the gas of registering `size` synthetic addresses.
    ///
    /// Probe failures become [`Cost::Exceeded`].
    pub async fn measure(&self, size: usize) -> Cost {
        let addresses = synthetic::random_addresses(size);
        match self.probe.estimate_cost(&addresses, true).await {
            Ok(gas) => {
                tracing::debug!(size, gas, "probed batch cost");
                Cost::Units(gas)
            }
            Err(e) => {
                tracing::debug!(size, error = %e, "probe rejected, treating cost as exceeded");
                Cost::Exceeded
            }
        }
    }

    /// Find the largest batch size whose measured gas is at most `limit`.
    pub async fn calibrate(&self, limit: u64) -> Result<BatchConfig, RegistrationError> {
        let single = self.measure(1).await;
        if !single.fits(limit) {
            return Err(RegistrationError::LimitTooLow {
                limit,
                single_cost: single,
            });
        }

        let mut known_good = 1usize;
        let mut known_bad = self.config.upper_bound;
        let mut usage = single;

        while known_bad.saturating_sub(known_good) > 1 {
            let mid = known_good + (known_bad - known_good) / 2;
            let cost = self.measure(mid).await;
            if cost.fits(limit) {
                known_good = mid;
                usage = cost;
            } else {
                known_bad = mid;
            }
        }

        tracing::info!(
            limit,
            size = known_good,
            gas = %usage,
            "calibrated batch size"
        );

        Ok(BatchConfig {
            size: known_good,
            resource_usage: usage,
        })
    }
}
