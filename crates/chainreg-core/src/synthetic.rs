//! Synthetic addresses used only to drive cost probes.
//!
//! These never mix with the caller's input list.

use alloy_primitives::Address;

/// `n` uniformly random addresses.
pub fn random_addresses(n: usize) -> Vec<Address> {
    (0..n).map(|_| Address::random()).collect()
}
