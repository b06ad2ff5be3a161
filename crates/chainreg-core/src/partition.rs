//! Fixed-size chunking of the address list.

use alloy_primitives::Address;

/// Split `addresses` into consecutive batches of `size`.
///
/// Every batch has exactly `size` addresses except the last, which holds the
/// remainder. Concatenating the batches gives back the input in order.
///
/// # Panics
/// Panics if `size` is 0. Callers validate batch sizes before partitioning.
pub fn partition(addresses: &[Address], size: usize) -> Vec<Vec<Address>> {
    assert!(size > 0, "batch size must be at least 1");
    addresses.chunks(size).map(<[Address]>::to_vec).collect()
}
