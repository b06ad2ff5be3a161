//! Collaborator traits implemented by registry backends.
//!
//! The engine issues at most one call on these traits at a time. Backends
//! own their own timeouts; any `Err` is terminal for the run, except in
//! [`CostProbe`] where it only means "too expensive".

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::error::RegistryError;

/// Estimates the gas of a registration call without mutating state.
#[async_trait]
pub trait CostProbe: Send + Sync {
    /// Gas needed to set the registration flag of `addresses` to `register`.
    ///
    /// An error means the node could not execute the call, usually because it
    /// would not fit in a block.
    async fn estimate_cost(
        &self,
        addresses: &[Address],
        register: bool,
    ) -> Result<u64, RegistryError>;
}

/// Reads live registration state.
#[async_trait]
pub trait RegistrationQuery: Send + Sync {
    async fn is_registered(&self, address: Address) -> Result<bool, RegistryError>;
}

/// Submits registration batches from a single authorized identity.
#[async_trait]
pub trait RegistrySubmitter: Send + Sync {
    /// The identity all submissions of a run are sent from.
    async fn authorized_identity(&self) -> Result<Address, RegistryError>;

    /// Submit one batch and wait until the remote system accepted or rejected it.
    ///
    /// `gas` is the gas limit to attach; `None` leaves it to the node.
    async fn submit(
        &self,
        addresses: &[Address],
        register: bool,
        gas: Option<u64>,
    ) -> Result<(), RegistryError>;
}
