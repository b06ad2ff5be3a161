//! Sequential, fail-fast batch submission.
//!
//! Invariant: at most one submission is in flight. Each batch is awaited to
//! completion before the next one starts, because every batch is sent from
//! the same identity and the remote ordering guarantees only hold for
//! serialized operations.

use alloy_primitives::Address;

use crate::error::RegistrationError;
use crate::registry::RegistrySubmitter;
use crate::types::{Cost, Progress, RunSummary};

/// Submit `batches` in order, stopping at the first failure.
///
/// `on_progress` is called after every successful batch. Batches already
/// submitted when a later one fails stay submitted.
pub async fn submit_all<S, F>(
    submitter: &S,
    batches: &[Vec<Address>],
    resource_usage: Cost,
    mut on_progress: F,
) -> Result<RunSummary, RegistrationError>
where
    S: RegistrySubmitter + ?Sized,
    F: FnMut(Progress),
{
    let gas = resource_usage.units();
    let mut progress = Progress {
        completed: 0,
        total: batches.len(),
    };
    let mut summary = RunSummary::default();

    for (batch_index, batch) in batches.iter().enumerate() {
        tracing::info!(
            batch = batch_index,
            size = batch.len(),
            completed = progress.completed,
            total = progress.total,
            "submitting batch"
        );

        submitter
            .submit(batch, true, gas)
            .await
            .map_err(|source| RegistrationError::SubmissionFailed {
                batch_index,
                completed: progress.completed,
                total: progress.total,
                source,
            })?;

        progress.completed += 1;
        summary.batches_submitted += 1;
        summary.addresses_registered += batch.len();
        on_progress(progress);
    }

    tracing::info!(
        batches = summary.batches_submitted,
        addresses = summary.addresses_registered,
        "registration succeeded"
    );
    Ok(summary)
}
