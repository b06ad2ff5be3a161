//! The registration workflow: plan a run, then execute it.
//!
//! ```text
//! Idle → Calibrating → [Filtering] → Partitioned → Submitting → Completed
//!            │              │                          │
//!            └──────────────┴──────────→ Aborted ←─────┘
//! ```
//!
//! No state re-enters `Calibrating` or `Filtering`. A failed run is recovered
//! by running the whole workflow again with filtering enabled.

use alloy_primitives::Address;

use crate::calibrator::Calibrator;
use crate::error::RegistrationError;
use crate::filter::filter_unprocessed;
use crate::partition::partition;
use crate::registry::{CostProbe, RegistrationQuery, RegistrySubmitter};
use crate::submitter::submit_all;
use crate::types::{BatchConfig, Progress, RegistrationPlan, RunConfig, RunSummary};

/// Lifecycle state of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing has run yet.
    Idle,
    /// Measuring or searching for the batch size.
    Calibrating,
    /// Checking registration state of the input addresses.
    Filtering,
    /// A plan is ready; nothing has been submitted.
    Partitioned,
    /// Batches are being submitted.
    Submitting,
    /// Every batch was submitted.
    Completed,
    /// The run stopped on an error.
    Aborted,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Calibrating => write!(f, "calibrating"),
            Self::Filtering => write!(f, "filtering"),
            Self::Partitioned => write!(f, "partitioned"),
            Self::Submitting => write!(f, "submitting"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Progress emitted by the workflow for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Calibrated { config: BatchConfig },
    AddressChecked {
        index: usize,
        total: usize,
        address: Address,
        registered: bool,
    },
    Partitioned { addresses: usize, batches: usize },
    BatchSubmitted(Progress),
}

type Observer = Box<dyn Fn(&WorkflowEvent) + Send + Sync>;

fn emit(observer: &Option<Observer>, event: WorkflowEvent) {
    if let Some(f) = observer {
        f(&event);
    }
}

/// Drives calibration, filtering, partitioning and submission against an
/// injected registry backend.
pub struct RegistrationWorkflow<R> {
    registry: R,
    state: WorkflowState,
    observer: Option<Observer>,
}

impl<R> RegistrationWorkflow<R>
where
    R: CostProbe + RegistrationQuery + RegistrySubmitter,
{
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            state: WorkflowState::Idle,
            observer: None,
        }
    }

    /// Register a callback invoked for every [`WorkflowEvent`].
    pub fn on_event<F: Fn(&WorkflowEvent) + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Run `plan` then `execute`.
    pub async fn run(
        &mut self,
        config: &RunConfig,
        addresses: Vec<Address>,
    ) -> Result<RunSummary, RegistrationError> {
        let plan = self.plan(config, addresses).await?;
        self.execute(&plan).await
    }

    /// Decide the batch size, drop already registered addresses and split the
    /// rest into batches. Submits nothing.
    pub async fn plan(
        &mut self,
        config: &RunConfig,
        addresses: Vec<Address>,
    ) -> Result<RegistrationPlan, RegistrationError> {
        let result = self.build_plan(config, addresses).await;
        self.state = match &result {
            Ok(_) => WorkflowState::Partitioned,
            Err(e) => {
                tracing::error!(error = %e, "planning aborted");
                WorkflowState::Aborted
            }
        };
        result
    }

    async fn build_plan(
        &mut self,
        config: &RunConfig,
        addresses: Vec<Address>,
    ) -> Result<RegistrationPlan, RegistrationError> {
        if config.batch_size == Some(0) {
            return Err(RegistrationError::InvalidBatchSize(0));
        }

        let identity = self
            .registry
            .authorized_identity()
            .await
            .map_err(RegistrationError::Identity)?;
        tracing::info!(%identity, "using submitting identity");

        self.state = WorkflowState::Calibrating;
        let calibrator = Calibrator::new(&self.registry, config.calibration.clone());
        let batch_config = match config.batch_size {
            Some(requested) => {
                // A batch never holds more than the whole input list.
                let size = requested.min(addresses.len().max(1));
                if size < requested {
                    tracing::debug!(requested, size, "explicit batch size capped at input length");
                }
                let resource_usage = calibrator.measure(size).await;
                BatchConfig { size, resource_usage }
            }
            None => {
                tracing::info!(limit = config.resource_limit, "calculating the batch size");
                calibrator.calibrate(config.resource_limit).await?
            }
        };
        tracing::info!(
            size = batch_config.size,
            gas = %batch_config.resource_usage,
            "batch configuration"
        );
        emit(&self.observer, WorkflowEvent::Calibrated { config: batch_config });

        let input_count = addresses.len();
        let remaining = if config.filter_registered {
            self.state = WorkflowState::Filtering;
            let observer = &self.observer;
            filter_unprocessed(&self.registry, &addresses, |index, total, address, registered| {
                emit(
                    observer,
                    WorkflowEvent::AddressChecked { index, total, address, registered },
                )
            })
            .await?
        } else {
            addresses
        };

        let batches = partition(&remaining, batch_config.size);
        tracing::info!(
            addresses = remaining.len(),
            batches = batches.len(),
            "partitioned addresses"
        );
        emit(
            &self.observer,
            WorkflowEvent::Partitioned {
                addresses: remaining.len(),
                batches: batches.len(),
            },
        );

        Ok(RegistrationPlan {
            identity,
            batch_config,
            input_count,
            skipped_count: input_count - remaining.len(),
            batches,
        })
    }

    /// Submit every batch of `plan` in order, stopping at the first failure.
    pub async fn execute(&mut self, plan: &RegistrationPlan) -> Result<RunSummary, RegistrationError> {
        self.state = WorkflowState::Submitting;
        let observer = &self.observer;
        let result = submit_all(
            &self.registry,
            &plan.batches,
            plan.batch_config.resource_usage,
            |progress| emit(observer, WorkflowEvent::BatchSubmitted(progress)),
        )
        .await;

        self.state = match &result {
            Ok(_) => WorkflowState::Completed,
            Err(e) => {
                tracing::error!(error = %e, "registration aborted");
                WorkflowState::Aborted
            }
        };
        result
    }
}
