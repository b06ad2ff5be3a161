//! chainreg-core — batch-size calibration and sequential submission engine.
//!
//! # Overview
//!
//! ChainReg bulk-registers a large list of addresses into a remote registry
//! that rejects any single operation above a hard gas ceiling. The core crate
//! defines:
//!
//! - [`registry`] — the async collaborator traits every backend implements
//! - [`Calibrator`] — binary search for the largest batch that fits the limit
//! - [`filter_unprocessed`] — drops addresses the registry already knows
//! - [`partition`] — fixed-size chunking of the filtered list
//! - [`submit_all`] — strictly sequential, fail-fast batch submission
//! - [`RegistrationWorkflow`] — the plan / execute state machine tying it together
//! - [`RegistrationError`] / [`RegistryError`] — structured error types

pub mod calibrator;
pub mod error;
pub mod filter;
pub mod partition;
pub mod registry;
pub mod submitter;
pub mod synthetic;
pub mod types;
pub mod workflow;

pub use calibrator::{Calibrator, CalibratorConfig};
pub use error::{RegistrationError, RegistryError};
pub use filter::filter_unprocessed;
pub use partition::partition;
pub use registry::{CostProbe, RegistrationQuery, RegistrySubmitter};
pub use submitter::submit_all;
pub use types::{BatchConfig, Cost, Progress, RegistrationPlan, RunConfig, RunSummary};
pub use workflow::{RegistrationWorkflow, WorkflowEvent, WorkflowState};

pub use alloy_primitives::Address;
