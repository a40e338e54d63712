// maskward-core/src/application/mod.rs

pub mod ingest;
pub mod loader;
pub mod reconcile;
pub mod reset;
pub mod workflow;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing;

// --- RE-EXPORTS ---
// The CLI only needs `maskward_core::application::{run_workflow, handle_request, ...}`.

pub use ingest::{StagedSheet, stage_ruleset};
pub use loader::{LoadReport, load_rule_table};
pub use reconcile::{ReconcileOptions, ReconcileReport, reconcile};
pub use reset::{ResetReport, reset_policies};
pub use workflow::{
    SUCCESS_MESSAGE, Services, Stage, WorkflowOutcome, WorkflowReport, handle_request,
    run_workflow,
};
