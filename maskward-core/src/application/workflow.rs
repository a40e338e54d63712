// maskward-core/src/application/workflow.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use crate::application::ingest::{StagedSheet, stage_ruleset};
use crate::application::loader::{LoadReport, load_rule_table};
use crate::application::reconcile::{ReconcileOptions, ReconcileReport, reconcile};
use crate::application::reset::{ResetReport, reset_policies};
use crate::domain::audit::AuditMode;
use crate::domain::configuration::MaskingConfig;
use crate::error::MaskwardError;
use crate::ports::{ObjectStore, PolicyTagManager, Warehouse};

/// The adapters a run talks to.
#[derive(Clone)]
pub struct Services {
    pub object_store: Arc<dyn ObjectStore>,
    pub warehouse: Arc<dyn Warehouse>,
    pub catalog: Arc<dyn PolicyTagManager>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Load,
    Reset,
    Apply,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Ingest, Stage::Load, Stage::Reset, Stage::Apply];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Ingest => "ingest",
            Stage::Load => "load",
            Stage::Reset => "reset",
            Stage::Apply => "apply",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub staged: StagedSheet,
    pub load: LoadReport,
    pub reset: ResetReport,
    pub reconcile: ReconcileReport,
    pub timings: Vec<(Stage, Duration)>,
}

/// Ingest, load, reset, apply. The first failing stage ends the run.
#[instrument(skip_all, fields(project = %config.project_id, dataset = %config.dataset_id))]
pub async fn run_workflow(
    services: &Services,
    config: &MaskingConfig,
    options: ReconcileOptions,
) -> Result<WorkflowReport, MaskwardError> {
    let mut timings = Vec::with_capacity(Stage::ALL.len());

    let staged = timed(
        Stage::Ingest,
        &mut timings,
        stage_ruleset(services.object_store.as_ref(), config),
    )
    .await?;
    let load = timed(
        Stage::Load,
        &mut timings,
        load_rule_table(services.warehouse.as_ref(), config, &staged.path),
    )
    .await?;
    let reset = timed(
        Stage::Reset,
        &mut timings,
        reset_policies(services.warehouse.as_ref(), services.catalog.as_ref(), config),
    )
    .await?;
    let applied = timed(
        Stage::Apply,
        &mut timings,
        reconcile(
            services.warehouse.as_ref(),
            services.catalog.as_ref(),
            config,
            options,
        ),
    )
    .await?;

    Ok(WorkflowReport {
        staged,
        load,
        reset,
        reconcile: applied,
        timings,
    })
}

async fn timed<T>(
    stage: Stage,
    timings: &mut Vec<(Stage, Duration)>,
    work: impl Future<Output = Result<T, MaskwardError>>,
) -> Result<T, MaskwardError> {
    info!(%stage, "Stage started");
    let start = Instant::now();
    let result = work.await;
    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(%stage, elapsed_ms = elapsed.as_millis() as u64, "Stage finished"),
        Err(e) => error!(%stage, elapsed_ms = elapsed.as_millis() as u64, error = %e, "Stage failed"),
    }
    timings.push((stage, elapsed));
    result
}

pub const SUCCESS_MESSAGE: &str = "Masking process completed";

/// What an HTTP-style trigger gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Success { status: u16, message: String },
    Failure { status: u16, message: String },
}

impl WorkflowOutcome {
    pub fn status(&self) -> u16 {
        match self {
            WorkflowOutcome::Success { status, .. } | WorkflowOutcome::Failure { status, .. } => {
                *status
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WorkflowOutcome::Success { message, .. } | WorkflowOutcome::Failure { message, .. } => {
                message
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success { .. })
    }
}

/// Request-triggered run: batched audit, errors turned into a 500 outcome.
pub async fn handle_request(services: &Services, config: &MaskingConfig) -> WorkflowOutcome {
    let options = ReconcileOptions {
        mode: AuditMode::Batched,
        strict_columns: config.strict_columns,
    };
    match run_workflow(services, config, options).await {
        Ok(report) => {
            info!(
                batch_id = ?report.reconcile.batch_id,
                rules = report.reconcile.rules_read,
                "Request run completed"
            );
            WorkflowOutcome::Success {
                status: 200,
                message: SUCCESS_MESSAGE.to_string(),
            }
        }
        Err(e) => {
            error!(error = %e, "Request run failed");
            WorkflowOutcome::Failure {
                status: 500,
                message: e.to_string(),
            }
        }
    }
}
