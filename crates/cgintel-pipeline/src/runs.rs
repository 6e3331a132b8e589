//! `collection_runs` bookkeeping shared by every pipeline stage.

use cgintel_core::RunType;
use sqlx::PgPool;

use crate::error::PipelineError;
use crate::types::TriggerSource;

/// Longest error summary stored on a run row.
const MAX_RUN_ERROR_CHARS: usize = 2000;

/// Creates a run and moves it to `running`. Returns the run id.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the run cannot be created or started.
pub(crate) async fn begin_run(
    pool: &PgPool,
    run_type: RunType,
    trigger: TriggerSource,
) -> Result<i64, PipelineError> {
    let run = cgintel_db::create_collection_run(pool, run_type, trigger.as_str()).await?;
    if let Err(e) = cgintel_db::start_collection_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, run_type, format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(run_id = run.id, %run_type, trigger = trigger.as_str(), "run started");
    Ok(run.id)
}

/// Completes a run, storing per-item errors as a joined summary.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] if the run cannot be completed.
pub(crate) async fn finish_run(
    pool: &PgPool,
    run_id: i64,
    run_type: RunType,
    records_processed: usize,
    errors: &[String],
) -> Result<(), PipelineError> {
    let records = i32::try_from(records_processed).unwrap_or(i32::MAX);
    let summary = summarize_errors(errors);

    if let Err(err) =
        cgintel_db::complete_collection_run(pool, run_id, records, summary.as_deref()).await
    {
        fail_run_best_effort(pool, run_id, run_type, format!("{err:#}")).await;
        return Err(err.into());
    }

    tracing::info!(
        run_id,
        %run_type,
        records_processed,
        errors = errors.len(),
        "run completed"
    );
    Ok(())
}

/// Marks a run failed, logging instead of returning if that also fails.
pub(crate) async fn fail_run_best_effort(
    pool: &PgPool,
    run_id: i64,
    run_type: RunType,
    message: String,
) {
    if let Err(mark_err) = cgintel_db::fail_collection_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            %run_type,
            error = %mark_err,
            "failed to mark {run_type} run as failed"
        );
    }
}

fn summarize_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let joined = errors.join("; ");
    Some(joined.chars().take(MAX_RUN_ERROR_CHARS).collect())
}
