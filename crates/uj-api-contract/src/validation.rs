//! Contract validation beyond what the field-level derives express

use validator::Validate;

use crate::error::ApiContractError;
use crate::types::{UnifiedJob, UpdateSource};

/// Validate a unified-job snapshot against the contract.
///
/// On top of the field-level rules this enforces the lifecycle
/// invariant that `failed == true` only appears on a terminal status.
pub fn validate_unified_job(job: &UnifiedJob) -> Result<(), ApiContractError> {
    job.validate()?;

    if job.failed && !job.status.is_terminal() {
        return Err(ApiContractError::Invariant(format!(
            "job {} reports failed=true with non-terminal status {:?}",
            job.id, job.status
        )));
    }

    Ok(())
}

/// Validate an update-source resource.
pub fn validate_update_source(source: &UpdateSource) -> Result<(), ApiContractError> {
    source.validate()?;

    if source.last_job_run.is_some() && source.last_updated.is_none() {
        return Err(ApiContractError::Invariant(format!(
            "source {} has last_job_run without last_updated",
            source.id
        )));
    }

    Ok(())
}
