//! High-level pipeline: authenticate → (create job) → discover → deliver.
//!
//! This module runs one manual job end to end against the collaborators in
//! [`crate::contract`]. Steps run strictly one after another.
//!
//! # Error Handling
//! - Authentication and job creation failures are fatal and returned immediately.
//! - Discovery failures are not: the run continues with an empty file set and the cause is
//!   kept in [`ManualJobReport::discovery_failure`].
//! - With no source files, no delivery is submitted.
//! - A failed delivery submission is returned to the caller; nothing is retried.

use tracing::{debug, error, info};

use crate::contract::{Authenticator, JobService};
use crate::discover::{discover_or_empty, DiscoveryStrategy, ExplorerSession};
use crate::error::{PipelineError, ServiceError};
use crate::filter::FilterConfig;
use crate::job::{DeliveryRequest, JobSettings, NewJob};
use crate::source_file::SourceFile;

/// Everything one run needs besides the clients.
#[derive(Debug, Clone)]
pub struct ManualJobConfig {
    pub job: JobSettings,
    pub discovery: DiscoveryStrategy,
    pub filters: FilterConfig,
}

#[derive(Debug)]
pub struct ManualJobReport {
    pub job_id: String,
    /// Whether `job_id` was created during this run.
    pub job_created: bool,
    pub source_files: Vec<SourceFile>,
    /// Platform response to the delivery; `None` when there was nothing to deliver.
    pub delivery: Option<serde_json::Value>,
    pub discovery_failure: Option<String>,
}

pub async fn run_manual_job<A, J>(
    config: &ManualJobConfig,
    authenticator: &A,
    jobs: &J,
    session: Option<ExplorerSession<'_>>,
) -> Result<ManualJobReport, PipelineError>
where
    A: Authenticator + ?Sized,
    J: JobService + ?Sized,
{
    info!("[JOB] Starting manual job");

    let token = authenticator.create_token().await.map_err(|e| {
        error!(error = %e, "[JOB][ERROR] Authorization failed");
        PipelineError::Authentication(e)
    })?;
    info!("[JOB] Authorization successful");

    let (job_id, job_created) = match config.job.existing_job_id() {
        Some(id) => {
            info!(job_id = id, "[JOB] Using configured job");
            (id.to_string(), false)
        }
        None => {
            let new_job = NewJob::from_settings(&config.job);
            info!(name = %new_job.name, "[JOB] Starting job creation");
            match serde_json::to_string_pretty(&new_job) {
                Ok(json) => debug!(payload = %json, "[JOB] Job creation payload"),
                Err(e) => error!(error = ?e, "[JOB] Failed to serialize job creation payload"),
            }
            let created = jobs.create_job(&token, &new_job).await.map_err(|e| {
                error!(error = %e, "[JOB][ERROR] Job creation failed");
                PipelineError::JobCreation(e)
            })?;
            let id = created.job_id.filter(|id| !id.is_empty()).ok_or_else(|| {
                error!("[JOB][ERROR] Job creation response carried no job id");
                PipelineError::JobCreation(ServiceError::InvalidResponse(
                    "job creation response has no jobId".into(),
                ))
            })?;
            info!(job_id = %id, "[JOB] Job created");
            (id, true)
        }
    };

    info!(job_id = %job_id, "[JOB] Starting delivery process");
    let outcome = discover_or_empty(&config.discovery, session, &config.filters).await;
    let discovery_failure = outcome.failure.as_ref().map(ToString::to_string);
    let source_files = outcome.files;

    if source_files.is_empty() {
        info!(job_id = %job_id, "[JOB] No source files found, skipping delivery");
        return Ok(ManualJobReport {
            job_id,
            job_created,
            source_files,
            delivery: None,
            discovery_failure,
        });
    }

    let request = DeliveryRequest::from_source_files(&source_files);
    info!(job_id = %job_id, files = request.objects.len(), "[JOB] Submitting delivery");
    match serde_json::to_string_pretty(&request) {
        Ok(json) => debug!(payload = %json, "[JOB] Delivery payload"),
        Err(e) => error!(error = ?e, "[JOB] Failed to serialize delivery payload"),
    }

    let delivery = jobs
        .submit_delivery(&token, &job_id, &request)
        .await
        .map_err(|e| {
            error!(job_id = %job_id, error = %e, "[JOB][ERROR] Delivery submission failed");
            PipelineError::Delivery {
                job_id: job_id.clone(),
                source: e,
            }
        })?;
    info!(job_id = %job_id, response = %delivery, "[JOB] Delivery submitted");

    Ok(ManualJobReport {
        job_id,
        job_created,
        source_files,
        delivery: Some(delivery),
        discovery_failure,
    })
}
