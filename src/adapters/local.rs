use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::AppContext;
use crate::core::copy::copy_url;
use crate::core::{
    JobOutcome, JobParams, RequestDetail, RequestState, SubmitJob, TransferError,
    TransferRequest, Transfertool,
};
use crate::db::descriptors::{self, JobDescriptor};
use crate::db::outcomes;

/// Reference transfer tool: moves files between local locations.
///
/// Submission only persists a job descriptor; the copy itself runs the
/// first time the job is queried, and the terminal outcome is cached
/// durably so later queries (and crashed-and-restarted processes) report
/// the same result without touching the data again. Remote locations are
/// deliberately refused; adapters for real transfer services own that
/// ground.
pub struct LocalTransfertool {
    ctx: AppContext,
    external_host: String,
    /// Per-job execution locks so concurrent queries of the same job run
    /// the copy exactly once. Never a global lock; disjoint jobs proceed
    /// in parallel.
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl LocalTransfertool {
    pub const EXTERNAL_NAME: &'static str = "local";

    pub fn new(ctx: AppContext) -> Self {
        Self::with_external_host(ctx, "Local Transfertool".to_string())
    }

    pub fn with_external_host(ctx: AppContext, external_host: String) -> Self {
        Self {
            ctx,
            external_host,
            inflight: DashMap::new(),
        }
    }

    fn job_lock(&self, job_id: &str) -> Arc<Mutex<()>> {
        self.inflight
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run every request of the job in descriptor order, folding each
    /// per-request failure into a FAILED detail record instead of letting
    /// it escape the query.
    async fn execute_job(&self, descriptor: &JobDescriptor) -> Vec<RequestDetail> {
        let overwrite = descriptor
            .job_params
            .get("overwrite")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let mut details = Vec::with_capacity(descriptor.requests.len());
        for request in &descriptor.requests {
            let result = match request.primary_source() {
                Some(source) => {
                    copy_url(
                        &source.url,
                        &request.dest_url,
                        &self.ctx.config.base_directory,
                        overwrite,
                        self.ctx.config.sync_files,
                    )
                    .await
                }
                None => Err(TransferError::MalformedRequest {
                    request_id: request.request_id.clone(),
                    reason: "no source locations".to_string(),
                }),
            };

            let (state, comment) = match result {
                Ok(report) => (
                    RequestState::Done,
                    format!("copied {} bytes", report.bytes),
                ),
                Err(e) => {
                    warn!(
                        job_id = %descriptor.job_id,
                        request_id = %request.request_id,
                        error = %e,
                        "request transfer failed"
                    );
                    (RequestState::Failed, e.to_string())
                }
            };

            details.push(RequestDetail::for_request(
                request,
                &descriptor.job_id,
                state,
                comment,
            ));
        }
        details
    }

    /// Terminal outcome for one job, executing it first if no cached
    /// outcome exists yet.
    async fn outcome_for(&self, job_id: &str) -> Result<JobOutcome, TransferError> {
        // Fast path: already terminal.
        if let Some(outcome) = outcomes::get(&self.ctx.db, job_id.to_string()).await? {
            return Ok(outcome);
        }

        let lock = self.job_lock(job_id);
        let _guard = lock.lock().await;

        // Another query may have executed the job while we waited.
        if let Some(outcome) = outcomes::get(&self.ctx.db, job_id.to_string()).await? {
            return Ok(outcome);
        }

        let descriptor = descriptors::get(&self.ctx.db, job_id.to_string())
            .await?
            .ok_or_else(|| TransferError::UnknownJob(job_id.to_string()))?;

        info!(
            job_id = %job_id,
            requests = descriptor.requests.len(),
            "executing transfer job"
        );

        let details = self.execute_job(&descriptor).await;
        outcomes::put(&self.ctx.db, job_id.to_string(), &details).await?;
        self.inflight.remove(job_id);

        Ok(JobOutcome::Details { requests: details })
    }
}

#[async_trait]
impl Transfertool for LocalTransfertool {
    fn external_name(&self) -> &'static str {
        Self::EXTERNAL_NAME
    }

    fn group_into_submit_jobs(&self, batches: Vec<Vec<TransferRequest>>) -> Vec<SubmitJob> {
        // No batching policy of its own: the caller's chunking is kept,
        // flattened into one job with no submission options.
        vec![SubmitJob {
            requests: batches.into_iter().flatten().collect(),
            job_params: JobParams::new(),
        }]
    }

    async fn submit(
        &self,
        requests: &[TransferRequest],
        job_params: &JobParams,
    ) -> Result<String, TransferError> {
        for request in requests {
            request.validate()?;
        }

        let job_id = Uuid::now_v7().to_string();
        descriptors::put(&self.ctx.db, job_id.clone(), requests, job_params).await?;

        info!(
            job_id = %job_id,
            requests = requests.len(),
            host = %self.external_host,
            "job submitted"
        );
        Ok(job_id)
    }

    async fn cancel(&self, job_ids: &[String]) -> Result<bool, TransferError> {
        // The backing mechanism has no mid-flight cancellation; report
        // best-effort acknowledgment.
        debug!(jobs = job_ids.len(), "cancel acknowledged (no-op)");
        Ok(true)
    }

    async fn update_priority(&self, job_id: &str, priority: i32) -> Result<bool, TransferError> {
        debug!(job_id = %job_id, priority, "priority update acknowledged (no-op)");
        Ok(true)
    }

    async fn query(
        &self,
        job_ids: &[String],
        details: bool,
    ) -> Result<HashMap<String, JobOutcome>, TransferError> {
        let mut results = HashMap::with_capacity(job_ids.len());
        for job_id in job_ids {
            let outcome = self.outcome_for(job_id).await?;
            let outcome = if details {
                outcome
            } else {
                outcome.summarized()
            };
            results.insert(job_id.clone(), outcome);
        }
        Ok(results)
    }

    async fn bulk_query(
        &self,
        job_ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<HashMap<String, JobOutcome>, TransferError> {
        if let Some(timeout) = timeout {
            debug!(timeout_secs = timeout.as_secs_f64(), "timeout is advisory here");
        }
        self.query(job_ids, false).await
    }
}
