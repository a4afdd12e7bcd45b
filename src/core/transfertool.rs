use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::TransferError;
use crate::core::outcome::JobOutcome;
use crate::core::request::TransferRequest;

/// Adapter-specific submission options, opaque to the orchestrator.
pub type JobParams = serde_json::Map<String, Value>;

/// One job ready for submission: the requests it carries plus the
/// adapter-specific options they were grouped under.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitJob {
    pub requests: Vec<TransferRequest>,
    pub job_params: JobParams,
}

/// The transfer-tool contract.
///
/// This is the adapter's entire public surface towards the orchestrator.
/// Implementations talk to some backing transfer mechanism (a remote
/// transfer service, or the local filesystem for `LocalTransfertool`) and
/// expose the uniform job lifecycle: group, submit, query, cancel,
/// reprioritize. Submission only records intent; data moves when the
/// orchestrator polls `query`.
#[async_trait]
pub trait Transfertool: Send + Sync {
    /// Stable adapter name, used in logs and endpoint selection.
    fn external_name(&self) -> &'static str;

    /// Partition already-chunked request groups into submission jobs.
    ///
    /// Contract: every input request appears in exactly one output job,
    /// none duplicated or dropped, relative order preserved within a job,
    /// and `job_params` is a static mapping per job.
    fn group_into_submit_jobs(&self, batches: Vec<Vec<TransferRequest>>) -> Vec<SubmitJob>;

    /// Persist one job descriptor for `requests` and return its job id.
    ///
    /// The durable write completes before this returns; a validation or
    /// serialization failure aborts the whole submission with no partial
    /// descriptor left behind. No data movement happens here.
    async fn submit(
        &self,
        requests: &[TransferRequest],
        job_params: &JobParams,
    ) -> Result<String, TransferError>;

    /// Best-effort cancellation. A `true` result is an acknowledgment,
    /// not confirmation of terminal state.
    async fn cancel(&self, job_ids: &[String]) -> Result<bool, TransferError>;

    /// Best-effort reprioritization, same acknowledgment semantics as
    /// `cancel`.
    async fn update_priority(&self, job_id: &str, priority: i32) -> Result<bool, TransferError>;

    /// Report a terminal outcome per job id, executing any job whose
    /// transfer has not run yet. An id never returned by `submit` fails
    /// the call with `TransferError::UnknownJob`.
    async fn query(
        &self,
        job_ids: &[String],
        details: bool,
    ) -> Result<HashMap<String, JobOutcome>, TransferError>;

    /// Batched form of `query`. Semantics are identical; `timeout` is a
    /// hint that adapters may pass to their backend, never a change in
    /// meaning of the result.
    async fn bulk_query(
        &self,
        job_ids: &[String],
        timeout: Option<Duration>,
    ) -> Result<HashMap<String, JobOutcome>, TransferError>;
}
