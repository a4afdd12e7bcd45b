use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::fields::normalize_fields;
use crate::core::request::TransferRequest;
use crate::core::state::RequestState;

/// Per-request outcome record inside a job outcome.
///
/// `fields` holds the request's serialized form with native field names
/// already renamed to canonical ones, so consumers see `src_rse` /
/// `dst_url` no matter which adapter produced the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetail {
    pub request_id: String,
    pub transfer_id: String,
    pub comment: String,
    pub status: String,
    pub new_state: RequestState,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RequestDetail {
    /// Build a detail record for `request` within job `transfer_id`,
    /// flattening the request's canonicalized fields into the record.
    pub fn for_request(
        request: &TransferRequest,
        transfer_id: &str,
        new_state: RequestState,
        comment: String,
    ) -> Self {
        let mut fields = match serde_json::to_value(request) {
            Ok(Value::Object(map)) => normalize_fields(map),
            _ => Map::new(),
        };
        // request_id lives in the record itself; keeping it in the
        // flattened map too would emit the key twice.
        fields.remove("request_id");
        let status = match new_state {
            RequestState::Done => "ok",
            _ => "error",
        };
        Self {
            request_id: request.request_id.clone(),
            transfer_id: transfer_id.to_string(),
            comment,
            status: status.to_string(),
            new_state,
            fields,
        }
    }
}

/// Outcome of one job as reported by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Flat terminal marker, returned when the caller did not ask for
    /// per-request details.
    Summary { state: RequestState },
    /// One record per request in descriptor order.
    Details { requests: Vec<RequestDetail> },
}

impl JobOutcome {
    /// Collapse per-request states into the job-level terminal state:
    /// DONE only if every request completed.
    pub fn state(&self) -> RequestState {
        match self {
            Self::Summary { state } => *state,
            Self::Details { requests } => {
                if requests.iter().all(|d| d.new_state == RequestState::Done) {
                    RequestState::Done
                } else {
                    RequestState::Failed
                }
            }
        }
    }

    pub fn summarized(&self) -> JobOutcome {
        JobOutcome::Summary {
            state: self.state(),
        }
    }
}
