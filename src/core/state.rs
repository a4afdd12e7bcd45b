use serde::{Deserialize, Serialize};

/// Canonical per-request state vocabulary reported to the orchestrator.
///
/// Every adapter maps its backend's native states onto this enumeration;
/// the orchestrator never sees backend-specific state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestState {
    /// Descriptor persisted, transfer not yet attempted.
    Submitted,
    /// Transfer attempted and completed.
    Done,
    /// Transfer attempted and failed.
    Failed,
    /// Backend lost track of the transfer.
    Lost,
}

impl RequestState {
    /// Terminal states never change on subsequent queries.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Lost)
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "SUBMITTED",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Lost => "LOST",
        };
        f.write_str(s)
    }
}
