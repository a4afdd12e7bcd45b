use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::errors::TransferError;

/// One candidate source location, as handed down by the orchestrator.
/// The tag carries the orchestrator's ranking/priority marker and is
/// opaque to adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub tag: String,
    pub url: String,
}

/// Immutable description of one file to move.
///
/// Created upstream, serialized verbatim into the job descriptor at
/// submission. Field names here are the adapter-native vocabulary; query
/// output renames them to canonical form (see `core::fields`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub request_id: String,
    pub dest_url: String,
    /// Ordered candidate sources; the local adapter only ever reads the
    /// first entry.
    pub legacy_sources: Vec<SourceEntry>,
    /// Integrity metadata, algorithm name to hex digest. Carried through
    /// the descriptor, not enforced by the local adapter.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_rse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_rse: Option<String>,
}

impl TransferRequest {
    /// Reject requests missing mandatory fields before anything is
    /// persisted.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.request_id.is_empty() {
            return Err(TransferError::MalformedRequest {
                request_id: "<unset>".to_string(),
                reason: "empty request_id".to_string(),
            });
        }
        if self.legacy_sources.is_empty() {
            return Err(self.malformed("no source locations"));
        }
        if let Err(e) = Url::parse(&self.dest_url) {
            return Err(self.malformed(&format!("invalid dest_url '{}': {}", self.dest_url, e)));
        }
        for src in &self.legacy_sources {
            if let Err(e) = Url::parse(&src.url) {
                return Err(self.malformed(&format!("invalid source url '{}': {}", src.url, e)));
            }
        }
        Ok(())
    }

    /// First-ranked source location.
    pub fn primary_source(&self) -> Option<&SourceEntry> {
        self.legacy_sources.first()
    }

    fn malformed(&self, reason: &str) -> TransferError {
        TransferError::MalformedRequest {
            request_id: self.request_id.clone(),
            reason: reason.to_string(),
        }
    }
}
