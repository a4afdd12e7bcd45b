use serde_json::{Map, Value};

/// Native-to-canonical field renames applied to query output.
///
/// The orchestrator depends on the canonical names regardless of which
/// adapter produced the record, so new adapters extend this table instead
/// of renaming ad hoc at their call sites.
const FIELD_MAP: &[(&str, &str)] = &[
    ("source_rse_id", "src_rse_id"),
    ("source_rse", "src_rse"),
    ("source_url", "src_url"),
    ("dest_rse_id", "dst_rse_id"),
    ("dest_rse", "dst_rse"),
    ("dest_url", "dst_url"),
];

/// Canonical name for a native field, or the name itself if it is already
/// canonical.
pub fn canonical_name(name: &str) -> &str {
    FIELD_MAP
        .iter()
        .find(|(native, _)| *native == name)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(name)
}

/// Rename every native key in `fields` to its canonical form. Values and
/// unmapped keys pass through untouched.
pub fn normalize_fields(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(k, v)| (canonical_name(&k).to_string(), v))
        .collect()
}
