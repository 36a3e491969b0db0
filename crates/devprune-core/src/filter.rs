use std::collections::HashSet;

use serde_json::Value;

/// Drop every record whose `id_field` is in `ids`, keeping the rest in their
/// original order. Records without a string id are always kept.
pub fn without_ids(records: &[Value], id_field: &str, ids: &HashSet<&str>) -> Vec<Value> {
    records
        .iter()
        .filter(|record| {
            record
                .get(id_field)
                .and_then(Value::as_str)
                .map_or(true, |id| !ids.contains(id))
        })
        .cloned()
        .collect()
}
