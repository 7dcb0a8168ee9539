use binday_core::NormalizedSchedule;
use serde_json::Value;

/// Render a schedule as pretty JSON with keys sorted at every depth.
pub(crate) fn render(schedule: &NormalizedSchedule) -> serde_json::Result<String> {
    let value = sort_keys(serde_json::to_value(schedule)?);
    serde_json::to_string_pretty(&value)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, nested)| (key, sort_keys(nested)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
