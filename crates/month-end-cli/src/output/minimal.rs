use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority, then
/// inside the summary/totals sub-objects, then fall back to the first field.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = [
        "email_markdown",
        "monthly_payment",
        "net_difference",
        "total_variance",
        "untied_count",
        "duplicate_count",
        "match_count",
        "issue_count",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Recon outputs keep their headline numbers one level down
        for nested in ["summary", "totals"] {
            if let Some(Value::Object(sub)) = map.get(nested) {
                for key in &priority_keys {
                    if let Some(val) = sub.get(*key) {
                        if !val.is_null() {
                            println!("{}", format_minimal(val));
                            return;
                        }
                    }
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
