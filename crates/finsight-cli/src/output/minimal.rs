use serde_json::Value;

use super::{result_of, scalar_text};

/// Print just the key answer from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(result_of(value)));
}

fn minimal_line(result: &Value) -> String {
    match result {
        // Sanity checks
        Value::Array(items) => {
            let count = |severity: &str| items.iter().filter(|i| i["type"] == severity).count();
            format!(
                "{} critical, {} warning, {} info",
                count("critical"),
                count("warning"),
                count("info")
            )
        }
        Value::Object(map) => {
            if let Some(rec) = map.get("recommendation") {
                return match map.get("score").filter(|s| !s.is_null()) {
                    Some(score) => format!(
                        "{} (score {}, {})",
                        scalar_text(rec),
                        scalar_text(&score["score"]),
                        scalar_text(&score["band"])
                    ),
                    None => scalar_text(rec),
                };
            }
            if let Some(Value::Array(bullets)) = map.get("rationale") {
                let passed = bullets.iter().filter(|b| b["outcome"] == "pass").count();
                return format!("{}/{} criteria passed", passed, bullets.len());
            }

            let priority_keys = ["score", "band", "total_debt", "min_dscr", "blended_rate"];
            for key in &priority_keys {
                if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
                    return scalar_text(val);
                }
            }
            map.iter()
                .next()
                .map(|(key, val)| format!("{}: {}", key, scalar_text(val)))
                .unwrap_or_default()
        }
        other => scalar_text(other),
    }
}
