use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{result_of, scalar_text};

/// A list found inside the result, printed after the main table.
enum Section<'a> {
    Records(String, &'a [Value]),
    Lines(String, &'a [Value]),
}

/// Format output as tables using the tabled crate.
///
/// Nested objects (debt, credit stats, score) are flattened into dotted
/// field names; lists of findings, bullets and covenants get their own table.
pub fn print_table(value: &Value) {
    match result_of(value) {
        Value::Object(result) => {
            let mut rows: Vec<(String, String)> = Vec::new();
            let mut sections: Vec<Section<'_>> = Vec::new();
            flatten("", result, &mut rows, &mut sections);

            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            for (key, val) in &rows {
                builder.push_record([key.as_str(), val.as_str()]);
            }
            println!("{}", Table::from(builder));

            for section in sections {
                match section {
                    Section::Records(title, items) => {
                        println!("\n{}:", title);
                        print_records(items);
                    }
                    Section::Lines(title, items) => {
                        println!("\n{}:", title);
                        for item in items {
                            println!("  - {}", scalar_text(item));
                        }
                    }
                }
            }
        }
        Value::Array(items) => print_records(items),
        other => println!("{}", scalar_text(other)),
    }

    print_envelope_notes(value);
}

fn flatten<'a>(
    prefix: &str,
    map: &'a Map<String, Value>,
    rows: &mut Vec<(String, String)>,
    sections: &mut Vec<Section<'a>>,
) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, rows, sections),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                sections.push(Section::Records(name, items));
            }
            Value::Array(items) if !items.is_empty() => {
                sections.push(Section::Lines(name, items));
            }
            Value::Array(_) => rows.push((name, "(none)".into())),
            _ => rows.push((name, scalar_text(val))),
        }
    }
}

fn print_records(items: &[Value]) {
    if items.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = items.first() else {
        for item in items {
            println!("{}", scalar_text(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in items {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(value: &Value) {
    let Some(envelope) = value.as_object() else {
        return;
    };

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_splits_scalars_and_lists() {
        let result = json!({
            "debt": {"total_debt": "1500000", "components": [{"name": "Existing Debt"}]},
            "conditions": ["Maintain a minimum DSCR of 1.25x"],
            "sanity_checks": [],
            "recommendation": "Approve"
        });
        let map = result.as_object().unwrap();
        let mut rows = Vec::new();
        let mut sections = Vec::new();
        flatten("", map, &mut rows, &mut sections);

        assert!(rows.contains(&("debt.total_debt".to_string(), "1500000".to_string())));
        assert!(rows.contains(&("sanity_checks".to_string(), "(none)".to_string())));
        assert!(rows.contains(&("recommendation".to_string(), "Approve".to_string())));
        assert_eq!(sections.len(), 2);
        assert!(matches!(&sections[0], Section::Lines(t, _) if t == "conditions"));
        assert!(matches!(&sections[1], Section::Records(t, _) if t == "debt.components"));
    }
}
