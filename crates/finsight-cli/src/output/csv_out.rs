use serde_json::{Map, Value};
use std::io;

use super::{result_of, scalar_text};

/// Write output as CSV to stdout.
///
/// A list result (sanity checks) becomes one row per item; an object result
/// becomes `field,value` rows with nested objects flattened to dotted names.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    for record in csv_records(result_of(value)) {
        let _ = wtr.write_record(&record);
    }

    let _ = wtr.flush();
}

fn csv_records(result: &Value) -> Vec<Vec<String>> {
    match result {
        Value::Array(items) => array_records(items),
        Value::Object(map) => {
            let mut records = vec![vec!["field".to_string(), "value".to_string()]];
            flatten_fields("", map, &mut records);
            records
        }
        other => vec![vec![scalar_text(other)]],
    }
}

fn flatten_fields(prefix: &str, map: &Map<String, Value>, records: &mut Vec<Vec<String>>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten_fields(&name, inner, records),
            _ => records.push(vec![name, scalar_text(val)]),
        }
    }
}

fn array_records(items: &[Value]) -> Vec<Vec<String>> {
    let Some(Value::Object(first)) = items.first() else {
        return items.iter().map(|v| vec![scalar_text(v)]).collect();
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut records = vec![headers.clone()];
    for item in items {
        if let Value::Object(map) = item {
            records.push(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                    .collect(),
            );
        }
    }
    records
}
