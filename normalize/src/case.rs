// normalize/src/case.rs

//! Deep key case-conversion for decoded message payloads.
//!
//! Keys starting with `@` (protobuf type markers like `@type`) are never
//! renamed, and conversion recurses through arrays and nested objects.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Snake,
    Camel,
}

/// Recursively convert every object key in `value` to the given case mode,
/// leaving `@`-prefixed keys and all non-string-keyed values untouched.
pub fn deep_convert(value: Value, mode: CaseMode) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = if k.starts_with('@') {
                    k
                } else {
                    convert_key(&k, mode)
                };
                out.insert(key, deep_convert(v, mode));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| deep_convert(v, mode)).collect())
        }
        other => other,
    }
}

fn convert_key(key: &str, mode: CaseMode) -> String {
    match mode {
        CaseMode::Snake => to_snake_case(key),
        CaseMode::Camel => to_camel_case(key),
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
