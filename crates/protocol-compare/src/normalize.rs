//! Procedure normalizer.
//!
//! Source records are loosely typed: fields go missing, materials and
//! equipment arrive as plain strings or as `{name}` objects, safety notes as
//! a list or as one newline-delimited block, and steps under either `steps`
//! or `procedure`. Normalization happens exactly once, here; nothing
//! downstream inspects raw shapes. This function is total: malformed input
//! degrades to the least-informative valid [`Procedure`], never an error.
use std::collections::HashSet;

use serde_json::Value;

use crate::model::{Procedure, Step};

pub fn normalize(raw: &Value) -> Procedure {
    Procedure {
        id: id_field(raw),
        title: string_field(raw, "title"),
        objective: string_field(raw, "objective"),
        description: string_field(raw, "description"),
        category: string_field(raw, "category"),
        tags: string_list(raw.get("tags")),
        materials: dedupe(named_list(raw.get("materials"))),
        equipment: dedupe(named_list(raw.get("equipment"))),
        safety_notes: dedupe(safety_notes(raw.get("safety_notes"))),
        steps: steps(raw),
        success_rate: raw
            .get("success_rate")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        usage_count: raw
            .get("usage_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    }
}

/// Identifiers may be strings or bare numbers depending on the source store.
fn id_field(raw: &Value) -> String {
    match raw.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Materials and equipment entries are either `"Ethanol"` or
/// `{"name": "Ethanol", ...}`. Anything else is dropped.
fn named_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Materials, equipment, and safety notes are sets: repeated entries in the
/// source collapse to the first occurrence, preserving order.
fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Safety notes arrive either as a list or as one delimited text block;
/// blank lines are discarded.
fn safety_notes(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(_)) => string_list(value),
        Some(Value::String(block)) => block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Steps live under `steps` in form records and under `procedure` in stored
/// ones. Positions are reassigned 1-based from list order so they are always
/// unique and increasing regardless of what the source claimed.
fn steps(raw: &Value) -> Vec<Step> {
    let list = match (raw.get("steps"), raw.get("procedure")) {
        (Some(Value::Array(items)), _) => items,
        (_, Some(Value::Array(items))) => items,
        _ => return Vec::new(),
    };

    list.iter()
        .enumerate()
        .map(|(idx, item)| Step {
            position: idx + 1,
            title: string_field(item, "title"),
            description: string_field(item, "description"),
            duration: item
                .get("duration")
                .and_then(Value::as_f64)
                .filter(|d| *d >= 0.0)
                .map(|d| d.round() as u32),
            critical: item
                .get("critical")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
        .collect()
}
