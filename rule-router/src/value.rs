/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Dynamic-value access and coercion shared by the evaluator and renderer.
//!
//! Payloads are decoded into [`serde_json::Value`] maps; both the condition
//! evaluator and the template renderer resolve dotted paths and coerce the
//! resolved values through the helpers here so the two subsystems agree on
//! the string and number forms of every payload value.

use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Parsed payload root: a JSON object.
pub type ValueMap = Map<String, Value>;

/// Resolves a dotted path against a value map. Each segment keys into a map;
/// a missing key or a non-map intermediate resolves to `None`.
pub fn lookup_path<'a>(values: &'a ValueMap, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = values.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Coerces a value to its canonical string form.
///
/// string as-is; booleans `true`/`false`; integers in canonical decimal;
/// floats with zero fractional part the same as integers, other floats in
/// shortest round-trip decimal; null as `null`; maps and sequences as their
/// canonical JSON encoding.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => format_number(n),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

fn format_number(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    match number.as_f64() {
        // f64 Display is shortest round-trip and renders 32.0 as "32".
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

/// Numeric coercion: numbers and numeric strings yield a finite f64.
pub(crate) fn as_finite_f64(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// String coercion used by ordered comparison: only strings and numbers
/// participate; booleans and structured values fall through to later rules.
fn as_ordered_string(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(format_number(n))),
        _ => None,
    }
}

/// Compares two dynamically typed values.
///
/// Coercion priority: both finite numbers, then both strings (byte
/// lexicographic), then both booleans (`false < true`). Anything else is
/// incomparable and yields `None`; ordered operators treat that as FALSE
/// while equality falls back to stringified comparison.
pub(crate) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_finite_f64(a), as_finite_f64(b)) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (as_ordered_string(a), as_ordered_string(b)) {
        return Some(x.as_bytes().cmp(y.as_bytes()));
    }
    if let (Value::Bool(x), Value::Bool(y)) = (a, b) {
        return Some(x.cmp(y));
    }
    None
}

/// Dynamic equality: comparable values compare, incomparable values fall
/// back to their canonical string forms.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => coerce_string(a) == coerce_string(b),
    }
}
