/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
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

//! Condition-tree evaluation against parsed payload values.
//!
//! The evaluator is total: it never panics and never propagates errors.
//! Every anomalous input resolves to FALSE, except a missing field under
//! `neq`, which is TRUE (a nonexistent value is not equal to anything). A
//! malformed condition must not stall the pipeline; the processor surfaces
//! such rules through its logs.

use crate::rule::{CompareOp, Condition, Conditions, LogicOp};
use crate::value::{coerce_string, compare, lookup_path, values_equal, ValueMap};
use regex::Regex;
use std::cmp::Ordering;

/// Decides whether the payload values satisfy a conditions tree.
///
/// An absent tree, or a group with neither items nor nested groups, matches
/// every payload. Sub-results are computed leaves-first, then nested groups,
/// joined by the group operator: AND is true iff all sub-results are true
/// (vacuously true when empty), OR iff any is (vacuously false when empty).
pub fn evaluate(conditions: Option<&Conditions>, values: &ValueMap) -> bool {
    let Some(conditions) = conditions else {
        return true;
    };
    if conditions.is_empty() {
        return true;
    }
    evaluate_group(conditions, values)
}

fn evaluate_group(group: &Conditions, values: &ValueMap) -> bool {
    let leaves = group.items.iter().map(|item| evaluate_leaf(item, values));
    let nested = group
        .groups
        .iter()
        .map(|nested| evaluate(Some(nested), values));
    let mut results = leaves.chain(nested);

    match group.operator {
        LogicOp::And => results.all(|result| result),
        LogicOp::Or => results.any(|result| result),
    }
}

fn evaluate_leaf(condition: &Condition, values: &ValueMap) -> bool {
    let Some(value) = lookup_path(values, &condition.field) else {
        return condition.operator == CompareOp::Neq;
    };

    match condition.operator {
        CompareOp::Exists => true,
        CompareOp::Eq => values_equal(value, &condition.value),
        CompareOp::Neq => !values_equal(value, &condition.value),
        CompareOp::Gt => ordered(value, condition, |o| o == Ordering::Greater),
        CompareOp::Lt => ordered(value, condition, |o| o == Ordering::Less),
        CompareOp::Gte => ordered(value, condition, |o| o != Ordering::Less),
        CompareOp::Lte => ordered(value, condition, |o| o != Ordering::Greater),
        CompareOp::Contains => {
            coerce_string(value).contains(&coerce_string(&condition.value))
        }
        CompareOp::Matches => matches_pattern(value, condition),
    }
}

fn ordered(
    value: &serde_json::Value,
    condition: &Condition,
    accept: impl FnOnce(Ordering) -> bool,
) -> bool {
    compare(value, &condition.value).is_some_and(accept)
}

fn matches_pattern(value: &serde_json::Value, condition: &Condition) -> bool {
    let Some(pattern) = condition.value.as_str() else {
        return false;
    };
    // Compilation failures yield FALSE; the validator rejects these at load.
    let Ok(regex) = Regex::new(pattern) else {
        return false;
    };
    regex.is_match(&coerce_string(value))
}
