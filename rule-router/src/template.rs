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

//! Template rendering: `${path.to.value}` substitution into topic and
//! payload strings.
//!
//! The scanner is hand-written; placeholders do not nest and there is no
//! brace escape. Topic templates treat any unresolved placeholder as a hard
//! error, so a partially rendered topic is never published. Payload
//! templates leave unresolved placeholders literal in the output.
//!
//! Two built-in functions are recognized by their `identifier()` form before
//! a segment is treated as a dotted path: `uuid4()` and `uuid7()`.

use crate::errors::RouterError;
use crate::value::{coerce_string, lookup_path, ValueMap};
use uuid::Uuid;

const PLACEHOLDER_OPEN: &str = "${";
const PLACEHOLDER_CLOSE: char = '}';

#[derive(Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    Topic,
    Payload,
}

/// Renders an action-topic template. Every placeholder must resolve;
/// failure yields [`RouterError::MissingTopicVariable`].
pub fn render_topic(template: &str, values: &ValueMap) -> Result<String, RouterError> {
    render(template, values, TemplateKind::Topic)
}

/// Renders an action-payload template. Unresolved placeholders are left
/// literal.
pub fn render_payload(template: &str, values: &ValueMap) -> String {
    match render(template, values, TemplateKind::Payload) {
        Ok(rendered) => rendered,
        // Unreachable for the payload kind; kept total anyway.
        Err(_) => template.to_string(),
    }
}

fn render(
    template: &str,
    values: &ValueMap,
    kind: TemplateKind,
) -> Result<String, RouterError> {
    // Rendering a template without placeholders is the identity function.
    if !template.contains(PLACEHOLDER_OPEN) {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        out.push_str(&rest[..start]);
        let body = &rest[start + PLACEHOLDER_OPEN.len()..];

        let Some(end) = body.find(PLACEHOLDER_CLOSE) else {
            // Unterminated `${`: not a placeholder, emit literally.
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let path = &body[..end];
        match resolve_placeholder(path, values) {
            Some(value) => out.push_str(&value),
            None => match kind {
                TemplateKind::Topic => {
                    return Err(RouterError::MissingTopicVariable {
                        path: path.to_string(),
                    });
                }
                TemplateKind::Payload => {
                    out.push_str(PLACEHOLDER_OPEN);
                    out.push_str(path);
                    out.push(PLACEHOLDER_CLOSE);
                }
            },
        }

        rest = &body[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn resolve_placeholder(path: &str, values: &ValueMap) -> Option<String> {
    if let Some(name) = path.strip_suffix("()") {
        return match name {
            "uuid4" => Some(Uuid::new_v4().to_string()),
            "uuid7" => Some(Uuid::now_v7().to_string()),
            // Unrecognized functions follow the missing-variable policy.
            _ => None,
        };
    }

    lookup_path(values, path).map(coerce_string)
}
