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

//! Structural rule validation, run at load time before index install.
//!
//! Operator validity is enforced by the model's closed enums at parse time;
//! this pass covers everything the type system cannot: wildcard placement,
//! empty fields, QoS range, `matches` regexes and template variable names.

use crate::errors::RouterError;
use crate::routing::validate_pattern;
use crate::rule::{CompareOp, Condition, Conditions, Rule};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    // A variable is a dotted identifier path or a recognized-form function
    // call like `uuid4()`.
    static ref VALID_VARIABLE: Regex = Regex::new(
        r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$"
    )
    .expect("variable pattern is valid");
    static ref VALID_FUNCTION: Regex =
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*\(\)$").expect("function pattern is valid");
}

/// Validates one rule. Load-time failures abort startup.
pub fn validate_rule(rule: &Rule) -> Result<(), RouterError> {
    validate_pattern(&rule.topic)?;

    if rule.action.topic.is_empty() {
        return Err(invalid("action.topic", "action topic cannot be empty"));
    }
    if rule.action.qos > 2 {
        return Err(invalid("action.qos", "QoS must be 0, 1 or 2"));
    }
    validate_template("action.topic", &rule.action.topic)?;
    validate_template("action.payload", &rule.action.payload)?;

    if let Some(conditions) = &rule.conditions {
        validate_conditions("conditions", conditions)?;
    }

    Ok(())
}

/// Validates a whole rule set and rejects duplicate topic patterns across it.
pub fn validate_rules(rules: &[Rule]) -> Result<(), RouterError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for rule in rules {
        validate_rule(rule)?;
        if !seen.insert(rule.topic.as_str()) {
            return Err(RouterError::DuplicatePattern {
                pattern: rule.topic.clone(),
            });
        }
    }
    Ok(())
}

fn validate_conditions(field: &str, conditions: &Conditions) -> Result<(), RouterError> {
    for (i, item) in conditions.items.iter().enumerate() {
        validate_condition(&format!("{field}.items[{i}]"), item)?;
    }
    for (i, group) in conditions.groups.iter().enumerate() {
        validate_conditions(&format!("{field}.groups[{i}]"), group)?;
    }
    Ok(())
}

fn validate_condition(field: &str, condition: &Condition) -> Result<(), RouterError> {
    if condition.field.is_empty() {
        return Err(invalid(field, "condition field cannot be empty"));
    }

    if condition.operator == CompareOp::Matches {
        let Some(pattern) = condition.value.as_str() else {
            return Err(invalid(field, "regex comparand must be a string"));
        };
        if let Err(err) = Regex::new(pattern) {
            return Err(invalid(field, &format!("invalid regex pattern: {err}")));
        }
    }

    Ok(())
}

fn validate_template(field: &str, template: &str) -> Result<(), RouterError> {
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let body = &rest[start + 2..];
        let Some(end) = body.find('}') else {
            // Unterminated `${` renders literally; nothing to validate.
            return Ok(());
        };
        let variable = &body[..end];
        if !VALID_VARIABLE.is_match(variable) && !VALID_FUNCTION.is_match(variable) {
            return Err(invalid(
                field,
                &format!("invalid template variable name: `{variable}`"),
            ));
        }
        rest = &body[end + 1..];
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> RouterError {
    RouterError::InvalidRule {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Action, LogicOp};
    use serde_json::json;

    fn rule() -> Rule {
        Rule {
            topic: "sensors/+/temperature".to_string(),
            source_broker: None,
            description: None,
            enabled: true,
            conditions: None,
            action: Action {
                topic: "alerts/${device.id}".to_string(),
                target_broker: Some("cloud".to_string()),
                payload: "{\"value\":${temperature}}".to_string(),
                qos: 1,
                retain: false,
                headers: None,
            },
            priority: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn well_formed_rule_passes() {
        assert!(validate_rule(&rule()).is_ok());
    }

    #[test]
    fn wildcard_misplacement_is_an_invalid_pattern() {
        let mut bad = rule();
        bad.topic = "sensors/#/temperature".to_string();
        assert!(matches!(
            validate_rule(&bad),
            Err(RouterError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn qos_out_of_range_is_rejected() {
        let mut bad = rule();
        bad.action.qos = 3;
        assert!(matches!(
            validate_rule(&bad),
            Err(RouterError::InvalidRule { ref field, .. }) if field == "action.qos"
        ));
    }

    #[test]
    fn empty_action_topic_is_rejected() {
        let mut bad = rule();
        bad.action.topic = String::new();
        assert!(validate_rule(&bad).is_err());
    }

    #[test]
    fn malformed_template_variables_are_rejected() {
        let mut bad = rule();
        bad.action.payload = "${9lives}".to_string();
        assert!(validate_rule(&bad).is_err());

        let mut spaced = rule();
        spaced.action.topic = "alerts/${device id}".to_string();
        assert!(validate_rule(&spaced).is_err());
    }

    #[test]
    fn builtin_function_placeholders_are_accepted() {
        let mut with_fn = rule();
        with_fn.action.payload = "{\"id\":\"${uuid7()}\"}".to_string();
        assert!(validate_rule(&with_fn).is_ok());
    }

    #[test]
    fn bad_matches_regex_is_rejected_at_load() {
        let mut bad = rule();
        bad.conditions = Some(Conditions {
            operator: LogicOp::And,
            items: vec![Condition {
                field: "serial".to_string(),
                operator: CompareOp::Matches,
                value: json!("(["),
            }],
            groups: vec![],
        });
        assert!(validate_rule(&bad).is_err());

        let mut non_string = rule();
        non_string.conditions = Some(Conditions {
            operator: LogicOp::Or,
            items: vec![Condition {
                field: "serial".to_string(),
                operator: CompareOp::Matches,
                value: json!(7),
            }],
            groups: vec![],
        });
        assert!(validate_rule(&non_string).is_err());
    }

    #[test]
    fn empty_condition_field_in_nested_group_is_rejected() {
        let mut bad = rule();
        bad.conditions = Some(Conditions {
            operator: LogicOp::And,
            items: vec![],
            groups: vec![Conditions {
                operator: LogicOp::Or,
                items: vec![Condition {
                    field: String::new(),
                    operator: CompareOp::Exists,
                    value: json!(null),
                }],
                groups: vec![],
            }],
        });
        let err = validate_rule(&bad).unwrap_err();
        assert!(err.to_string().contains("conditions.groups[0].items[0]"));
    }

    #[test]
    fn duplicate_patterns_across_a_set_are_rejected() {
        let rules = vec![rule(), rule()];
        assert!(matches!(
            validate_rules(&rules),
            Err(RouterError::DuplicatePattern { .. })
        ));
    }
}
