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

//! Routing-rule data model.
//!
//! A [`Rule`] binds a source-topic pattern to an optional [`Conditions`] tree
//! and a mandatory [`Action`]. Rules are loaded once at startup, validated by
//! the control plane and installed into the topic index; the index references
//! them through `Arc` handles for the process lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A message routing rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Source topic pattern, possibly containing `+`/`#` wildcards.
    pub topic: String,
    /// Restricts the rule to messages that arrived via this broker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled rules stay in the index but are skipped by the processor.
    /// Absent in a rule file means enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
    pub action: Action,
    /// Parsed and preserved; not honored by processing order.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

/// A group of conditions joined by a logical operator. Groups nest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conditions {
    pub operator: LogicOp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Conditions>,
}

impl Conditions {
    /// A group with neither items nor nested groups evaluates to TRUE.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.groups.is_empty()
    }
}

/// A single field comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    /// Field name; dotted paths descend through nested payload maps.
    pub field: String,
    pub operator: CompareOp,
    #[serde(default)]
    pub value: Value,
}

/// Logical operator for a [`Conditions`] group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicOp {
    And,
    Or,
}

/// Comparison operator for a leaf [`Condition`]. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Exists,
    Contains,
    Matches,
}

/// What to publish when a rule matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Target topic template.
    pub topic: String,
    /// Required whenever more than one target broker is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_broker: Option<String>,
    /// Payload template; empty template renders an empty payload.
    #[serde(default)]
    pub payload: String,
    /// MQTT QoS level, 0..=2.
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retain: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// A fully rendered action, ready to hand to a broker adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAction {
    pub target_broker: Option<String>,
    pub topic: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
    pub headers: Option<HashMap<String, String>>,
}

/// A named collection of rules with file-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rules: Vec<Rule>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// The two accepted on-disk forms: a rule-set object or a bare rule array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RuleFile {
    Set(RuleSet),
    List(Vec<Rule>),
}

impl RuleFile {
    pub fn into_rules(self) -> Vec<Rule> {
        match self {
            RuleFile::Set(set) => set.rules,
            RuleFile::List(rules) => rules,
        }
    }
}
