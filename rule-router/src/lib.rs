/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
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

//! # rule-router
//!
//! `rule-router` implements a rule-driven message router core: it matches
//! concrete pub/sub topics against MQTT-style wildcard patterns, evaluates
//! structured predicates over JSON payloads, renders `${path}` templates and
//! hands the results to broker adapters for republication.
//!
//! Internal modules are organized by domain layer to keep behavior ownership
//! explicit: [`routing`] owns the indexed topic trie, [`predicate`] the
//! condition evaluator, [`template`] the renderer, [`data_plane`] the pooled
//! worker pipeline, [`control_plane`] rule intake and [`adapters`] the
//! broker seam.
//!
//! ## Quick start
//!
//! ```
//! use rule_router::{Processor, ProcessorOptions, Rule};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let processor = Processor::new(ProcessorOptions::default());
//!
//! let rules: Vec<Rule> = serde_json::from_str(
//!     r#"[
//!         { "topic": "sensors/temperature",
//!           "conditions": {
//!               "operator": "and",
//!               "items": [ { "field": "temperature", "operator": "gt", "value": 30 } ]
//!           },
//!           "action": { "topic": "alerts/temp", "payload": "{\"alert\":${temperature}}" } }
//!     ]"#,
//! )
//! .unwrap();
//! processor.load_rules(rules).unwrap();
//!
//! let actions = processor
//!     .process("sensors/temperature", br#"{"temperature":32.5}"#)
//!     .await
//!     .unwrap();
//! assert_eq!(actions[0].topic, "alerts/temp");
//! assert_eq!(actions[0].payload, "{\"alert\":32.5}");
//!
//! processor.close();
//! # });
//! ```
//!
//! ## Wiring brokers
//!
//! Concrete MQTT/NATS clients implement [`Broker`] outside this crate; the
//! crate ships [`InProcBroker`] as a loopback implementation, the
//! [`BrokerManager`] registry that routes rendered actions to their target
//! broker, and [`IngressListener`] to feed broker callbacks into the
//! processor's bounded queue.

pub mod adapters;
pub mod control_plane;
pub mod data_plane;
mod errors;
pub mod observability;
pub mod predicate;
pub mod routing;
mod rule;
pub mod template;
pub mod value;

pub use adapters::{
    Broker, BrokerManager, BrokerRole, BrokerState, InProcBroker, IngressListener,
    MessageListener,
};
pub use control_plane::{load_rules_dir, load_rules_file, validate_rule, validate_rules};
pub use data_plane::{
    ActionPublisher, MessagePool, PipelineStats, PooledMessage, Processor, ProcessorOptions,
    ResultPool, WorkerState,
};
pub use errors::RouterError;
pub use predicate::evaluate;
pub use routing::{IndexStats, TopicIndex};
pub use rule::{
    Action, CompareOp, Condition, Conditions, LogicOp, RenderedAction, Rule, RuleFile, RuleSet,
};
pub use template::{render_payload, render_topic};
