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

//! Error kinds visible at the core boundary.
//!
//! Load-time errors ([`RouterError::InvalidPattern`], [`RouterError::InvalidRule`],
//! the rule-file variants) abort startup. Runtime errors are per-message or
//! per-action and never terminate a worker.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    /// A rule pattern violates the wildcard-placement rules.
    #[error("invalid topic pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A rule failed structural validation.
    #[error("invalid rule ({field}): {reason}")]
    InvalidRule { field: String, reason: String },

    /// An incoming payload could not be decoded as a JSON object.
    #[error("payload is not a JSON object: {reason}")]
    InvalidPayload { reason: String },

    /// A placeholder in an action topic template could not be resolved.
    /// No partially rendered topic is ever published.
    #[error("unresolved topic template variable `${{{path}}}`")]
    MissingTopicVariable { path: String },

    /// The bounded ingress queue rejected a submission.
    #[error("ingress queue is full")]
    QueueFull,

    /// The ingress queue has been closed; the processor is shutting down.
    #[error("ingress queue is closed")]
    QueueClosed,

    /// Reported by a broker adapter on a failed publish. Counted, logged,
    /// non-fatal.
    #[error("publish via broker `{broker}` failed: {reason}")]
    Publish { broker: String, reason: String },

    /// The rule handed to `remove` is not present in the index.
    #[error("rule with pattern `{pattern}` is not present in the index")]
    RuleNotFound { pattern: String },

    /// No broker with the given id is registered with the manager.
    #[error("broker `{0}` is not registered")]
    UnknownBroker(String),

    /// Two loaded rules carry the same source-topic pattern.
    #[error("duplicate topic pattern `{pattern}` across loaded rule files")]
    DuplicatePattern { pattern: String },

    /// A rule file could not be read.
    #[error("unable to read rule file {path}")]
    RuleFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule file could not be parsed.
    #[error("unable to parse rule file {path}: {source}")]
    RuleFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
