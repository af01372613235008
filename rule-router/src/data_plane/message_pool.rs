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

//! Reusable per-message scratch objects.
//!
//! JSON decoding dominates per-message allocation, so in-flight messages and
//! processing results are pooled free-list style. A message is owned
//! exclusively by one worker from `get` to `put`; `put` zeroes every scratch
//! field, so a later `get` always observes an empty message.

use crate::errors::RouterError;
use crate::rule::{RenderedAction, Rule};
use crate::value::ValueMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// An in-flight message and its per-pipeline scratch state.
#[derive(Debug, Default)]
pub struct PooledMessage {
    /// Source topic the message arrived on.
    pub topic: String,
    /// Broker the message arrived via, when known.
    pub source_broker: Option<String>,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
    /// Parsed payload values.
    pub values: ValueMap,
    /// Rules matched by the topic index.
    pub rules: Vec<Arc<Rule>>,
    /// Actions rendered for the matched rules.
    pub actions: Vec<RenderedAction>,
}

impl PooledMessage {
    fn reset(&mut self) {
        self.topic.clear();
        self.source_broker = None;
        self.payload.clear();
        self.values.clear();
        self.rules.clear();
        self.actions.clear();
    }
}

/// Free list of [`PooledMessage`] objects shared by all workers.
#[derive(Debug, Default)]
pub struct MessagePool {
    free: Mutex<Vec<Box<PooledMessage>>>,
}

impl MessagePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a message from the pool, allocating when the pool is empty.
    pub fn get(&self) -> Box<PooledMessage> {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Zeroes the scratch fields and returns the message to the pool.
    pub fn put(&self, mut message: Box<PooledMessage>) {
        message.reset();
        self.free.lock().push(message);
    }

    /// Number of messages currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/// Outcome of one asynchronous pipeline run, pooled alongside the messages.
#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub matched_actions: usize,
    pub error: Option<RouterError>,
}

impl ProcessingResult {
    fn reset(&mut self) {
        self.matched_actions = 0;
        self.error = None;
    }
}

/// Free list of [`ProcessingResult`] objects.
#[derive(Debug, Default)]
pub struct ResultPool {
    free: Mutex<Vec<Box<ProcessingResult>>>,
}

impl ResultPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Box<ProcessingResult> {
        self.free.lock().pop().unwrap_or_default()
    }

    pub fn put(&self, mut result: Box<ProcessingResult>) {
        result.reset();
        self.free.lock().push(result);
    }
}
