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

//! Processor: owns the full per-message pipeline and the resources shared
//! across workers.
//!
//! The pipeline is parse → match → evaluate → render → publish, strictly
//! CPU-bound between the JSON parse and the adapter's publish call. Broker
//! callbacks use [`Processor::process_from`] on the synchronous path or
//! [`Processor::submit`] to enqueue onto the bounded ingress queue, which
//! propagates backpressure to the producer when full.

use crate::data_plane::message_pool::{MessagePool, PooledMessage, ResultPool};
use crate::data_plane::worker::{read_state, spawn_worker, WorkerHandle, WorkerState};
use crate::errors::RouterError;
use crate::observability::events;
use crate::predicate::evaluate;
use crate::routing::TopicIndex;
use crate::rule::{RenderedAction, Rule};
use crate::template::{render_payload, render_topic};
use async_channel::{Receiver, Sender, TrySendError};
use async_trait::async_trait;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "processor";

/// Downstream seam for rendered actions. Implemented by the broker manager;
/// publish failures are counted and logged, never fatal.
#[async_trait]
pub trait ActionPublisher: Send + Sync {
    async fn publish_action(&self, action: &RenderedAction) -> Result<(), RouterError>;
}

/// Processor construction parameters.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    /// Number of concurrent worker tasks, at least 1.
    pub workers: usize,
    /// Bounded capacity of the ingress queue, at least 1.
    pub queue_size: usize,
    /// Advisory hint for downstream batching.
    pub batch_size: usize,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_size: 1000,
            batch_size: 100,
        }
    }
}

impl ProcessorOptions {
    fn normalized(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.queue_size = self.queue_size.max(1);
        self
    }
}

/// Atomic snapshot of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub matched: u64,
    pub errors: u64,
}

/// State shared between the processor facade and its workers.
pub(crate) struct PipelineShared {
    pub(crate) index: Arc<TopicIndex>,
    pub(crate) pool: MessagePool,
    pub(crate) results: ResultPool,
    publisher: Option<Arc<dyn ActionPublisher>>,
    processed: AtomicU64,
    matched: AtomicU64,
    errors: AtomicU64,
}

impl PipelineShared {
    fn new(publisher: Option<Arc<dyn ActionPublisher>>) -> Self {
        Self {
            index: Arc::new(TopicIndex::new()),
            pool: MessagePool::new(),
            results: ResultPool::new(),
            publisher,
            processed: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Runs match → parse → evaluate → render → publish over one pooled
    /// message. The caller owns the message and returns it to the pool on
    /// every exit path.
    pub(crate) async fn run_pipeline(
        &self,
        message: &mut PooledMessage,
    ) -> Result<(), RouterError> {
        self.index.find_into(&message.topic, &mut message.rules);
        if message.rules.is_empty() {
            self.record_processed(false);
            return Ok(());
        }

        match decode_object(&message.payload) {
            Ok(values) => message.values = values,
            Err(reason) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                counter!("messages_total", "status" => "error").increment(1);
                warn!(
                    event = events::PIPELINE_PARSE_FAILED,
                    component = COMPONENT,
                    topic = message.topic.as_str(),
                    reason = reason.as_str(),
                    "dropping message with undecodable payload"
                );
                return Err(RouterError::InvalidPayload { reason });
            }
        }

        let PooledMessage {
            rules,
            values,
            actions,
            source_broker,
            ..
        } = message;

        for rule in rules.iter() {
            if !rule.enabled {
                continue;
            }
            if let Some(wanted) = &rule.source_broker {
                if source_broker.as_deref() != Some(wanted.as_str()) {
                    continue;
                }
            }
            if !evaluate(rule.conditions.as_ref(), values) {
                continue;
            }

            // A render failure skips this one rule; the remaining rules for
            // the same message still run, and the error counter is untouched.
            let topic = match render_topic(&rule.action.topic, values) {
                Ok(topic) => topic,
                Err(err) => {
                    counter!("actions_total", "status" => "render_error").increment(1);
                    warn!(
                        event = events::PIPELINE_RENDER_FAILED,
                        component = COMPONENT,
                        pattern = rule.topic.as_str(),
                        err = %err,
                        "skipping rule with unrenderable action topic"
                    );
                    continue;
                }
            };
            let payload = render_payload(&rule.action.payload, values);

            actions.push(RenderedAction {
                target_broker: rule.action.target_broker.clone(),
                topic,
                payload,
                qos: rule.action.qos,
                retain: rule.action.retain,
                headers: rule.action.headers.clone(),
            });
        }

        if let Some(publisher) = &self.publisher {
            for action in actions.iter() {
                match publisher.publish_action(action).await {
                    Ok(()) => {
                        counter!("actions_total", "status" => "published").increment(1);
                    }
                    Err(err) => {
                        self.errors.fetch_add(1, Ordering::Relaxed);
                        counter!("actions_total", "status" => "error").increment(1);
                        warn!(
                            event = events::PIPELINE_PUBLISH_FAILED,
                            component = COMPONENT,
                            topic = action.topic.as_str(),
                            err = %err,
                            "publish failed; continuing with remaining actions"
                        );
                    }
                }
            }
        }

        self.record_processed(!actions.is_empty());
        Ok(())
    }

    fn record_processed(&self, matched: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        counter!("messages_total", "status" => "processed").increment(1);
        if matched {
            self.matched.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn decode_object(payload: &[u8]) -> Result<crate::value::ValueMap, String> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("top-level value is not an object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

/// Orchestrates parse → match → evaluate → render and owns the worker pool,
/// the ingress queue and the pipeline counters.
pub struct Processor {
    shared: Arc<PipelineShared>,
    options: ProcessorOptions,
    ingress_tx: Sender<Box<PooledMessage>>,
    workers: Mutex<Vec<WorkerHandle>>,
    worker_states: Vec<Arc<std::sync::atomic::AtomicU8>>,
}

impl Processor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self::with_publisher(options, None)
    }

    /// Builds the processor and spawns its workers. The publisher receives
    /// every rendered action on both the synchronous and queued paths.
    pub fn with_publisher(
        options: ProcessorOptions,
        publisher: Option<Arc<dyn ActionPublisher>>,
    ) -> Self {
        let options = options.normalized();
        let (ingress_tx, ingress_rx): (Sender<Box<PooledMessage>>, Receiver<Box<PooledMessage>>) =
            async_channel::bounded(options.queue_size);

        let shared = Arc::new(PipelineShared::new(publisher));
        let workers: Vec<WorkerHandle> = (0..options.workers)
            .map(|worker_id| spawn_worker(worker_id, shared.clone(), ingress_rx.clone()))
            .collect();
        let worker_states = workers.iter().map(WorkerHandle::state_handle).collect();

        Self {
            shared,
            options,
            ingress_tx,
            workers: Mutex::new(workers),
            worker_states,
        }
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    /// The topic index the processor matches against.
    pub fn index(&self) -> &Arc<TopicIndex> {
        &self.shared.index
    }

    /// Clears the index and installs a pre-validated rule set.
    pub fn load_rules(&self, rules: Vec<Rule>) -> Result<usize, RouterError> {
        self.shared.index.clear();
        let count = rules.len();
        for rule in rules {
            self.shared.index.add(Arc::new(rule))?;
        }

        info!(
            event = events::PIPELINE_RULES_LOADED,
            component = COMPONENT,
            rule_count = count,
            "rule set installed"
        );
        Ok(count)
    }

    /// Synchronous path: runs the pipeline in-line and returns the rendered
    /// actions as a fresh owned slice.
    pub async fn process(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<Vec<RenderedAction>, RouterError> {
        self.process_from(None, topic, payload).await
    }

    /// [`Processor::process`] with the source-broker tag used by per-rule
    /// source filters.
    pub async fn process_from(
        &self,
        source_broker: Option<&str>,
        topic: &str,
        payload: &[u8],
    ) -> Result<Vec<RenderedAction>, RouterError> {
        let mut message = self.checkout(source_broker, topic, payload);
        let outcome = self.shared.run_pipeline(&mut message).await;
        let result = outcome.map(|()| message.actions.clone());
        self.shared.pool.put(message);
        result
    }

    /// Queued path: blocks the producer while the bounded queue is full.
    pub async fn submit(
        &self,
        source_broker: Option<&str>,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), RouterError> {
        let message = self.checkout(source_broker, topic, payload);
        match self.ingress_tx.send(message).await {
            Ok(()) => {
                gauge!("message_processing_backlog").set(self.ingress_tx.len() as f64);
                Ok(())
            }
            Err(returned) => {
                self.shared.pool.put(returned.into_inner());
                Err(RouterError::QueueClosed)
            }
        }
    }

    /// Non-blocking variant of [`Processor::submit`]; fails with `QueueFull`
    /// so the broker adapter can decide to retry or drop.
    pub fn try_submit(
        &self,
        source_broker: Option<&str>,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), RouterError> {
        let message = self.checkout(source_broker, topic, payload);
        match self.ingress_tx.try_send(message) {
            Ok(()) => {
                gauge!("message_processing_backlog").set(self.ingress_tx.len() as f64);
                Ok(())
            }
            Err(TrySendError::Full(returned)) => {
                self.shared.pool.put(returned);
                counter!("messages_total", "status" => "rejected").increment(1);
                debug!(
                    event = events::QUEUE_SUBMIT_REJECTED,
                    component = COMPONENT,
                    topic,
                    "ingress queue full"
                );
                Err(RouterError::QueueFull)
            }
            Err(TrySendError::Closed(returned)) => {
                self.shared.pool.put(returned);
                Err(RouterError::QueueClosed)
            }
        }
    }

    fn checkout(
        &self,
        source_broker: Option<&str>,
        topic: &str,
        payload: &[u8],
    ) -> Box<PooledMessage> {
        let mut message = self.shared.pool.get();
        message.topic.push_str(topic);
        message.source_broker = source_broker.map(str::to_string);
        message.payload.extend_from_slice(payload);
        message
    }

    /// Current depth of the ingress queue.
    pub fn queue_depth(&self) -> usize {
        self.ingress_tx.len()
    }

    /// Atomic snapshot of `{processed, matched, errors}`.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            processed: self.shared.processed.load(Ordering::Relaxed),
            matched: self.shared.matched.load(Ordering::Relaxed),
            errors: self.shared.errors.load(Ordering::Relaxed),
        }
    }

    /// Lifecycle states of all workers, in spawn order.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.worker_states
            .iter()
            .map(|state| read_state(state))
            .collect()
    }

    /// Closes the ingress queue and waits for every worker to drain its
    /// backlog and exit. Idempotent.
    pub fn close(&self) {
        self.ingress_tx.close();
        let handles: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock();
            workers.drain(..).collect()
        };
        for handle in handles {
            handle.join();
        }
    }
}

impl Drop for Processor {
    fn drop(&mut self) {
        // Unblocks workers still parked on the queue; join is close()'s job.
        self.ingress_tx.close();
    }
}
