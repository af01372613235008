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

//! Worker task: a dedicated runtime thread draining the ingress queue.
//!
//! State machine: `Idle → Running` on receive, `Running → Idle` on
//! pool-return, `{Idle, Running} → Draining` once the queue is closed,
//! `Draining → Stopped` after the final pool-return. A worker always
//! finishes its current message before exiting.

use crate::data_plane::message_pool::PooledMessage;
use crate::data_plane::processor::PipelineShared;
use crate::observability::{events, fields::WorkerContext};
use async_channel::Receiver;
use metrics::gauge;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

const COMPONENT: &str = "worker";

/// Observable lifecycle state of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Waiting on the ingress queue.
    Idle = 0,
    /// Owns a message, running the pipeline.
    Running = 1,
    /// Queue closed; finishing the backlog.
    Draining = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            2 => WorkerState::Draining,
            _ => WorkerState::Stopped,
        }
    }
}

pub(crate) struct WorkerHandle {
    state: Arc<AtomicU8>,
    join: thread::JoinHandle<()>,
}

impl WorkerHandle {
    /// Shared handle onto the worker's lifecycle state; outlives the join.
    pub(crate) fn state_handle(&self) -> Arc<AtomicU8> {
        self.state.clone()
    }

    pub(crate) fn join(self) {
        let _ = self.join.join();
    }
}

pub(crate) fn read_state(state: &AtomicU8) -> WorkerState {
    WorkerState::from_u8(state.load(Ordering::Acquire))
}

/// Spawns one worker on a dedicated named thread running a current-thread
/// runtime for its drain loop.
pub(crate) fn spawn_worker(
    worker_id: usize,
    shared: Arc<PipelineShared>,
    ingress: Receiver<Box<PooledMessage>>,
) -> WorkerHandle {
    let state = Arc::new(AtomicU8::new(WorkerState::Idle as u8));
    let loop_state = state.clone();

    let join = thread::Builder::new()
        .name(format!("router-worker-{worker_id}"))
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to create router worker runtime");
            runtime.block_on(worker_loop(worker_id, loop_state, shared, ingress));
        })
        .expect("failed to spawn router worker thread");

    WorkerHandle { state, join }
}

async fn worker_loop(
    worker_id: usize,
    state: Arc<AtomicU8>,
    shared: Arc<PipelineShared>,
    ingress: Receiver<Box<PooledMessage>>,
) {
    let worker_context = WorkerContext::with_current_thread(worker_id);
    debug!(
        event = events::WORKER_SPAWN,
        component = COMPONENT,
        worker_id,
        worker_thread = worker_context.worker_thread.as_str(),
        "worker started"
    );

    loop {
        match ingress.recv().await {
            Ok(mut message) => {
                let busy = if ingress.is_closed() {
                    WorkerState::Draining
                } else {
                    WorkerState::Running
                };
                set_state(&state, worker_id, busy);
                gauge!("message_queue_depth").set(ingress.len() as f64);

                let mut result = shared.results.get();
                match shared.run_pipeline(&mut message).await {
                    Ok(()) => result.matched_actions = message.actions.len(),
                    Err(err) => result.error = Some(err),
                }

                if let Some(err) = &result.error {
                    debug!(
                        event = events::WORKER_MESSAGE_DROPPED,
                        component = COMPONENT,
                        worker_id,
                        worker_thread = worker_context.worker_thread.as_str(),
                        topic = message.topic.as_str(),
                        err = %err,
                        "message dropped"
                    );
                }

                shared.results.put(result);
                shared.pool.put(message);

                let next = if ingress.is_closed() {
                    WorkerState::Draining
                } else {
                    WorkerState::Idle
                };
                set_state(&state, worker_id, next);
            }
            Err(_) => {
                set_state(&state, worker_id, WorkerState::Stopped);
                info!(
                    event = events::WORKER_RECV_CLOSED,
                    component = COMPONENT,
                    worker_id,
                    worker_thread = worker_context.worker_thread.as_str(),
                    "ingress queue closed; worker exiting"
                );
                break;
            }
        }
    }
}

fn set_state(state: &AtomicU8, worker_id: usize, next: WorkerState) {
    state.store(next as u8, Ordering::Release);
    gauge!("worker_state", "worker" => worker_id.to_string()).set(next as u8 as f64);
}
