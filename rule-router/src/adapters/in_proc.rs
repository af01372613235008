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

//! In-process loopback broker.
//!
//! Backs the binary's `memory` broker kind and the integration suites: a
//! publish on a connected instance is dispatched directly to every
//! subscription whose pattern matches the topic, at most once per
//! subscription. Subscriptions survive disconnects, standing in for the
//! resubscription duty real adapters carry across reconnects.

use crate::adapters::broker::{Broker, BrokerRole, BrokerState, MessageListener};
use crate::errors::RouterError;
use crate::observability::events;
use crate::routing::pattern_matches;
use async_trait::async_trait;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

const COMPONENT: &str = "in_proc_broker";

struct Subscription {
    patterns: Vec<String>,
    listener: Arc<dyn MessageListener>,
}

/// Loopback broker: its egress is its own ingress.
pub struct InProcBroker {
    id: String,
    role: BrokerRole,
    state: Mutex<BrokerState>,
    subscriptions: Mutex<Vec<Subscription>>,
    connects: Mutex<u64>,
}

impl InProcBroker {
    pub fn new(id: impl Into<String>, role: BrokerRole) -> Self {
        Self {
            id: id.into(),
            role,
            state: Mutex::new(BrokerState::Disconnected),
            subscriptions: Mutex::new(Vec::new()),
            connects: Mutex::new(0),
        }
    }

    /// A connected broker of the given role.
    pub fn connected(id: impl Into<String>, role: BrokerRole) -> Self {
        let broker = Self::new(id, role);
        *broker.state.lock() = BrokerState::Connected;
        broker
    }
}

#[async_trait]
impl Broker for InProcBroker {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> BrokerRole {
        self.role
    }

    fn state(&self) -> BrokerState {
        *self.state.lock()
    }

    async fn connect(&self) -> Result<(), RouterError> {
        let reconnect = {
            let mut connects = self.connects.lock();
            *connects += 1;
            *connects > 1
        };
        *self.state.lock() = BrokerState::Connected;

        gauge!("broker_connection_status", "broker" => self.id.clone()).set(1.0);
        if reconnect {
            counter!("broker_reconnects_total", "broker" => self.id.clone()).increment(1);
            info!(
                event = events::BROKER_RECONNECTED,
                component = COMPONENT,
                broker_id = self.id.as_str(),
                "broker reconnected"
            );
        } else {
            info!(
                event = events::BROKER_CONNECTED,
                component = COMPONENT,
                broker_id = self.id.as_str(),
                "broker connected"
            );
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RouterError> {
        *self.state.lock() = BrokerState::Disconnected;
        gauge!("broker_connection_status", "broker" => self.id.clone()).set(0.0);
        info!(
            event = events::BROKER_DISCONNECTED,
            component = COMPONENT,
            broker_id = self.id.as_str(),
            "broker disconnected"
        );
        Ok(())
    }

    async fn subscribe(
        &self,
        patterns: &[String],
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), RouterError> {
        debug!(
            event = events::BROKER_SUBSCRIBE,
            component = COMPONENT,
            broker_id = self.id.as_str(),
            pattern_count = patterns.len(),
            "subscription installed"
        );
        self.subscriptions.lock().push(Subscription {
            patterns: patterns.to_vec(),
            listener,
        });
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        _qos: u8,
        _retain: bool,
    ) -> Result<(), RouterError> {
        if !self.is_connected() {
            return Err(RouterError::Publish {
                broker: self.id.clone(),
                reason: "broker is not connected".to_string(),
            });
        }

        // Snapshot listeners so dispatch runs without the lock held.
        let listeners: Vec<Arc<dyn MessageListener>> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .filter(|subscription| {
                    subscription
                        .patterns
                        .iter()
                        .any(|pattern| pattern_matches(pattern, topic))
                })
                .map(|subscription| subscription.listener.clone())
                .collect()
        };

        for listener in listeners {
            listener.on_message(topic, payload).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct Recorder {
        messages: AsyncMutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl MessageListener for Recorder {
        async fn on_message(&self, topic: &str, payload: &[u8]) {
            self.messages
                .lock()
                .await
                .push((topic.to_string(), payload.to_vec()));
        }
    }

    #[tokio::test]
    async fn publish_dispatches_to_matching_subscriptions_once() {
        let broker = InProcBroker::connected("local", BrokerRole::Both);
        let recorder = Arc::new(Recorder::default());

        // Overlapping patterns in one subscription still deliver once.
        broker
            .subscribe(
                &["sensors/#".to_string(), "sensors/+/temp".to_string()],
                recorder.clone(),
            )
            .await
            .unwrap();

        broker.publish("sensors/room1/temp", b"{}", 0, false).await.unwrap();
        broker.publish("actuators/valve", b"{}", 0, false).await.unwrap();

        let messages = recorder.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "sensors/room1/temp");
    }

    #[tokio::test]
    async fn publish_fails_while_disconnected() {
        let broker = InProcBroker::new("local", BrokerRole::Target);
        assert_eq!(broker.state(), BrokerState::Disconnected);

        let result = broker.publish("topic", b"{}", 0, false).await;
        assert!(matches!(result, Err(RouterError::Publish { .. })));
    }

    #[tokio::test]
    async fn subscriptions_survive_reconnect() {
        let broker = InProcBroker::new("local", BrokerRole::Both);
        let recorder = Arc::new(Recorder::default());

        broker.connect().await.unwrap();
        broker
            .subscribe(&["a/+".to_string()], recorder.clone())
            .await
            .unwrap();

        broker.disconnect().await.unwrap();
        broker.connect().await.unwrap();
        broker.publish("a/b", b"{}", 0, false).await.unwrap();

        assert_eq!(recorder.messages.lock().await.len(), 1);
        assert_eq!(broker.state(), BrokerState::Connected);
    }
}
