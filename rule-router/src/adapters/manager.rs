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

//! Multi-broker registry and action routing.
//!
//! The manager owns every configured broker, routes each rendered action to
//! its target broker (falling back to the single configured target when the
//! action carries none) and bridges broker ingress into the processor's
//! queued path.

use crate::adapters::broker::{Broker, BrokerRole, MessageListener};
use crate::data_plane::{ActionPublisher, Processor};
use crate::errors::RouterError;
use crate::observability::events;
use crate::rule::{RenderedAction, Rule};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

const COMPONENT: &str = "broker_manager";

/// Registry of managed brokers, keyed by id.
#[derive(Default)]
pub struct BrokerManager {
    brokers: RwLock<HashMap<String, Arc<dyn Broker>>>,
}

impl BrokerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a broker; duplicate ids are rejected.
    pub fn add_broker(&self, broker: Arc<dyn Broker>) -> Result<(), RouterError> {
        let mut brokers = self.brokers.write();
        let id = broker.id().to_string();
        if brokers.contains_key(&id) {
            return Err(RouterError::InvalidRule {
                field: "brokers".to_string(),
                reason: format!("broker with id `{id}` already exists"),
            });
        }
        brokers.insert(id, broker);
        Ok(())
    }

    pub fn broker(&self, id: &str) -> Option<Arc<dyn Broker>> {
        self.brokers.read().get(id).cloned()
    }

    /// All brokers able to act in the given direction. `Both` qualifies for
    /// either.
    pub fn brokers_by_role(&self, role: BrokerRole) -> Vec<Arc<dyn Broker>> {
        self.brokers
            .read()
            .values()
            .filter(|broker| match role {
                BrokerRole::Source => broker.role().can_source(),
                BrokerRole::Target => broker.role().can_target(),
                BrokerRole::Both => broker.role() == BrokerRole::Both,
            })
            .cloned()
            .collect()
    }

    pub async fn connect_all(&self) -> Result<(), RouterError> {
        let brokers: Vec<Arc<dyn Broker>> = self.brokers.read().values().cloned().collect();
        for broker in brokers {
            broker.connect().await?;
        }
        Ok(())
    }

    pub async fn disconnect_all(&self) {
        let brokers: Vec<Arc<dyn Broker>> = self.brokers.read().values().cloned().collect();
        for broker in brokers {
            if let Err(err) = broker.disconnect().await {
                warn!(
                    event = events::BROKER_DISCONNECTED,
                    component = COMPONENT,
                    broker_id = broker.id(),
                    err = %err,
                    "broker disconnect failed"
                );
            }
        }
    }

    /// Subscribes every source-capable broker to the patterns, installing
    /// the given listener.
    pub async fn subscribe_sources(
        &self,
        patterns: &[String],
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), RouterError> {
        for broker in self.brokers_by_role(BrokerRole::Source) {
            broker.subscribe(patterns, listener.clone()).await?;
        }
        Ok(())
    }

    /// Checks that every enabled rule names a resolvable target broker.
    /// With exactly one target-capable broker the tag may be omitted; with
    /// more it is required.
    pub fn check_rule_targets(&self, rules: &[Rule]) -> Result<(), RouterError> {
        let targets = self.brokers_by_role(BrokerRole::Target);
        for rule in rules.iter().filter(|rule| rule.enabled) {
            match &rule.action.target_broker {
                Some(id) => {
                    let known = targets.iter().any(|broker| broker.id() == id);
                    if !known {
                        return Err(RouterError::InvalidRule {
                            field: "action.targetBroker".to_string(),
                            reason: format!(
                                "rule `{}` names unknown target broker `{id}`",
                                rule.topic
                            ),
                        });
                    }
                }
                None if targets.len() > 1 => {
                    return Err(RouterError::InvalidRule {
                        field: "action.targetBroker".to_string(),
                        reason: format!(
                            "rule `{}` must name a target broker when several are configured",
                            rule.topic
                        ),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    fn resolve_target(&self, action: &RenderedAction) -> Result<Arc<dyn Broker>, RouterError> {
        if let Some(id) = &action.target_broker {
            return self
                .broker(id)
                .filter(|broker| broker.role().can_target())
                .ok_or_else(|| RouterError::UnknownBroker(id.clone()));
        }

        let mut targets = self.brokers_by_role(BrokerRole::Target);
        match targets.len() {
            1 => Ok(targets.remove(0)),
            0 => Err(RouterError::UnknownBroker("<no target broker>".to_string())),
            _ => {
                warn!(
                    event = events::BROKER_ROUTE_MISSING_TARGET,
                    component = COMPONENT,
                    topic = action.topic.as_str(),
                    "action names no target broker and several are configured"
                );
                Err(RouterError::UnknownBroker("<ambiguous target>".to_string()))
            }
        }
    }

    /// Routes one rendered action to its target broker.
    pub async fn route(&self, action: &RenderedAction) -> Result<(), RouterError> {
        let broker = self.resolve_target(action)?;
        broker
            .publish(&action.topic, action.payload.as_bytes(), action.qos, action.retain)
            .await
            .map_err(|err| {
                warn!(
                    event = events::BROKER_PUBLISH_FAILED,
                    component = COMPONENT,
                    broker_id = broker.id(),
                    topic = action.topic.as_str(),
                    err = %err,
                    "routed publish failed"
                );
                err
            })
    }
}

#[async_trait]
impl ActionPublisher for BrokerManager {
    async fn publish_action(&self, action: &RenderedAction) -> Result<(), RouterError> {
        self.route(action).await
    }
}

/// Bridges broker ingress into the processor's bounded queue. Awaiting the
/// enqueue propagates backpressure to the broker callback when the queue is
/// full.
pub struct IngressListener {
    processor: Arc<Processor>,
    broker_id: String,
}

impl IngressListener {
    pub fn new(processor: Arc<Processor>, broker_id: impl Into<String>) -> Self {
        Self {
            processor,
            broker_id: broker_id.into(),
        }
    }
}

#[async_trait]
impl MessageListener for IngressListener {
    async fn on_message(&self, topic: &str, payload: &[u8]) {
        if let Err(err) = self
            .processor
            .submit(Some(&self.broker_id), topic, payload)
            .await
        {
            warn!(
                component = COMPONENT,
                broker_id = self.broker_id.as_str(),
                topic,
                err = %err,
                "unable to enqueue ingress message"
            );
        }
    }
}
