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

//! The broker adapter contract.
//!
//! The core guarantees that topic patterns handed to [`Broker::subscribe`]
//! are valid MQTT-style strings; the adapter guarantees the listener is
//! invoked at most once per received message and is responsible for
//! resubscription after reconnect.

use crate::errors::RouterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which direction(s) a broker participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerRole {
    /// Only provides source messages.
    Source,
    /// Only receives routed messages.
    Target,
    /// Acts as both source and target.
    Both,
}

impl BrokerRole {
    pub fn can_source(&self) -> bool {
        matches!(self, BrokerRole::Source | BrokerRole::Both)
    }

    pub fn can_target(&self) -> bool {
        matches!(self, BrokerRole::Target | BrokerRole::Both)
    }
}

/// Connection lifecycle state of a broker adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Error,
}

/// Receives messages from a subscribed broker. Implemented over the
/// processor by [`IngressListener`].
///
/// [`IngressListener`]: crate::adapters::IngressListener
#[async_trait]
pub trait MessageListener: Send + Sync {
    async fn on_message(&self, topic: &str, payload: &[u8]);
}

/// A managed broker connection.
#[async_trait]
pub trait Broker: Send + Sync {
    fn id(&self) -> &str;

    fn role(&self) -> BrokerRole;

    fn state(&self) -> BrokerState;

    fn is_connected(&self) -> bool {
        self.state() == BrokerState::Connected
    }

    async fn connect(&self) -> Result<(), RouterError>;

    async fn disconnect(&self) -> Result<(), RouterError>;

    /// Installs a single listener for the given topic patterns. Adapters
    /// translate the router's MQTT-style patterns to their native format
    /// (see [`subject`] for the NATS mapping) and retain the pattern list
    /// for resubscription after reconnect.
    ///
    /// [`subject`]: crate::adapters::subject
    async fn subscribe(
        &self,
        patterns: &[String],
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), RouterError>;

    /// Publishes one message. Failures are reported as
    /// [`RouterError::Publish`] and are non-fatal to the pipeline.
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: u8,
        retain: bool,
    ) -> Result<(), RouterError>;
}
