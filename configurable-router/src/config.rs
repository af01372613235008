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

use rule_router::BrokerRole;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub(crate) processing: ProcessingConfig,
    pub(crate) brokers: Vec<BrokerConfig>,
    #[serde(default)]
    pub(crate) metrics: MetricsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProcessingConfig {
    #[serde(default = "default_workers")]
    pub(crate) workers: usize,
    #[serde(default = "default_queue_size")]
    pub(crate) queue_size: usize,
    #[serde(default = "default_batch_size")]
    pub(crate) batch_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_size: default_queue_size(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_queue_size() -> usize {
    1000
}

fn default_batch_size() -> usize {
    100
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    pub(crate) id: String,
    pub(crate) role: BrokerRole,
    #[serde(default)]
    pub(crate) kind: BrokerKind,
    /// Connection details consumed by client-backed adapter kinds; the
    /// in-process kind ignores them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) password: Option<String>,
}

/// Adapter kind backing a broker entry. This build ships the in-process
/// loopback kind; MQTT/NATS client adapters plug in behind the same trait.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrokerKind {
    #[default]
    Memory,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub(crate) enabled: bool,
    #[serde(default = "default_metrics_address")]
    pub(crate) address: String,
    #[serde(default = "default_metrics_path")]
    pub(crate) path: String,
    #[serde(default = "default_metrics_interval_secs")]
    pub(crate) update_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_metrics_address(),
            path: default_metrics_path(),
            update_interval_secs: default_metrics_interval_secs(),
        }
    }
}

fn default_metrics_address() -> String {
    "127.0.0.1:9090".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_metrics_interval_secs() -> u64 {
    15
}

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub workers: Option<usize>,
    pub queue_size: Option<usize>,
    pub batch_size: Option<usize>,
    pub metrics_addr: Option<String>,
    pub metrics_path: Option<String>,
    pub metrics_interval_secs: Option<u64>,
}

impl Config {
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(workers) = overrides.workers {
            self.processing.workers = workers;
        }
        if let Some(queue_size) = overrides.queue_size {
            self.processing.queue_size = queue_size;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.processing.batch_size = batch_size;
        }
        if let Some(address) = overrides.metrics_addr {
            self.metrics.address = address;
        }
        if let Some(path) = overrides.metrics_path {
            self.metrics.path = path;
        }
        if let Some(interval) = overrides.metrics_interval_secs {
            self.metrics.update_interval_secs = interval;
        }
    }
}
