//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use rule_router::{Broker, BrokerRole, BrokerState, MessageListener, RouterError};
use std::sync::Arc;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

/// Target-side broker that records every publish it receives.
pub struct RecordingBroker {
    id: String,
    role: BrokerRole,
    fail_publishes: bool,
    published: Mutex<Vec<(String, String)>>,
}

impl RecordingBroker {
    pub fn target(id: &str) -> Self {
        Self {
            id: id.to_string(),
            role: BrokerRole::Target,
            fail_publishes: false,
            published: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn failing_target(id: &str) -> Self {
        Self {
            fail_publishes: true,
            ..Self::target(id)
        }
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().clone()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().len()
    }
}

#[async_trait]
impl Broker for RecordingBroker {
    fn id(&self) -> &str {
        &self.id
    }

    fn role(&self) -> BrokerRole {
        self.role
    }

    fn state(&self) -> BrokerState {
        BrokerState::Connected
    }

    async fn connect(&self) -> Result<(), RouterError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RouterError> {
        Ok(())
    }

    async fn subscribe(
        &self,
        _patterns: &[String],
        _listener: Arc<dyn MessageListener>,
    ) -> Result<(), RouterError> {
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        _qos: u8,
        _retain: bool,
    ) -> Result<(), RouterError> {
        if self.fail_publishes {
            return Err(RouterError::Publish {
                broker: self.id.clone(),
                reason: "recording broker configured to fail".to_string(),
            });
        }
        self.published
            .lock()
            .push((topic.to_string(), String::from_utf8_lossy(payload).into_owned()));
        Ok(())
    }
}
