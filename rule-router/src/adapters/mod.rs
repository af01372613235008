//! Broker adapter contract and the pieces the core owns around it.
//!
//! Concrete MQTT/NATS client bindings live outside this crate behind the
//! [`Broker`] trait; the core contributes the contract itself, the
//! topic↔subject translation for NATS-style adapters, the multi-broker
//! manager and an in-process loopback broker used by the binary's `memory`
//! broker kind and by the test suites.

mod broker;
mod in_proc;
mod manager;
pub mod subject;

pub use broker::{Broker, BrokerRole, BrokerState, MessageListener};
pub use in_proc::InProcBroker;
pub use manager::{BrokerManager, IngressListener};
