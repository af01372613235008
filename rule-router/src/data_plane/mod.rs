//! Per-message pipeline ownership: pooled scratch buffers, the bounded
//! ingress queue and the worker pool that drains it.

mod message_pool;
mod processor;
mod worker;

pub use message_pool::{MessagePool, PooledMessage, ProcessingResult, ResultPool};
pub use processor::{ActionPublisher, PipelineStats, Processor, ProcessorOptions};
pub use worker::WorkerState;
