//! Canonical structured event names used across `rule-router`.

// Topic-index events.
pub const INDEX_RULE_ADD: &str = "index_rule_add";
pub const INDEX_RULE_REMOVE: &str = "index_rule_remove";
pub const INDEX_CLEARED: &str = "index_cleared";

// Pipeline events.
pub const PIPELINE_PARSE_FAILED: &str = "pipeline_parse_failed";
pub const PIPELINE_RENDER_FAILED: &str = "pipeline_render_failed";
pub const PIPELINE_PUBLISH_FAILED: &str = "pipeline_publish_failed";
pub const PIPELINE_RULES_LOADED: &str = "pipeline_rules_loaded";

// Worker and queue events.
pub const WORKER_SPAWN: &str = "worker_spawn";
pub const WORKER_RECV_CLOSED: &str = "worker_recv_closed";
pub const WORKER_MESSAGE_DROPPED: &str = "worker_message_dropped";
pub const QUEUE_SUBMIT_REJECTED: &str = "queue_submit_rejected";

// Rule-loading events.
pub const RULES_FILE_LOADED: &str = "rules_file_loaded";

// Broker adapter events.
pub const BROKER_CONNECTED: &str = "broker_connected";
pub const BROKER_DISCONNECTED: &str = "broker_disconnected";
pub const BROKER_RECONNECTED: &str = "broker_reconnected";
pub const BROKER_SUBSCRIBE: &str = "broker_subscribe";
pub const BROKER_PUBLISH_FAILED: &str = "broker_publish_failed";
pub const BROKER_ROUTE_MISSING_TARGET: &str = "broker_route_missing_target";
