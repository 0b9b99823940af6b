use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::warn;


lazy_static! {
    pub static ref LOG_ENTRIES_WRITTEN: IntCounter = IntCounter::new(
        "raft_store_log_entries_written",
        "Log entries committed through store_log and store_logs"
    )
    .expect("metric can not be created");

    pub static ref LOG_ENTRIES_DELETED: IntCounter = IntCounter::new(
        "raft_store_log_entries_deleted",
        "Log entries removed by delete_range"
    )
    .expect("metric can not be created");

    pub static ref RANGE_DELETE_PARTIAL_COMMITS: IntCounter = IntCounter::new(
        "raft_store_range_delete_partial_commits",
        "Commits forced by the transaction budget in the middle of a delete_range"
    )
    .expect("metric can not be created");

    pub static ref RECLAIM_PASSES: IntCounter = IntCounter::new(
        "raft_store_reclaim_passes",
        "Reclamation passes that freed space"
    )
    .expect("metric can not be created");

    pub static ref SYNC_FAILURES: IntCounter = IntCounter::new(
        "raft_store_sync_failures",
        "Periodic durability syncs that failed"
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers the store counters into [`REGISTRY`]. Safe to call repeatedly.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(LOG_ENTRIES_WRITTEN.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(LOG_ENTRIES_DELETED.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(RANGE_DELETE_PARTIAL_COMMITS.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(RECLAIM_PASSES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(SYNC_FAILURES.clone()))
            .expect("collector can be registered");
    });
}

/// Renders [`REGISTRY`] in the prometheus text exposition format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        warn!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            warn!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
