use std::path::Path;

use tempfile::TempDir;

use crate::EngineConfig;
use crate::RaftStore;
use crate::StoreConfig;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Store settings rooted at `dir` with the given transaction entry budget.
pub fn store_config(
    dir: &Path,
    max_txn_entries: usize,
) -> StoreConfig {
    StoreConfig {
        engine: EngineConfig {
            max_txn_entries,
            flush_every_ms: None,
            ..Default::default()
        },
        ..StoreConfig::with_data_dir(dir)
    }
}

/// Opens a store in a fresh temp dir. Must run inside a tokio runtime.
pub fn setup_store() -> (RaftStore, TempDir) {
    setup_store_with(|_| {})
}

pub fn setup_store_with(customize: impl FnOnce(&mut StoreConfig)) -> (RaftStore, TempDir) {
    let tempdir = tempfile::tempdir().unwrap();
    let mut config = store_config(tempdir.path(), 100_000);
    customize(&mut config);
    let store = RaftStore::open(config).unwrap();
    (store, tempdir)
}
