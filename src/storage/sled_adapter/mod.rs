// Submodule declaration
// -----------------------------------------------------------------------------
mod sled_engine;


// Re-export
// -----------------------------------------------------------------------------
pub use sled_engine::*;

use std::path::Path;

use crate::constants::DB_DIR_NAME;
use crate::EngineConfig;
use crate::Result;
use crate::StorageError;

/// Opens (or creates) the sled database below `data_dir`.
#[doc(hidden)]
pub fn init_sled_db(
    data_dir: impl AsRef<Path> + std::fmt::Debug,
    config: &EngineConfig,
) -> Result<sled::Db> {
    tracing::debug!("init_sled_db from path: {:?}", &data_dir);

    let data_dir = data_dir.as_ref();
    std::fs::create_dir_all(data_dir).map_err(|e| StorageError::PathError {
        path: data_dir.to_path_buf(),
        source: e,
    })?;

    let db_path = data_dir.join(DB_DIR_NAME);
    let mode = if config.high_throughput {
        sled::Mode::HighThroughput
    } else {
        sled::Mode::LowSpace
    };

    sled::Config::default()
        .path(&db_path)
        .cache_capacity(config.cache_capacity)
        .flush_every_ms(config.flush_every_ms)
        .use_compression(config.use_compression)
        .compression_factor(config.compression_factor)
        .mode(mode)
        .open()
        .map_err(|e| {
            tracing::warn!(
                "Try to open DB at this location: {:?} and failed: {:?}",
                db_path,
                e
            );
            e.into()
        })
}
