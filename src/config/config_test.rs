use std::time::Duration;

use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_store_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("RAFT_STORE__") {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = StoreConfig::default();

    assert_eq!(config.data_dir, std::env::temp_dir().join("sled-raft-store"));
    assert_eq!(config.maintenance.reclaim_interval(), Duration::from_secs(2 * 60 * 60));
    assert_eq!(config.maintenance.sync_interval(), Duration::from_secs(30 * 60));
    assert_eq!(config.maintenance.reclaim_ratio, 0.7);
    assert!(!config.engine.detect_conflicts);
    assert!(!config.engine.enable_metrics);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_without_sources_should_match_defaults() {
    cleanup_all_store_env_vars();
    let config = StoreConfig::load(None).unwrap();
    let defaults = StoreConfig::default();

    assert_eq!(config.data_dir, defaults.data_dir);
    assert_eq!(config.engine.max_txn_entries, defaults.engine.max_txn_entries);
    assert_eq!(config.engine.flush_every_ms, Some(10));
}

#[test]
#[serial]
fn load_should_merge_environment_overrides() {
    cleanup_all_store_env_vars();
    with_vars(
        vec![
            ("RAFT_STORE__MAINTENANCE__RECLAIM_RATIO", Some("0.5")),
            ("RAFT_STORE__ENGINE__MAX_TXN_ENTRIES", Some("64")),
            ("RAFT_STORE__ENGINE__DETECT_CONFLICTS", Some("true")),
        ],
        || {
            let config = StoreConfig::load(None).unwrap();

            assert_eq!(config.maintenance.reclaim_ratio, 0.5);
            assert_eq!(config.engine.max_txn_entries, 64);
            assert!(config.engine.detect_conflicts);
        },
    );
}

#[test]
#[serial]
fn load_should_merge_file_settings() {
    cleanup_all_store_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("store.toml");

    std::fs::write(
        &config_path,
        r#"
        data_dir = "/tmp/raft-store-test"

        [maintenance]
        sync_interval_in_ms = 1000
        "#,
    )
    .unwrap();

    let config = StoreConfig::load(Some(config_path.to_str().unwrap())).unwrap();

    assert_eq!(config.data_dir, PathBuf::from("/tmp/raft-store-test"));
    assert_eq!(config.maintenance.sync_interval_in_ms, 1000);
    // untouched sections keep their defaults
    assert_eq!(config.maintenance.reclaim_ratio, 0.7);
    assert_eq!(config.engine.compression_factor, 1);
}

#[test]
#[serial]
fn environment_should_win_over_file() {
    cleanup_all_store_env_vars();
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("store.toml");
    std::fs::write(&config_path, "[engine]\nmax_txn_bytes = 2048\n").unwrap();

    with_vars(vec![("RAFT_STORE__ENGINE__MAX_TXN_BYTES", Some("4096"))], || {
        let config = StoreConfig::load(Some(config_path.to_str().unwrap())).unwrap();
        assert_eq!(config.engine.max_txn_bytes, 4096);
    });
}

#[test]
#[serial]
fn load_should_fail_on_missing_file() {
    cleanup_all_store_env_vars();
    assert!(StoreConfig::load(Some("/definitely/not/here/store.toml")).is_err());
}

#[test]
#[serial]
fn load_should_reject_invalid_values() {
    cleanup_all_store_env_vars();
    with_vars(vec![("RAFT_STORE__MAINTENANCE__RECLAIM_RATIO", Some("1.5"))], || {
        let e = StoreConfig::load(None).unwrap_err();
        assert!(matches!(e, Error::Config(_)));
    });
}

#[test]
fn validate_should_reject_zero_intervals() {
    let mut config = StoreConfig::default();
    config.maintenance.sync_interval_in_ms = 0;
    assert!(config.validate().is_err());

    let mut config = StoreConfig::default();
    config.maintenance.reclaim_interval_in_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_should_reject_bad_engine_settings() {
    let mut config = StoreConfig::default();
    config.engine.max_txn_entries = 0;
    assert!(config.validate().is_err());

    let mut config = StoreConfig::default();
    config.engine.compression_factor = 23;
    assert!(config.validate().is_err());

    let mut config = StoreConfig::default();
    config.engine.flush_every_ms = Some(0);
    assert!(config.validate().is_err());

    let mut config = StoreConfig::default();
    config.engine.flush_every_ms = None;
    assert!(config.validate().is_ok());
}

#[test]
fn validate_should_reject_ratio_bounds() {
    for ratio in [0.0, 1.0, -0.2] {
        let mut config = StoreConfig::default();
        config.maintenance.reclaim_ratio = ratio;
        assert!(config.validate().is_err(), "ratio {ratio} should be rejected");
    }
}

#[test]
fn with_data_dir_should_keep_other_defaults() {
    let config = StoreConfig::with_data_dir("/var/lib/raft");
    assert_eq!(config.data_dir, PathBuf::from("/var/lib/raft"));
    assert_eq!(config.maintenance.max_reclaim_passes, 16);
}
