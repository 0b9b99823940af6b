use super::keys::*;
use crate::constants::LOG_PREFIX;
use crate::constants::META_PREFIX;
use crate::ConvertError;
use crate::Error;
use crate::StorageError;

#[test]
fn test_log_key_layout() {
    let key = log_key(0x0102_0304_0506_0708);
    assert_eq!(&key[..2], b"l.");
    assert_eq!(&key[2..], &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_log_key_round_trip_edges() {
    for index in [0, 1, 255, 256, 1 << 32, u64::MAX - 1, u64::MAX] {
        assert_eq!(index_from_log_key(&log_key(index)).unwrap(), index);
    }
}

#[test]
fn test_log_key_order_matches_numeric_order() {
    let samples = [
        0u64,
        1,
        2,
        9,
        10,
        255,
        256,
        65_535,
        65_536,
        u32::MAX as u64,
        u32::MAX as u64 + 1,
        u64::MAX / 2,
        u64::MAX - 1,
        u64::MAX,
    ];
    for a in samples {
        for b in samples {
            assert_eq!(a.cmp(&b), log_key(a).cmp(&log_key(b)), "a={a} b={b}");
        }
    }
}

#[test]
fn test_meta_key_appends_raw_key() {
    assert_eq!(meta_key(b"CurrentTerm"), b"m.CurrentTerm".to_vec());
    assert_eq!(meta_key(b""), b"m.".to_vec());
}

#[test]
fn test_namespaces_never_collide() {
    assert_ne!(LOG_PREFIX, META_PREFIX);
    assert_eq!(LOG_PREFIX.len(), META_PREFIX.len());

    // A metadata key that spells a log key suffix still lands in its own namespace.
    let looks_like_log = meta_key(&log_key(7)[2..]);
    assert!(!looks_like_log.starts_with(LOG_PREFIX));
    assert!(index_from_log_key(&looks_like_log).is_err());

    // Every log key sorts on one side of every metadata key.
    assert!(log_key(u64::MAX).as_slice() < meta_key(b"").as_slice());
}

#[test]
fn test_index_from_log_key_rejects_bad_keys() {
    let e = index_from_log_key(b"m.\x00\x00\x00\x00\x00\x00\x00\x01").unwrap_err();
    assert!(matches!(
        e,
        Error::Storage(StorageError::Convert(ConvertError::MissingPrefix { .. }))
    ));

    let e = index_from_log_key(b"l.\x01\x02").unwrap_err();
    assert!(matches!(
        e,
        Error::Storage(StorageError::Convert(ConvertError::InvalidLength(2)))
    ));
}
