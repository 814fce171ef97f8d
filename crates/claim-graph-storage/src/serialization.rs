//! Record encoding for the unit store.
//!
//! Units are stored as JSON (timestamps round-trip exactly through RFC
//! 3339 with nanoseconds); index keys are fixed-width binary so RocksDB's
//! lexicographic key order matches chronological order.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use claim_graph_core::types::AtomicUnit;

use crate::error::StorageError;

/// Encode a unit record for the `units` column family.
pub fn serialize_unit(unit: &AtomicUnit) -> Result<Vec<u8>, StorageError> {
    serde_json::to_vec(unit).map_err(|e| StorageError::Corrupt {
        key: unit.id.to_string(),
        message: e.to_string(),
    })
}

/// Decode a unit record.
pub fn deserialize_unit(key: &[u8], bytes: &[u8]) -> Result<AtomicUnit, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
        key: format!("{:02x?}", key),
        message: e.to_string(),
    })
}

/// Encode the temporal index key: big-endian sign-flipped nanosecond
/// timestamp followed by the unit id, so byte order equals
/// (`created_at`, id) order.
pub fn temporal_key(created_at: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    // Timestamps past ~2262 overflow i64 nanoseconds; saturate rather
    // than panic so ordering stays total.
    let nanos = created_at.timestamp_nanos_opt().unwrap_or(i64::MAX);
    let ordered = (nanos as u64) ^ (1 << 63);

    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&ordered.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Decode a unit id from an index value.
pub fn unit_id_from_bytes(bytes: &[u8]) -> Result<Uuid, StorageError> {
    Uuid::from_slice(bytes).map_err(|e| StorageError::Corrupt {
        key: format!("{:02x?}", bytes),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unit_record_round_trips() {
        let unit = AtomicUnit::new("c", "s", vec![0.25, -0.5]).with_confidence(0.9);
        let bytes = serialize_unit(&unit).unwrap();
        let back = deserialize_unit(unit.id.as_bytes(), &bytes).unwrap();
        assert_eq!(back, unit);
        assert_eq!(back.created_at, unit.created_at);
    }

    #[test]
    fn garbage_record_is_corrupt() {
        let err = deserialize_unit(b"k", b"not json").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn temporal_keys_order_chronologically() {
        let id = Uuid::new_v4();
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(temporal_key(early, id) < temporal_key(late, id));

        // Pre-epoch timestamps still sort before post-epoch ones.
        let ancient = Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap();
        assert!(temporal_key(ancient, id) < temporal_key(early, id));
    }

    #[test]
    fn temporal_key_ties_order_by_id() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert!(temporal_key(at, a) < temporal_key(at, b));
    }

    #[test]
    fn unit_id_round_trips_through_bytes() {
        let id = Uuid::new_v4();
        assert_eq!(unit_id_from_bytes(id.as_bytes()).unwrap(), id);
        assert!(unit_id_from_bytes(&[1, 2, 3]).is_err());
    }
}
