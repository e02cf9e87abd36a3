//! Typed records and client-side identifiers

use crate::client::to_document;
use crate::document::{overwrite_fields, RawDocument};
use crate::error::SyncError;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Minimum number of base-36 characters in a generated id suffix
pub const MIN_SUFFIX_LEN: usize = 5;

/// Default suffix length for [`generate_id`]
pub const DEFAULT_SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Any typed document body read through a [`SyncClient`](crate::SyncClient)
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Shape check applied after decoding; documents failing it are quarantined
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A record that is one member of a named, user-scoped collection
pub trait Entity: Record {
    /// Remote collection name
    const COLLECTION: &'static str;

    /// Prefix of client-generated ids
    const ID_PREFIX: &'static str;

    /// Document id
    fn id(&self) -> &str;
}

/// Decode a raw document into `T`, merging the synthesized `id` field
///
/// # Errors
/// [`SyncError::Invalid`] when the body does not match `T` or fails validation
pub fn decode<T: Record>(raw: RawDocument) -> Result<T, SyncError> {
    let id = raw.id.clone();
    let record: T = serde_json::from_value(raw.into_value()).map_err(|e| SyncError::Invalid {
        id: id.clone(),
        reason: e.to_string(),
    })?;
    record
        .validate()
        .map_err(|reason| SyncError::Invalid { id, reason })?;
    Ok(record)
}

/// `current` with the top-level fields of `patch` overwritten, decoded and
/// validated as a whole
///
/// # Errors
/// [`SyncError::Invalid`] when the patched record no longer decodes or
/// fails validation.
pub fn patched<T: Record, P: Serialize + ?Sized>(
    id: &str,
    current: &T,
    patch: &P,
) -> Result<T, SyncError> {
    let mut body = to_document(current)?;
    overwrite_fields(&mut body, to_document(patch)?);
    body.remove("id");
    decode(RawDocument::new(id, body))
}

/// Generate `{prefix}_{unix_millis}_{suffix}` with a 9-character base-36 suffix
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    generate_id_with(prefix, DEFAULT_SUFFIX_LEN)
}

/// Generate an id with an explicit suffix length (at least [`MIN_SUFFIX_LEN`])
#[must_use]
pub fn generate_id_with(prefix: &str, suffix_len: usize) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..suffix_len.max(MIN_SUFFIX_LEN))
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{prefix}_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Probe {
        id: String,
        score: f64,
    }

    impl Record for Probe {
        fn validate(&self) -> Result<(), String> {
            if self.score < 0.0 {
                return Err("score must not be negative".to_string());
            }
            Ok(())
        }
    }

    fn raw(id: &str, body: serde_json::Value) -> RawDocument {
        RawDocument::new(id, body.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn decode_merges_id() {
        let probe: Probe = decode(raw("p1", json!({"score": 4.0}))).unwrap();
        assert_eq!(probe, Probe { id: "p1".into(), score: 4.0 });
    }

    #[test]
    fn decode_rejects_wrong_shape_and_failed_validation() {
        let err = decode::<Probe>(raw("p1", json!({"score": "high"}))).unwrap_err();
        assert!(matches!(err, SyncError::Invalid { ref id, .. } if id == "p1"));

        let err = decode::<Probe>(raw("p2", json!({"score": -1.0}))).unwrap_err();
        assert!(matches!(err, SyncError::Invalid { ref reason, .. } if reason.contains("negative")));
    }

    #[test]
    fn patched_rejects_a_patch_that_breaks_validation() {
        let current = Probe { id: "p1".into(), score: 4.0 };
        let ok: Probe = patched("p1", &current, &json!({"score": 6.0})).unwrap();
        assert_eq!(ok.score, 6.0);

        let err = patched::<Probe, _>("p1", &current, &json!({"score": -2.0})).unwrap_err();
        assert!(matches!(err, SyncError::Invalid { ref id, .. } if id == "p1"));
    }

    #[test]
    fn generated_ids_have_prefix_timestamp_and_suffix() {
        let id = generate_id("task");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "task");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), DEFAULT_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn suffix_never_shorter_than_minimum() {
        let id = generate_id_with("x", 1);
        assert_eq!(id.rsplit('_').next().map(str::len), Some(MIN_SUFFIX_LEN));
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let ids: HashSet<String> = (0..2_000).map(|_| generate_id("grade")).collect();
        assert_eq!(ids.len(), 2_000);
    }
}
