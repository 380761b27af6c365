//! Content fingerprints for stored snapshots.

use sha2::{Digest, Sha256};

use super::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::api::DistrictOperationalSnapshot;

/// Calculate the SHA-256 checksum of some content, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Fingerprint of a snapshot's JSON form.
///
/// Two snapshots with equal fields have equal checksums, which is how an
/// upsert detects that nothing changed.
pub fn snapshot_checksum(snapshot: &DistrictOperationalSnapshot) -> RepositoryResult<String> {
    let json = serde_json::to_string(snapshot).map_err(|e| {
        RepositoryError::internal_with_context(
            e.to_string(),
            ErrorContext::new("snapshot_checksum").with_entity_id(&snapshot.district),
        )
    })?;
    Ok(calculate_checksum(&json))
}
