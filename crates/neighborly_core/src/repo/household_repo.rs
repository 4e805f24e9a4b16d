//! Household directory contract and blob-backed implementation.
//!
//! # Responsibility
//! - Supply the full household roster to targeting sessions.
//! - Persist the last fetched roster as a JSON blob.
//!
//! # Invariants
//! - The directory is the only source of truth for which ids exist.
//! - `fetch_roster` returns normalized households (unique, non-blank ids).
//! - A missing roster blob is an empty roster, not an error.

use crate::model::household::Household;
use crate::model::normalize::{normalize_roster, HouseholdRecord};
use crate::repo::blob_store::{BlobStore, RepoError, RepoResult};

/// Blob name holding the cached household roster.
pub const HOUSEHOLD_ROSTER_BLOB: &str = "household_roster";

/// Supplies the candidate household roster.
pub trait HouseholdDirectory {
    fn fetch_roster(&self) -> RepoResult<Vec<Household>>;
}

/// Household directory stored as a JSON array of `HouseholdRecord`.
pub struct BlobHouseholdDirectory<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> BlobHouseholdDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Replaces the stored roster with raw directory records.
    pub fn save_records(&self, records: &[HouseholdRecord]) -> RepoResult<()> {
        let body = serde_json::to_string(records).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode household roster: {err}"))
        })?;
        self.store.save_blob(HOUSEHOLD_ROSTER_BLOB, &body)
    }

    /// Loads raw records without normalization.
    pub fn load_records(&self) -> RepoResult<Vec<HouseholdRecord>> {
        let Some(body) = self.store.load_blob(HOUSEHOLD_ROSTER_BLOB)? else {
            return Ok(Vec::new());
        };
        parse_roster_json(&body)
    }
}

impl<S: BlobStore> HouseholdDirectory for BlobHouseholdDirectory<S> {
    fn fetch_roster(&self) -> RepoResult<Vec<Household>> {
        let records = self.load_records()?;
        Ok(normalize_roster(&records))
    }
}

/// Fixed in-memory roster, used by previews and tests.
impl HouseholdDirectory for Vec<Household> {
    fn fetch_roster(&self) -> RepoResult<Vec<Household>> {
        Ok(self.clone())
    }
}

/// Parses a JSON array of directory records.
pub fn parse_roster_json(body: &str) -> RepoResult<Vec<HouseholdRecord>> {
    serde_json::from_str(body)
        .map_err(|err| RepoError::InvalidData(format!("invalid household roster json: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{parse_roster_json, BlobHouseholdDirectory, HouseholdDirectory};
    use crate::db::open_db_in_memory;
    use crate::model::household::HouseholdType;
    use crate::repo::blob_store::{BlobStore, RepoError, SqliteBlobStore, RepoResult};

    #[test]
    fn missing_blob_is_empty_roster() {
        let conn = open_db_in_memory().expect("open db");
        let directory = BlobHouseholdDirectory::new(SqliteBlobStore::new(&conn));
        assert!(directory.fetch_roster().expect("fetch").is_empty());
    }

    #[test]
    fn fetch_normalizes_stored_records() {
        let conn = open_db_in_memory().expect("open db");
        let store = SqliteBlobStore::new(&conn);
        store
            .save_blob(
                super::HOUSEHOLD_ROSTER_BLOB,
                r#"[
                    {"id": "h1", "last_name": "Okafor", "household_type": "Family with Kids"},
                    {"id": "h1", "display_name": "Dup"},
                    {"id": "h2", "latitude": 40.0, "longitude": -75.0, "location_precision": "zip"}
                ]"#,
            )
            .expect("seed roster");

        let roster = BlobHouseholdDirectory::new(&store)
            .fetch_roster()
            .expect("fetch");
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].display_name, "Okafor Household");
        assert_eq!(roster[0].household_type, HouseholdType::FamilyWithKids);
        assert!(roster[1].location.is_some());
    }

    #[test]
    fn malformed_json_is_invalid_data() {
        let err = parse_roster_json("{not json").expect_err("must fail");
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn store_errors_propagate() {
        struct FailingStore;
        impl BlobStore for FailingStore {
            fn load_blob(&self, _: &str) -> RepoResult<Option<String>> {
                Err(RepoError::InvalidData("offline".to_string()))
            }
            fn save_blob(&self, _: &str, _: &str) -> RepoResult<()> {
                Ok(())
            }
            fn delete_blob(&self, _: &str) -> RepoResult<bool> {
                Ok(false)
            }
            fn list_blob_names(&self, _: &str) -> RepoResult<Vec<String>> {
                Ok(Vec::new())
            }
        }

        let directory = BlobHouseholdDirectory::new(FailingStore);
        assert!(directory.fetch_roster().is_err());
    }
}
