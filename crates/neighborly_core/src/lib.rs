//! Core domain logic for the Neighborly client.
//! This crate is the single source of truth for recipient targeting invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod targeting;

pub use logging::{
    default_log_level, init_logging, logging_status, LogLevel, LoggingConfig, LoggingError,
};
pub use model::filter::{AgeRange, ChildGenderFilter, FilterCriteria, FilterError};
pub use model::household::{
    Child, ChildSex, GeoPoint, Household, HouseholdId, HouseholdType, HouseholdValidationError,
    LocationPrecision,
};
pub use model::normalize::{normalize_roster, ChildRecord, HouseholdRecord};
pub use model::post::{Post, PostDraft, PostId, PostKind, PostValidationError};
pub use repo::blob_store::{BlobStore, RepoError, RepoResult, SqliteBlobStore};
pub use repo::household_repo::{
    parse_roster_json, BlobHouseholdDirectory, HouseholdDirectory, HOUSEHOLD_ROSTER_BLOB,
};
pub use repo::post_repo::{BlobPostRepository, PostRepository};
pub use service::post_service::{PostEditSession, PostService, PostServiceError};
pub use targeting::distance::{distance_label, haversine_miles, EARTH_RADIUS_MILES};
pub use targeting::index::{CandidateSets, HouseholdEntry, HouseholdRow, MatchIndex};
pub use targeting::lock::RecipientLock;
pub use targeting::matching::{child_age, household_matches, AgeReference};
pub use targeting::selection::{
    compute_effective_selection, SelectionEngine, SelectionLayer, SelectionObserver,
};
pub use targeting::session::{RosterApplyOutcome, RosterTicket, SessionOptions, TargetingSession};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
