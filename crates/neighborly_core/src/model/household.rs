//! Household domain model.
//!
//! # Responsibility
//! - Define the normalized household shape consumed by targeting.
//! - Keep child metadata needed for age/gender matching.
//!
//! # Invariants
//! - `id` is non-blank and unique within one roster.
//! - `location` is either a valid coordinate pair or `None`.
//! - Targeting code never creates or deletes households; it only reads them.
//!
//! # See also
//! - `model::normalize` for the raw directory record mapping.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable household identifier supplied by the household directory.
pub type HouseholdId = String;

/// Household composition category used by discovery filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseholdType {
    FamilyWithKids,
    EmptyNesters,
    SinglesCouples,
    Unspecified,
}

impl HouseholdType {
    /// Stable string id used in stored records and FFI payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FamilyWithKids => "family_with_kids",
            Self::EmptyNesters => "empty_nesters",
            Self::SinglesCouples => "singles_couples",
            Self::Unspecified => "unspecified",
        }
    }
}

/// How trustworthy a household's coordinates are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPrecision {
    /// Geocoded from a street address.
    Exact,
    /// ZIP-code centroid; distances are approximate.
    ZipApproximate,
    #[default]
    Unknown,
}

/// Normalized child sex used by gender filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSex {
    Girl,
    Boy,
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// One child of a household.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Child {
    pub birth_year: Option<i32>,
    /// 1-based month (`1..=12`).
    pub birth_month: Option<u32>,
    pub sex: Option<ChildSex>,
    pub away_at_college: bool,
    pub can_babysit: bool,
}

impl Child {
    /// Children with neither birth year nor month are skipped by age and
    /// gender matching.
    pub fn has_birth_info(&self) -> bool {
        self.birth_year.is_some() || self.birth_month.is_some()
    }
}

/// Candidate invite recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub display_name: String,
    pub household_type: HouseholdType,
    pub neighborhood: Option<String>,
    pub location: Option<GeoPoint>,
    pub location_precision: LocationPrecision,
    pub children: Vec<Child>,
}

impl Household {
    /// Creates a household with no location and no children.
    ///
    /// Mostly used by tests and by callers that enrich fields afterwards.
    pub fn new(
        id: impl Into<HouseholdId>,
        display_name: impl Into<String>,
        household_type: HouseholdType,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            household_type,
            neighborhood: None,
            location: None,
            location_precision: LocationPrecision::Unknown,
            children: Vec::new(),
        }
    }

    /// Validates identity fields.
    pub fn validate(&self) -> Result<(), HouseholdValidationError> {
        if self.id.trim().is_empty() {
            return Err(HouseholdValidationError::BlankId);
        }
        Ok(())
    }
}

/// Household validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HouseholdValidationError {
    BlankId,
    DuplicateId(HouseholdId),
}

impl Display for HouseholdValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "household id must not be blank"),
            Self::DuplicateId(id) => write!(f, "household id is duplicated in roster: {id}"),
        }
    }
}

impl Error for HouseholdValidationError {}
