//! Directory record normalization.
//!
//! # Responsibility
//! - Define the loosely typed record shape delivered by the household
//!   directory.
//! - Map raw strings (types, precision, sex) onto canonical enums.
//! - Derive display names and drop invalid/duplicate roster entries.
//!
//! # Invariants
//! - Normalization never panics on malformed input; bad values degrade to
//!   `Unspecified`/`Unknown`/`None`.
//! - A normalized roster has unique, non-blank ids (first record wins).

use crate::model::household::{
    Child, ChildSex, GeoPoint, Household, HouseholdId, HouseholdType, HouseholdValidationError,
    LocationPrecision,
};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-/]+").expect("valid separator regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const FALLBACK_DISPLAY_NAME: &str = "Neighbor";

/// Raw household record as delivered by the directory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdRecord {
    pub id: String,
    pub display_name: Option<String>,
    pub last_name: Option<String>,
    pub household_type: Option<String>,
    pub neighborhood: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_precision: Option<String>,
    pub children: Vec<ChildRecord>,
}

/// Raw child record nested in `HouseholdRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildRecord {
    pub birth_year: Option<i32>,
    pub birth_month: Option<u32>,
    pub sex: Option<String>,
    pub away_at_college: bool,
    pub can_babysit: bool,
}

impl HouseholdRecord {
    /// Normalizes one raw record into a `Household`.
    ///
    /// # Errors
    /// - Returns `HouseholdValidationError::BlankId` when `id` is blank.
    pub fn normalize(&self) -> Result<Household, HouseholdValidationError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(HouseholdValidationError::BlankId);
        }

        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude),
            _ => None,
        };

        Ok(Household {
            id: id.to_string(),
            display_name: derive_display_name(
                self.display_name.as_deref(),
                self.last_name.as_deref(),
            ),
            household_type: self
                .household_type
                .as_deref()
                .map_or(HouseholdType::Unspecified, normalize_household_type),
            neighborhood: self.neighborhood.as_deref().and_then(non_blank),
            location,
            location_precision: self
                .location_precision
                .as_deref()
                .map_or(LocationPrecision::Unknown, normalize_location_precision),
            children: self.children.iter().map(ChildRecord::normalize).collect(),
        })
    }
}

impl ChildRecord {
    pub fn normalize(&self) -> Child {
        Child {
            birth_year: self.birth_year,
            birth_month: self.birth_month.filter(|month| (1..=12).contains(month)),
            sex: self.sex.as_deref().and_then(normalize_child_sex),
            away_at_college: self.away_at_college,
            can_babysit: self.can_babysit,
        }
    }
}

/// Normalizes a full roster, dropping invalid and duplicate records.
///
/// Input order is preserved for surviving records.
pub fn normalize_roster(records: &[HouseholdRecord]) -> Vec<Household> {
    let mut seen: BTreeSet<HouseholdId> = BTreeSet::new();
    let mut households = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let household = match record.normalize() {
            Ok(household) => household,
            Err(err) => {
                warn!(
                    "event=roster_normalize module=model status=dropped position={} reason={}",
                    position, err
                );
                continue;
            }
        };

        if !seen.insert(household.id.clone()) {
            warn!(
                "event=roster_normalize module=model status=dropped position={} reason={}",
                position,
                HouseholdValidationError::DuplicateId(household.id.clone())
            );
            continue;
        }
        households.push(household);
    }

    households
}

/// Maps free-form household type text onto `HouseholdType`.
///
/// Case, whitespace, hyphens and slashes are ignored.
pub fn normalize_household_type(value: &str) -> HouseholdType {
    match separator_key(value).as_str() {
        "family_with_kids" | "families_with_kids" | "family" | "families" => {
            HouseholdType::FamilyWithKids
        }
        "empty_nesters" | "empty_nester" => HouseholdType::EmptyNesters,
        "singles_couples" | "singles_and_couples" | "singles" | "couples" | "single" => {
            HouseholdType::SinglesCouples
        }
        _ => HouseholdType::Unspecified,
    }
}

pub fn normalize_location_precision(value: &str) -> LocationPrecision {
    match separator_key(value).as_str() {
        "exact" | "address" | "precise" => LocationPrecision::Exact,
        "zip" | "zip_approximate" | "zipcode" | "approximate" | "approx" => {
            LocationPrecision::ZipApproximate
        }
        _ => LocationPrecision::Unknown,
    }
}

pub fn normalize_child_sex(value: &str) -> Option<ChildSex> {
    match value.trim().to_ascii_lowercase().as_str() {
        "f" | "female" | "girl" => Some(ChildSex::Girl),
        "m" | "male" | "boy" => Some(ChildSex::Boy),
        _ => None,
    }
}

/// Derives the name shown next to a household checkbox.
///
/// Rules:
/// - explicit display name (whitespace collapsed) when non-blank;
/// - otherwise `"{last_name} Household"`;
/// - otherwise a generic fallback.
pub fn derive_display_name(display_name: Option<&str>, last_name: Option<&str>) -> String {
    if let Some(name) = display_name.and_then(non_blank) {
        return name;
    }
    if let Some(last) = last_name.and_then(non_blank) {
        return format!("{last} Household");
    }
    FALLBACK_DISPLAY_NAME.to_string()
}

fn non_blank(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

fn separator_key(value: &str) -> String {
    SEPARATOR_RE
        .replace_all(value.trim(), "_")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{
        derive_display_name, normalize_child_sex, normalize_household_type,
        normalize_location_precision, normalize_roster, ChildRecord, HouseholdRecord,
    };
    use crate::model::household::{ChildSex, HouseholdType, LocationPrecision};

    #[test]
    fn household_type_mapping_ignores_case_and_separators() {
        assert_eq!(
            normalize_household_type("Family with Kids"),
            HouseholdType::FamilyWithKids
        );
        assert_eq!(
            normalize_household_type("empty-nesters"),
            HouseholdType::EmptyNesters
        );
        assert_eq!(
            normalize_household_type("Singles/Couples"),
            HouseholdType::SinglesCouples
        );
        assert_eq!(normalize_household_type("pets"), HouseholdType::Unspecified);
    }

    #[test]
    fn precision_and_sex_mapping() {
        assert_eq!(
            normalize_location_precision("ZIP"),
            LocationPrecision::ZipApproximate
        );
        assert_eq!(
            normalize_location_precision("address"),
            LocationPrecision::Exact
        );
        assert_eq!(
            normalize_location_precision("??"),
            LocationPrecision::Unknown
        );
        assert_eq!(normalize_child_sex("F"), Some(ChildSex::Girl));
        assert_eq!(normalize_child_sex("boy"), Some(ChildSex::Boy));
        assert_eq!(normalize_child_sex("unknown"), None);
    }

    #[test]
    fn display_name_fallbacks() {
        assert_eq!(
            derive_display_name(Some("  The  Parks "), Some("Park")),
            "The Parks"
        );
        assert_eq!(derive_display_name(Some(" "), Some("Nguyen")), "Nguyen Household");
        assert_eq!(derive_display_name(None, None), "Neighbor");
    }

    #[test]
    fn normalize_requires_both_coordinates() {
        let record = HouseholdRecord {
            id: "h1".to_string(),
            latitude: Some(37.0),
            ..HouseholdRecord::default()
        };
        let household = record.normalize().expect("record should normalize");
        assert!(household.location.is_none());
    }

    #[test]
    fn normalize_drops_invalid_birth_month() {
        let child = ChildRecord {
            birth_year: Some(2015),
            birth_month: Some(13),
            ..ChildRecord::default()
        }
        .normalize();
        assert_eq!(child.birth_year, Some(2015));
        assert_eq!(child.birth_month, None);
    }

    #[test]
    fn normalize_roster_drops_blank_and_duplicate_ids() {
        let records = vec![
            HouseholdRecord {
                id: "a".to_string(),
                display_name: Some("First A".to_string()),
                ..HouseholdRecord::default()
            },
            HouseholdRecord {
                id: " ".to_string(),
                ..HouseholdRecord::default()
            },
            HouseholdRecord {
                id: " a ".to_string(),
                display_name: Some("Second A".to_string()),
                ..HouseholdRecord::default()
            },
            HouseholdRecord {
                id: "b".to_string(),
                ..HouseholdRecord::default()
            },
        ];

        let roster = normalize_roster(&records);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].id, "a");
        assert_eq!(roster[0].display_name, "First A");
        assert_eq!(roster[1].id, "b");
    }
}
