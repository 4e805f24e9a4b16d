//! Discovery filter criteria.
//!
//! # Responsibility
//! - Describe the externally supplied filter that splits a roster into
//!   matches and additional households.
//! - Parse FFI/string forms of filter values.
//!
//! # Invariants
//! - `AgeRange.min <= AgeRange.max`.
//! - An empty `household_types` set means "any type".

use crate::model::household::HouseholdType;
use crate::model::normalize::normalize_household_type;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inclusive child age range in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    min: u32,
    max: u32,
}

impl AgeRange {
    /// Creates an inclusive range.
    ///
    /// # Errors
    /// - Returns `FilterError::InvalidAgeRange` when `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, FilterError> {
        if min > max {
            return Err(FilterError::InvalidAgeRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

/// Child gender filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildGenderFilter {
    #[default]
    All,
    Girls,
    Boys,
}

impl ChildGenderFilter {
    /// Parses `all|girls|boys` (case-insensitive, singular accepted).
    pub fn parse(value: &str) -> Result<Self, FilterError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "any" => Ok(Self::All),
            "girls" | "girl" => Ok(Self::Girls),
            "boys" | "boy" => Ok(Self::Boys),
            other => Err(FilterError::UnsupportedGender(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Girls => "girls",
            Self::Boys => "boys",
        }
    }
}

/// Active discovery filter. Read-only to targeting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub household_types: BTreeSet<HouseholdType>,
    pub child_age_range: Option<AgeRange>,
    pub child_gender: ChildGenderFilter,
}

impl FilterCriteria {
    /// Builds criteria from loosely typed string inputs.
    ///
    /// Household type strings use the same normalization as directory
    /// records; unknown strings map to `Unspecified`.
    pub fn from_parts(
        household_types: &[String],
        age_min: Option<u32>,
        age_max: Option<u32>,
        gender: &str,
    ) -> Result<Self, FilterError> {
        let child_age_range = match (age_min, age_max) {
            (None, None) => None,
            (min, max) => Some(AgeRange::new(min.unwrap_or(0), max.unwrap_or(u32::MAX))?),
        };

        Ok(Self {
            household_types: household_types
                .iter()
                .filter(|value| !value.trim().is_empty())
                .map(|value| normalize_household_type(value))
                .collect(),
            child_age_range,
            child_gender: ChildGenderFilter::parse(gender)?,
        })
    }

    /// Returns whether this filter restricts nothing.
    pub fn is_unrestricted(&self) -> bool {
        self.household_types.is_empty()
            && self.child_age_range.is_none()
            && self.child_gender == ChildGenderFilter::All
    }
}

/// Filter parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    InvalidAgeRange { min: u32, max: u32 },
    UnsupportedGender(String),
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAgeRange { min, max } => {
                write!(f, "child age range min ({min}) must be <= max ({max})")
            }
            Self::UnsupportedGender(value) => {
                write!(f, "unsupported gender filter `{value}`; expected all|girls|boys")
            }
        }
    }
}

impl Error for FilterError {}
