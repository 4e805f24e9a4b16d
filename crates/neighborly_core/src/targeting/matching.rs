//! Filter matching for households.
//!
//! # Responsibility
//! - Compute child ages relative to a reference month.
//! - Decide whether a household satisfies the active `FilterCriteria`.
//!
//! # Invariants
//! - Ages are floored to whole years.
//! - Children with neither birth year nor month never satisfy age or gender
//!   clauses, but still count as children.

use crate::model::filter::{ChildGenderFilter, FilterCriteria};
use crate::model::household::{Child, ChildSex, Household};
use chrono::{Datelike, Local};

/// Year/month used as "now" for child age computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeReference {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl AgeReference {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    /// Reads the current local year/month.
    pub fn now() -> Self {
        let today = Local::now().date_naive();
        Self::new(today.year(), today.month())
    }
}

/// Child age in whole years, or `None` without a birth year or for a
/// birth date after the reference.
pub fn child_age(child: &Child, reference: AgeReference) -> Option<u32> {
    let birth_year = child.birth_year?;
    let mut age = i64::from(reference.year) - i64::from(birth_year);
    if let Some(month) = child.birth_month {
        if reference.month < month {
            age -= 1;
        }
    }
    u32::try_from(age).ok()
}

/// Returns whether `household` satisfies every active clause of `criteria`.
pub fn household_matches(
    household: &Household,
    criteria: &FilterCriteria,
    reference: AgeReference,
) -> bool {
    if !criteria.household_types.is_empty()
        && !criteria.household_types.contains(&household.household_type)
    {
        return false;
    }

    let mut eligible = household
        .children
        .iter()
        .filter(|child| child.has_birth_info());

    if let Some(range) = criteria.child_age_range {
        let any_in_range = eligible
            .clone()
            .filter_map(|child| child_age(child, reference))
            .any(|age| range.contains(age));
        if !any_in_range {
            return false;
        }
    }

    let wanted_sex = match criteria.child_gender {
        ChildGenderFilter::All => return true,
        ChildGenderFilter::Girls => ChildSex::Girl,
        ChildGenderFilter::Boys => ChildSex::Boy,
    };
    eligible.any(|child| child.sex == Some(wanted_sex))
}

#[cfg(test)]
mod tests {
    use super::{child_age, household_matches, AgeReference};
    use crate::model::filter::{AgeRange, ChildGenderFilter, FilterCriteria};
    use crate::model::household::{Child, ChildSex, Household, HouseholdType};

    const REFERENCE: AgeReference = AgeReference {
        year: 2026,
        month: 6,
    };

    fn child(year: Option<i32>, month: Option<u32>, sex: Option<ChildSex>) -> Child {
        Child {
            birth_year: year,
            birth_month: month,
            sex,
            ..Child::default()
        }
    }

    fn family(children: Vec<Child>) -> Household {
        let mut household = Household::new("fam", "Family", HouseholdType::FamilyWithKids);
        household.children = children;
        household
    }

    #[test]
    fn age_is_floored_by_birth_month() {
        assert_eq!(child_age(&child(Some(2020), Some(5), None), REFERENCE), Some(6));
        assert_eq!(child_age(&child(Some(2020), Some(6), None), REFERENCE), Some(6));
        assert_eq!(child_age(&child(Some(2020), Some(7), None), REFERENCE), Some(5));
        assert_eq!(child_age(&child(Some(2020), None, None), REFERENCE), Some(6));
    }

    #[test]
    fn age_is_none_without_year_or_for_future_birth() {
        assert_eq!(child_age(&child(None, Some(3), None), REFERENCE), None);
        assert_eq!(child_age(&child(Some(2026), Some(9), None), REFERENCE), None);
    }

    #[test]
    fn empty_type_set_matches_any_type() {
        let household = Household::new("h", "H", HouseholdType::Unspecified);
        assert!(household_matches(
            &household,
            &FilterCriteria::default(),
            REFERENCE
        ));
    }

    #[test]
    fn type_clause_rejects_other_types() {
        let household = Household::new("h", "H", HouseholdType::EmptyNesters);
        let mut criteria = FilterCriteria::default();
        criteria.household_types.insert(HouseholdType::FamilyWithKids);
        assert!(!household_matches(&household, &criteria, REFERENCE));
    }

    #[test]
    fn age_clause_needs_one_child_in_range() {
        let household = family(vec![
            child(Some(2010), Some(1), Some(ChildSex::Boy)),
            child(Some(2021), Some(2), Some(ChildSex::Girl)),
        ]);
        let criteria = FilterCriteria {
            child_age_range: Some(AgeRange::new(4, 6).expect("range")),
            ..FilterCriteria::default()
        };
        assert!(household_matches(&household, &criteria, REFERENCE));

        let criteria = FilterCriteria {
            child_age_range: Some(AgeRange::new(7, 12).expect("range")),
            ..FilterCriteria::default()
        };
        assert!(!household_matches(&household, &criteria, REFERENCE));
    }

    #[test]
    fn gender_clause_skips_children_without_birth_info() {
        let household = family(vec![child(None, None, Some(ChildSex::Girl))]);
        let criteria = FilterCriteria {
            child_gender: ChildGenderFilter::Girls,
            ..FilterCriteria::default()
        };
        assert!(!household_matches(&household, &criteria, REFERENCE));

        let household = family(vec![child(Some(2018), None, Some(ChildSex::Girl))]);
        assert!(household_matches(&household, &criteria, REFERENCE));
    }

    #[test]
    fn childless_household_fails_age_clause() {
        let household = family(Vec::new());
        let criteria = FilterCriteria {
            child_age_range: Some(AgeRange::new(0, 18).expect("range")),
            ..FilterCriteria::default()
        };
        assert!(!household_matches(&household, &criteria, REFERENCE));
    }
}
