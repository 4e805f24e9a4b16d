//! Matching & distance index over one roster snapshot.
//!
//! # Responsibility
//! - Attach distance and match flags to every household in a roster.
//! - Expose the `all`/`matches`/`additional` candidate id sets.
//! - Produce the 3-tier display order and per-household display rows.
//!
//! # Invariants
//! - `match_ids ∩ additional_ids = ∅` and `match_ids ∪ additional_ids = all_ids`.
//! - Sorting is stable: equal keys keep roster order.

use crate::model::filter::FilterCriteria;
use crate::model::household::{GeoPoint, Household, HouseholdId};
use crate::targeting::distance::{distance_label, household_distance};
use crate::targeting::matching::{household_matches, AgeReference};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One household with its derived targeting attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdEntry {
    pub household: Household,
    pub distance_miles: Option<f64>,
    pub matches: bool,
}

/// UI-facing projection of one household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdRow {
    pub id: HouseholdId,
    pub display_name: String,
    pub neighborhood: Option<String>,
    /// `None` means no distance badge.
    pub distance_label: Option<String>,
    pub is_match: bool,
    pub is_clicked: bool,
    pub is_selected: bool,
}

/// Candidate id sets derived from one index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CandidateSets {
    pub all: BTreeSet<HouseholdId>,
    pub matches: BTreeSet<HouseholdId>,
    pub additional: BTreeSet<HouseholdId>,
}

/// Indexed roster snapshot.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    entries: Vec<HouseholdEntry>,
    positions: BTreeMap<HouseholdId, usize>,
    candidates: CandidateSets,
}

impl MatchIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the index for a roster under the given criteria.
    ///
    /// Duplicate ids are skipped (first occurrence wins) so the partition
    /// stays well-defined.
    pub fn build(
        roster: &[Household],
        criteria: &FilterCriteria,
        viewer: Option<GeoPoint>,
        reference: AgeReference,
    ) -> Self {
        let mut index = Self::default();
        let unrestricted = criteria.is_unrestricted();

        for household in roster {
            if index.positions.contains_key(household.id.as_str()) {
                continue;
            }
            let matches = unrestricted || household_matches(household, criteria, reference);
            let distance_miles = household_distance(household, viewer);

            index
                .positions
                .insert(household.id.clone(), index.entries.len());
            index.candidates.all.insert(household.id.clone());
            if matches {
                index.candidates.matches.insert(household.id.clone());
            } else {
                index.candidates.additional.insert(household.id.clone());
            }
            index.entries.push(HouseholdEntry {
                household: household.clone(),
                distance_miles,
                matches,
            });
        }

        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&HouseholdEntry> {
        self.positions.get(id).map(|position| &self.entries[*position])
    }

    /// Entries in roster order.
    pub fn entries(&self) -> &[HouseholdEntry] {
        &self.entries
    }

    pub fn candidates(&self) -> &CandidateSets {
        &self.candidates
    }

    pub fn all_ids(&self) -> &BTreeSet<HouseholdId> {
        &self.candidates.all
    }

    pub fn match_ids(&self) -> &BTreeSet<HouseholdId> {
        &self.candidates.matches
    }

    pub fn additional_ids(&self) -> &BTreeSet<HouseholdId> {
        &self.candidates.additional
    }

    /// Entries in display order: clicked household, then matches, then the
    /// rest; ascending distance inside each tier with unknown distances last.
    pub fn sorted(&self, clicked: Option<&str>) -> Vec<&HouseholdEntry> {
        let mut sorted: Vec<&HouseholdEntry> = self.entries.iter().collect();
        sorted.sort_by(|left, right| {
            sort_tier(left, clicked)
                .cmp(&sort_tier(right, clicked))
                .then_with(|| compare_distance(left.distance_miles, right.distance_miles))
        });
        sorted
    }

    /// Display rows in sorted order.
    pub fn rows(&self, clicked: Option<&str>, selected: &BTreeSet<HouseholdId>) -> Vec<HouseholdRow> {
        self.sorted(clicked)
            .into_iter()
            .map(|entry| HouseholdRow {
                id: entry.household.id.clone(),
                display_name: entry.household.display_name.clone(),
                neighborhood: entry.household.neighborhood.clone(),
                distance_label: distance_label(
                    entry.distance_miles,
                    entry.household.location_precision,
                ),
                is_match: entry.matches,
                is_clicked: clicked == Some(entry.household.id.as_str()),
                is_selected: selected.contains(entry.household.id.as_str()),
            })
            .collect()
    }
}

fn sort_tier(entry: &HouseholdEntry, clicked: Option<&str>) -> u8 {
    if clicked == Some(entry.household.id.as_str()) {
        0
    } else if entry.matches {
        1
    } else {
        2
    }
}

fn compare_distance(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::MatchIndex;
    use crate::model::filter::FilterCriteria;
    use crate::model::household::{GeoPoint, Household, HouseholdType, LocationPrecision};
    use crate::targeting::matching::AgeReference;
    use std::collections::BTreeSet;

    const REFERENCE: AgeReference = AgeReference {
        year: 2026,
        month: 1,
    };

    fn household(id: &str, kind: HouseholdType, latitude: Option<f64>) -> Household {
        let mut household = Household::new(id, id.to_uppercase(), kind);
        household.location = latitude.and_then(|lat| GeoPoint::new(lat, 0.0));
        household.location_precision = LocationPrecision::Exact;
        household
    }

    fn families_only() -> FilterCriteria {
        let mut criteria = FilterCriteria::default();
        criteria.household_types.insert(HouseholdType::FamilyWithKids);
        criteria
    }

    fn viewer() -> Option<GeoPoint> {
        GeoPoint::new(0.0, 0.0)
    }

    #[test]
    fn partition_splits_roster_into_matches_and_additional() {
        let roster = vec![
            household("a", HouseholdType::FamilyWithKids, Some(0.01)),
            household("b", HouseholdType::EmptyNesters, Some(0.02)),
            household("c", HouseholdType::FamilyWithKids, None),
        ];
        let index = MatchIndex::build(&roster, &families_only(), viewer(), REFERENCE);

        let matches: Vec<_> = index.match_ids().iter().cloned().collect();
        let additional: Vec<_> = index.additional_ids().iter().cloned().collect();
        assert_eq!(matches, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(additional, vec!["b".to_string()]);
        assert_eq!(index.all_ids().len(), 3);
    }

    #[test]
    fn sort_puts_clicked_then_matches_then_distance() {
        let roster = vec![
            household("far_match", HouseholdType::FamilyWithKids, Some(0.5)),
            household("near_other", HouseholdType::EmptyNesters, Some(0.01)),
            household("unknown_match", HouseholdType::FamilyWithKids, None),
            household("near_match", HouseholdType::FamilyWithKids, Some(0.1)),
            household("clicked_other", HouseholdType::SinglesCouples, Some(0.9)),
            household("unknown_other", HouseholdType::EmptyNesters, None),
        ];
        let index = MatchIndex::build(&roster, &families_only(), viewer(), REFERENCE);

        let order: Vec<&str> = index
            .sorted(Some("clicked_other"))
            .iter()
            .map(|entry| entry.household.id.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "clicked_other",
                "near_match",
                "far_match",
                "unknown_match",
                "near_other",
                "unknown_other",
            ]
        );
    }

    #[test]
    fn unrestricted_filter_matches_everyone() {
        let roster = vec![
            household("a", HouseholdType::FamilyWithKids, Some(0.01)),
            household("b", HouseholdType::EmptyNesters, None),
            household("c", HouseholdType::Unspecified, None),
        ];
        let index = MatchIndex::build(&roster, &FilterCriteria::default(), viewer(), REFERENCE);

        assert_eq!(index.match_ids(), index.all_ids());
        assert!(index.additional_ids().is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first_entry() {
        let roster = vec![
            household("a", HouseholdType::FamilyWithKids, None),
            household("a", HouseholdType::EmptyNesters, None),
        ];
        let index = MatchIndex::build(&roster, &families_only(), viewer(), REFERENCE);
        assert_eq!(index.len(), 1);
        assert!(index.get("a").expect("entry").matches);
    }

    #[test]
    fn rows_omit_badge_for_unknown_distance() {
        let roster = vec![
            household("a", HouseholdType::FamilyWithKids, None),
            household("b", HouseholdType::FamilyWithKids, Some(0.0005)),
        ];
        let index = MatchIndex::build(&roster, &FilterCriteria::default(), viewer(), REFERENCE);
        let mut selected = BTreeSet::new();
        selected.insert("a".to_string());

        let rows = index.rows(None, &selected);
        assert_eq!(rows[0].id, "b");
        assert_eq!(rows[0].distance_label.as_deref(), Some("< 0.1 miles"));
        assert!(!rows[0].is_selected);
        assert_eq!(rows[1].id, "a");
        assert_eq!(rows[1].distance_label, None);
        assert!(rows[1].is_selected);
    }
}
