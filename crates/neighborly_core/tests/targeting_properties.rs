use neighborly_core::{
    AgeRange, AgeReference, CandidateSets, Child, ChildGenderFilter, ChildSex, FilterCriteria,
    Household, HouseholdType, MatchIndex, RecipientLock, SelectionEngine, SelectionLayer,
};
use proptest::prelude::*;

const TYPES: [HouseholdType; 4] = [
    HouseholdType::FamilyWithKids,
    HouseholdType::EmptyNesters,
    HouseholdType::SinglesCouples,
    HouseholdType::Unspecified,
];

#[derive(Debug, Clone)]
enum Op {
    ToggleHousehold(usize),
    ToggleLayer(usize),
    SelectAll,
    ClearAll,
    /// Re-delivers the roster keeping households whose bit is set.
    SetRoster(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..12).prop_map(Op::ToggleHousehold),
        (0usize..4).prop_map(Op::ToggleLayer),
        Just(Op::SelectAll),
        Just(Op::ClearAll),
        any::<u16>().prop_map(Op::SetRoster),
    ]
}

fn child_strategy() -> impl Strategy<Value = Child> {
    (
        proptest::option::of(1995i32..2026),
        proptest::option::of(1u32..=12),
        proptest::option::of(prop_oneof![Just(ChildSex::Girl), Just(ChildSex::Boy)]),
    )
        .prop_map(|(birth_year, birth_month, sex)| Child {
            birth_year,
            birth_month,
            sex,
            ..Child::default()
        })
}

fn roster_strategy() -> impl Strategy<Value = Vec<Household>> {
    proptest::collection::vec(
        (0usize..4, proptest::collection::vec(child_strategy(), 0..3)),
        0..10,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(position, (kind, children))| {
                let mut household =
                    Household::new(format!("h{position}"), format!("House {position}"), TYPES[kind]);
                household.children = children;
                household
            })
            .collect()
    })
}

fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (
        proptest::collection::btree_set(0usize..4, 0..3),
        proptest::option::of((0u32..10, 0u32..10)),
        0usize..3,
    )
        .prop_map(|(types, range, gender)| FilterCriteria {
            household_types: types.into_iter().map(|kind| TYPES[kind]).collect(),
            child_age_range: range
                .and_then(|(a, b)| AgeRange::new(a.min(b), a.max(b)).ok()),
            child_gender: [
                ChildGenderFilter::All,
                ChildGenderFilter::Girls,
                ChildGenderFilter::Boys,
            ][gender],
        })
}

fn candidates_for(roster: &[Household], criteria: &FilterCriteria) -> CandidateSets {
    MatchIndex::build(roster, criteria, None, AgeReference::new(2026, 6))
        .candidates()
        .clone()
}

fn build_engine(roster: &[Household], criteria: &FilterCriteria) -> SelectionEngine {
    let mut engine = SelectionEngine::new();
    engine.set_candidates(candidates_for(roster, criteria));
    engine
}

fn apply(
    engine: &mut SelectionEngine,
    roster: &[Household],
    criteria: &FilterCriteria,
    op: &Op,
) {
    match op {
        Op::ToggleHousehold(position) => {
            engine.toggle_household(&format!("h{position}"));
        }
        Op::ToggleLayer(layer) => {
            engine.toggle_layer(SelectionLayer::ALL_LAYERS[*layer]);
        }
        Op::SelectAll => {
            engine.select_all();
        }
        Op::ClearAll => engine.clear_all(),
        Op::SetRoster(mask) => {
            let subset: Vec<Household> = roster
                .iter()
                .enumerate()
                .filter(|(position, _)| mask & (1 << position) != 0)
                .map(|(_, household)| household.clone())
                .collect();
            engine.set_candidates(candidates_for(&subset, criteria));
        }
    }
}

proptest! {
    #[test]
    fn matches_and_additional_partition_the_roster(
        roster in roster_strategy(),
        criteria in criteria_strategy(),
    ) {
        let index = MatchIndex::build(&roster, &criteria, None, AgeReference::new(2026, 6));
        prop_assert!(index.match_ids().is_disjoint(index.additional_ids()));
        let union: std::collections::BTreeSet<String> =
            index.match_ids().union(index.additional_ids()).cloned().collect();
        prop_assert_eq!(&union, index.all_ids());
    }

    #[test]
    fn selection_never_exceeds_roster(
        roster in roster_strategy(),
        criteria in criteria_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..30),
    ) {
        let mut engine = build_engine(&roster, &criteria);
        for op in &ops {
            apply(&mut engine, &roster, &criteria, op);
            let all = &engine.candidates().all;
            let selection = engine.effective_selection();
            prop_assert!(selection.len() <= all.len());
            prop_assert!(selection.is_subset(all));
            prop_assert!(engine.manual_selection().is_subset(all));
            prop_assert!(engine.clicked_history().is_subset(all));
        }
    }

    #[test]
    fn double_layer_toggle_restores_active_layers(
        roster in roster_strategy(),
        criteria in criteria_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..15),
        layer in 0usize..4,
    ) {
        let mut engine = build_engine(&roster, &criteria);
        for op in &ops {
            apply(&mut engine, &roster, &criteria, op);
        }
        let before = engine.active_layers().clone();
        let layer = SelectionLayer::ALL_LAYERS[layer];
        engine.toggle_layer(layer);
        engine.toggle_layer(layer);
        prop_assert_eq!(engine.active_layers(), &before);
    }

    #[test]
    fn locked_and_mutable_stay_disjoint(
        original in proptest::collection::vec("[a-e]", 0..5),
        toggles in proptest::collection::vec("[a-h]", 0..20),
    ) {
        let mut lock = RecipientLock::for_edit(original.as_slice());
        for recipient in &toggles {
            lock.toggle_recipient(recipient);
            for value in lock.mutable_recipients() {
                prop_assert!(!lock.is_locked(value));
            }
        }
        let effective = lock.effective_recipients();
        let unique: std::collections::BTreeSet<&String> = effective.iter().collect();
        prop_assert_eq!(unique.len(), effective.len());
        for value in &original {
            prop_assert!(effective.contains(value));
        }
    }
}
