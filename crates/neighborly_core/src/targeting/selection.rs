//! Layered selection engine for new posts and event invites.
//!
//! # Responsibility
//! - Reconcile manual checkbox picks with the four bulk layers.
//! - Keep `clicked_history` monotonic apart from roster pruning.
//! - Notify observers once per distinct effective selection.
//!
//! # Invariants
//! - Every id in `manual` and `clicked_history` exists in `candidates.all`.
//! - `effective_selection() ⊆ candidates.all`.
//! - Clicked is auto-activated at most once per engine lifetime.
//! - After `dispose()` no state changes and no notifications happen.

use crate::model::household::HouseholdId;
use crate::targeting::index::CandidateSets;
use log::debug;
use std::collections::BTreeSet;

/// Bulk selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SelectionLayer {
    /// Every household the user interacted with directly.
    Clicked,
    /// Households matching the active filter.
    Matches,
    /// Households not matching the active filter.
    Additional,
    /// The whole roster.
    All,
}

impl SelectionLayer {
    pub const ALL_LAYERS: [SelectionLayer; 4] =
        [Self::Clicked, Self::Matches, Self::Additional, Self::All];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clicked => "clicked",
            Self::Matches => "matches",
            Self::Additional => "additional",
            Self::All => "all",
        }
    }

    /// Parses the stable string id (`clicked|matches|additional|all`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "clicked" => Some(Self::Clicked),
            "matches" => Some(Self::Matches),
            "additional" => Some(Self::Additional),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Receives the effective selection whenever it changes.
pub trait SelectionObserver {
    fn selection_changed(&mut self, selection: &BTreeSet<HouseholdId>);
}

impl<F> SelectionObserver for F
where
    F: FnMut(&BTreeSet<HouseholdId>),
{
    fn selection_changed(&mut self, selection: &BTreeSet<HouseholdId>) {
        (*self)(selection);
    }
}

/// Computes the effective selection from engine inputs.
///
/// Pure and deterministic; safe to call redundantly.
pub fn compute_effective_selection(
    manual: &BTreeSet<HouseholdId>,
    clicked_history: &BTreeSet<HouseholdId>,
    active_layers: &BTreeSet<SelectionLayer>,
    candidates: &CandidateSets,
) -> BTreeSet<HouseholdId> {
    let mut selection = manual.clone();
    for layer in active_layers {
        let ids = match layer {
            SelectionLayer::Clicked => clicked_history,
            SelectionLayer::Matches => &candidates.matches,
            SelectionLayer::Additional => &candidates.additional,
            SelectionLayer::All => &candidates.all,
        };
        selection.extend(ids.iter().cloned());
    }
    selection
}

/// Session-scoped selection state.
#[derive(Default)]
pub struct SelectionEngine {
    manual: BTreeSet<HouseholdId>,
    clicked_history: BTreeSet<HouseholdId>,
    active_layers: BTreeSet<SelectionLayer>,
    candidates: CandidateSets,
    clicked_auto_activated: bool,
    last_emitted: BTreeSet<HouseholdId>,
    observers: Vec<Box<dyn SelectionObserver>>,
    disposed: bool,
}

impl SelectionEngine {
    /// Creates an engine with an empty roster and nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for effective selection changes.
    ///
    /// The observer is not called for the current value; it only sees
    /// future distinct results.
    pub fn subscribe(&mut self, observer: impl SelectionObserver + 'static) {
        if self.disposed {
            return;
        }
        self.observers.push(Box::new(observer));
    }

    /// Replaces the candidate sets after a roster or filter change.
    ///
    /// Manual picks and clicked history are pruned to ids still present.
    pub fn set_candidates(&mut self, candidates: CandidateSets) {
        if self.disposed {
            return;
        }
        let manual_before = self.manual.len();
        let history_before = self.clicked_history.len();
        self.manual.retain(|id| candidates.all.contains(id));
        self.clicked_history
            .retain(|id| candidates.all.contains(id));
        self.candidates = candidates;

        let pruned =
            (manual_before - self.manual.len()) + (history_before - self.clicked_history.len());
        debug!(
            "event=selection_candidates module=targeting status=ok all={} matches={} pruned={}",
            self.candidates.all.len(),
            self.candidates.matches.len(),
            pruned
        );
        self.publish();
    }

    /// Direct checkbox interaction on one household.
    ///
    /// Returns `false` (no-op) when the id is not in the current roster.
    pub fn toggle_household(&mut self, id: &str) -> bool {
        if self.disposed || !self.candidates.all.contains(id) {
            return false;
        }
        self.clicked_history.insert(id.to_string());
        if !self.manual.remove(id) {
            self.manual.insert(id.to_string());
        }
        self.apply_auto_activation();
        self.publish();
        true
    }

    /// Records an entry-point click without changing manual picks.
    pub fn record_clicked(&mut self, id: &str) -> bool {
        if self.disposed || !self.candidates.all.contains(id) {
            return false;
        }
        let inserted = self.clicked_history.insert(id.to_string());
        self.apply_auto_activation();
        self.publish();
        inserted
    }

    /// Flips one layer.
    ///
    /// A layer with no candidates is disabled: toggling it is a no-op in both
    /// directions. `clear_all` still turns such a layer off.
    pub fn toggle_layer(&mut self, layer: SelectionLayer) -> bool {
        if self.disposed || !self.layer_enabled(layer) {
            return false;
        }
        let active = if self.active_layers.remove(&layer) {
            false
        } else {
            self.active_layers.insert(layer);
            true
        };
        debug!(
            "event=selection_layer module=targeting status=ok layer={} active={}",
            layer.as_str(),
            active
        );
        self.publish();
        true
    }

    /// Toggles the All layer; no-op on an empty roster.
    pub fn select_all(&mut self) -> bool {
        self.toggle_layer(SelectionLayer::All)
    }

    /// Clears manual picks and every layer. Clicked history is kept.
    pub fn clear_all(&mut self) {
        if self.disposed {
            return;
        }
        self.manual.clear();
        self.active_layers.clear();
        self.publish();
    }

    /// Whether activating `layer` would have any candidates.
    pub fn layer_enabled(&self, layer: SelectionLayer) -> bool {
        !self.layer_candidates(layer).is_empty()
    }

    pub fn is_layer_active(&self, layer: SelectionLayer) -> bool {
        self.active_layers.contains(&layer)
    }

    pub fn active_layers(&self) -> &BTreeSet<SelectionLayer> {
        &self.active_layers
    }

    pub fn manual_selection(&self) -> &BTreeSet<HouseholdId> {
        &self.manual
    }

    pub fn clicked_history(&self) -> &BTreeSet<HouseholdId> {
        &self.clicked_history
    }

    pub fn candidates(&self) -> &CandidateSets {
        &self.candidates
    }

    /// Pull-based effective selection.
    pub fn effective_selection(&self) -> BTreeSet<HouseholdId> {
        compute_effective_selection(
            &self.manual,
            &self.clicked_history,
            &self.active_layers,
            &self.candidates,
        )
    }

    /// Drops observers and freezes the engine.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.observers.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn layer_candidates(&self, layer: SelectionLayer) -> &BTreeSet<HouseholdId> {
        match layer {
            SelectionLayer::Clicked => &self.clicked_history,
            SelectionLayer::Matches => &self.candidates.matches,
            SelectionLayer::Additional => &self.candidates.additional,
            SelectionLayer::All => &self.candidates.all,
        }
    }

    fn apply_auto_activation(&mut self) {
        if self.clicked_auto_activated || self.clicked_history.is_empty() {
            return;
        }
        self.clicked_auto_activated = true;
        if self.active_layers.insert(SelectionLayer::Clicked) {
            debug!("event=selection_layer module=targeting status=auto layer=clicked active=true");
        }
    }

    fn publish(&mut self) {
        let selection = self.effective_selection();
        if selection == self.last_emitted {
            return;
        }
        for observer in &mut self.observers {
            observer.selection_changed(&selection);
        }
        self.last_emitted = selection;
    }
}
