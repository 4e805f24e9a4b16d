//! Targeting session: one mounted instance of the audience picker.
//!
//! # Responsibility
//! - Own roster, filter, viewer location and the selection engine.
//! - Rebuild the match index and prune selections on roster/filter changes.
//! - Guard the asynchronous roster fetch against stale or late responses.
//!
//! # Invariants
//! - Until a roster arrives the roster is empty and toggles are no-ops.
//! - Roster responses for an older ticket or after `dispose()` never mutate
//!   state.
//! - A failed roster fetch applies as an empty roster.

use crate::model::filter::FilterCriteria;
use crate::model::household::{GeoPoint, Household, HouseholdId};
use crate::repo::household_repo::HouseholdDirectory;
use crate::targeting::index::{HouseholdRow, MatchIndex};
use crate::targeting::matching::AgeReference;
use crate::targeting::selection::{SelectionEngine, SelectionLayer, SelectionObserver};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Handle for one in-flight roster fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterTicket {
    generation: u64,
}

/// Result of delivering a roster response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterApplyOutcome {
    Applied { households: usize },
    /// A newer fetch was started after this ticket.
    Stale,
    /// The session was torn down before the response arrived.
    Disposed,
}

/// Session construction parameters.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub viewer: Option<GeoPoint>,
    pub criteria: FilterCriteria,
    /// Household the user arrived from, if any.
    pub clicked_household: Option<HouseholdId>,
    /// Defaults to the current local month when `None`.
    pub age_reference: Option<AgeReference>,
}

pub struct TargetingSession {
    roster: Vec<Household>,
    criteria: FilterCriteria,
    viewer: Option<GeoPoint>,
    age_reference: AgeReference,
    index: MatchIndex,
    engine: SelectionEngine,
    clicked_household: Option<HouseholdId>,
    clicked_recorded: bool,
    roster_generation: u64,
    roster_loaded: bool,
    disposed: bool,
}

impl TargetingSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            roster: Vec::new(),
            criteria: options.criteria,
            viewer: options.viewer,
            age_reference: options.age_reference.unwrap_or_else(AgeReference::now),
            index: MatchIndex::empty(),
            engine: SelectionEngine::new(),
            clicked_household: options
                .clicked_household
                .filter(|id| !id.trim().is_empty()),
            clicked_recorded: false,
            roster_generation: 0,
            roster_loaded: false,
            disposed: false,
        }
    }

    /// Starts a roster fetch; older tickets become stale.
    pub fn begin_roster_load(&mut self) -> RosterTicket {
        self.roster_generation += 1;
        RosterTicket {
            generation: self.roster_generation,
        }
    }

    /// Delivers a roster fetch result.
    pub fn complete_roster_load<E: Display>(
        &mut self,
        ticket: RosterTicket,
        result: Result<Vec<Household>, E>,
    ) -> RosterApplyOutcome {
        if self.disposed {
            info!(
                "event=roster_load module=targeting status=discarded reason=disposed generation={}",
                ticket.generation
            );
            return RosterApplyOutcome::Disposed;
        }
        if ticket.generation != self.roster_generation {
            info!(
                "event=roster_load module=targeting status=discarded reason=stale generation={} current={}",
                ticket.generation, self.roster_generation
            );
            return RosterApplyOutcome::Stale;
        }

        let roster = match result {
            Ok(roster) => roster,
            Err(err) => {
                warn!(
                    "event=roster_load module=targeting status=error error_code=roster_fetch_failed error={}",
                    err
                );
                Vec::new()
            }
        };

        self.roster = roster;
        self.roster_loaded = true;
        self.reindex();
        info!(
            "event=roster_load module=targeting status=ok households={} matches={}",
            self.index.len(),
            self.index.match_ids().len()
        );
        RosterApplyOutcome::Applied {
            households: self.index.len(),
        }
    }

    /// Fetches and applies a roster synchronously.
    pub fn load_roster(&mut self, directory: &dyn HouseholdDirectory) -> RosterApplyOutcome {
        let ticket = self.begin_roster_load();
        let result = directory.fetch_roster();
        self.complete_roster_load(ticket, result)
    }

    pub fn set_filter(&mut self, criteria: FilterCriteria) {
        if self.disposed || self.criteria == criteria {
            return;
        }
        self.criteria = criteria;
        self.reindex();
    }

    pub fn set_viewer_location(&mut self, viewer: Option<GeoPoint>) {
        if self.disposed {
            return;
        }
        self.viewer = viewer;
        self.reindex();
    }

    pub fn toggle_household(&mut self, id: &str) -> bool {
        self.engine.toggle_household(id)
    }

    pub fn toggle_layer(&mut self, layer: SelectionLayer) -> bool {
        self.engine.toggle_layer(layer)
    }

    pub fn select_all(&mut self) -> bool {
        self.engine.select_all()
    }

    pub fn clear_all(&mut self) {
        self.engine.clear_all();
    }

    pub fn subscribe(&mut self, observer: impl SelectionObserver + 'static) {
        self.engine.subscribe(observer);
    }

    pub fn effective_selection(&self) -> BTreeSet<HouseholdId> {
        self.engine.effective_selection()
    }

    /// Display rows in targeting sort order.
    pub fn rows(&self) -> Vec<HouseholdRow> {
        self.index.rows(
            self.clicked_household.as_deref(),
            &self.engine.effective_selection(),
        )
    }

    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_roster_loaded(&self) -> bool {
        self.roster_loaded
    }

    /// Tears the session down; later roster responses are discarded.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.engine.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn reindex(&mut self) {
        self.index = MatchIndex::build(
            &self.roster,
            &self.criteria,
            self.viewer,
            self.age_reference,
        );
        self.engine.set_candidates(self.index.candidates().clone());

        if self.clicked_recorded {
            return;
        }
        if let Some(id) = self.clicked_household.as_deref() {
            if self.engine.record_clicked(id) {
                self.clicked_recorded = true;
            }
        }
    }
}
