//! Recipient targeting engine.
//!
//! # Responsibility
//! - Decide which households receive an outgoing post or event invite.
//! - Reconcile manual picks with bulk layers for new posts (`selection`).
//! - Protect already-notified recipients when editing a post (`lock`).
//!
//! # Invariants
//! - All state is single-owner and synchronous; no locks are needed.
//! - Id sets are ordered (`BTreeSet`) so every output is deterministic.

pub mod distance;
pub mod index;
pub mod lock;
pub mod matching;
pub mod selection;
pub mod session;
