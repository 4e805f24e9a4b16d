//! Domain model for households, discovery filters and outgoing posts.
//!
//! # Responsibility
//! - Define canonical data structures used by targeting and services.
//! - Normalize loosely typed directory records into canonical households.
//!
//! # Invariants
//! - Every household is identified by a stable, non-blank `HouseholdId`.
//! - Targeting reads households; it never creates or deletes them.

pub mod filter;
pub mod household;
pub mod normalize;
pub mod post;
