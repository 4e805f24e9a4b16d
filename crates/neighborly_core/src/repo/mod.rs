//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Model persistence as named blobs ("load/save a named blob").
//! - Provide household directory and post repositories on top of blobs.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidData`) in
//!   addition to storage transport errors.

pub mod blob_store;
pub mod household_repo;
pub mod post_repo;
