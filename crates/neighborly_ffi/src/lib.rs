//! Flutter-facing FFI crate over `neighborly_core`.

pub mod api;
