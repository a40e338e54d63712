// maskward-core/src/lib.rs

#![allow(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: contracts for the object store, the warehouse and the policy-tag catalog.
pub mod ports;

// 2. Domain: rules, schema fields, taxonomies, access bindings, audit records.
// Depends on nothing else in the crate.
pub mod domain;

// 3. Infrastructure: local adapters (DuckDB warehouse, JSON catalog, directory bucket),
// config loading, atomic file writes.
pub mod infrastructure;

// 4. Application: the four workflow stages and the entry points chaining them.
pub mod application;

pub mod error;

pub use error::MaskwardError;
