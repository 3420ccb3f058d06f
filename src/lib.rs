//! Catalog Query Pool Library
//!
//! This library crate parallelizes read-only content-catalog queries across a
//! small, fixed set of worker execution units, each owning an independent
//! embedded database connection. It serves the data layer for catalog
//! browsing surfaces (emoji, man pages, icons, command references).
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`pool`**: The read-replica worker pool. A manager lazily starts N
//!   worker threads, dispatches tagged requests round-robin, correlates
//!   asynchronous responses by identifier, and enforces per-request timeouts.
//! - **`catalog`**: The content domain. Row types with a centralized
//!   JSON-column decode boundary, the category/preview composer, the domain
//!   handler registry, and the typed async client consumers call.
//! - **`keys`**: Hash key derivation. Turns composite string identifiers
//!   into fixed-width integer keys for O(1) equality lookups.
//! - **`assets`**: Binary asset resolution. MIME sniffing, numeric
//!   version-token comparison for "latest variant" selection, and data-URI
//!   encoding.

pub mod assets;
pub mod catalog;
pub mod keys;
pub mod pool;
