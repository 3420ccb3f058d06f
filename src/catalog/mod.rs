//! Content-Catalog Domain
//!
//! Read-only browse and lookup queries over an embedded catalog database:
//! categories with representative preview items, paginated item listings
//! with optional image joins, hashed-key single-item lookup, and cluster
//! metadata.
//!
//! ## Submodules
//! - **`types`**: row structs, listing DTOs and the JSON-column decode
//!   boundary.
//! - **`compose`**: pure normalization, grouping, ordering and pagination.
//! - **`handlers`**: the per-domain handler registry run inside workers.
//! - **`client`**: the typed async facade consumers call.

pub mod client;
pub mod compose;
pub mod handlers;
pub mod types;

#[cfg(test)]
mod tests;
