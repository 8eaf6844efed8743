//! Service layer containing the sync logic and side-effect helpers.
//!
//! ## Service map
//! - `client.rs` — REST client: auth strategies, read-only mode, call
//!   accounting, error artifact.
//! - `credentials.rs` — credentials file loading/normalization + scaffold.
//! - `resolver.rs` — memoized id <-> natural-key resolution.
//! - `exporter.rs` — recursive tree export to a JSON document.
//! - `importer.rs` — tree reconstruction via one nested create call.
//!
//! ## Conventions
//! - Exactly one network seam: everything remote goes through `RemoteApi`.
//! - A resolver never outlives the export/import operation it was built for.
//! - Warnings print unconditionally; INFO and payload echo are gated on the
//!   verbosity level.

pub mod client;
pub mod credentials;
pub mod exporter;
pub mod importer;
pub mod resolver;

#[cfg(test)]
pub mod test_support;
