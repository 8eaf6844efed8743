//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `remote.rs` — export/create/update/list against a configured connection.
//! - `local.rs` — scaffold (no network involved).
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Keep behavior and output stable.

pub mod local;
pub mod remote;

pub use local::handle_scaffold;
pub use remote::{handle_create, handle_export, handle_list, handle_update};
