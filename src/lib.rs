//! Workspace umbrella crate.
//!
//! Re-exports the screen-facing surface so host applications can depend on
//! `mellow-workspace` alone instead of wiring each member crate individually.

pub use mellow_screens::{AppContext, Screen};
