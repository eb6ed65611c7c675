//! Declarative phase layouts for phaseline pipelines.
//!
//! A layout lists phases in default order and places extra phases relative
//! to earlier ones:
//!
//! ```toml
//! [[phase]]
//! name = "State"
//!
//! [[phase]]
//! name = "Output"
//!
//! [[phase]]
//! name = "Store"
//! after = "Output"
//! ```
//!
//! Parsing validates the layout and reports problems with source spans.
//! [`Layout::build`] turns it into a [`Pipeline`](phaseline_core::Pipeline)
//! plus a [`PhaseSet`] for looking phases up by name.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod layout;
mod phase_set;
mod span;

pub use error::{Error, Result};
pub use layout::{Layout, PhaseDecl, parse_layout};
pub use phase_set::PhaseSet;
