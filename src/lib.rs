//! intake - Materializes planned epics and stories into an issue tracker
//!
//! A planner writes a flat list of entries (`outputs/stories.json`) in which
//! stories point at their epic through placeholder identifiers. intake creates
//! the epics first, maps placeholders to the keys the tracker assigned, then
//! creates the stories and reports the outcome on the source ticket.

pub mod cli;
pub mod domain;
pub mod intake;
pub mod storage;
pub mod tracker;

pub use domain::{Entry, IdResolver, ItemKind, Outcome, Reference};
pub use intake::{build_report, Orchestrator, ReportBuilder};
