//! kanri - hierarchical work-item tracker
//!
//! This library provides the core functionality for the kanri CLI tool:
//! tasks, epics, and subtasks with derived epic state, double-booking
//! protection, and a most-recently-viewed history.
//!
//! # Core Concepts
//!
//! - **Tasks**: standalone work items with an optional time slot
//! - **Epics**: containers whose status and time window are computed from
//!   their subtasks, never assigned
//! - **Subtasks**: items owned by exactly one epic
//! - **Schedule**: a start-ordered view over everything with a start time;
//!   overlapping slots are rejected
//! - **View history**: recently fetched items in access order, with O(1)
//!   record and removal
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.kanri.toml`
//! - `error`: Error types and result aliases
//! - `history`: Most-recently-viewed tracker
//! - `manager`: In-memory store with derived-state maintenance
//! - `output`: Human and JSON output envelopes
//! - `store`: CSV-file-backed persistence
//! - `task`: Entity model (tasks, epics, subtasks, patches)

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod output;
pub mod store;
pub mod task;

pub use error::{Error, Result};
