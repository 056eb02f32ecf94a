//! Command-line interface for kanri
//!
//! This module defines the CLI structure using clap derive macros.
//! Each entity gets its own subcommand module.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::FileBackedManager;
use crate::task::Item;

mod epic;
mod init;
mod subtask;
mod task;
mod view;

/// kanri - hierarchical work-item tracker
///
/// Tracks standalone tasks, epics, and epic-owned subtasks with derived
/// epic status, double-booking protection, and a view history.
#[derive(Parser, Debug)]
#[command(name = "kanri")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path of the CSV data file (defaults to data_file from .kanri.toml)
    #[arg(long, global = true, env = "KANRI_FILE")]
    pub file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a .kanri.toml config in the current directory
    Init {
        /// Data file path to record in the config
        #[arg(long)]
        data_file: Option<String>,

        /// Cap on remembered views; omit for unbounded
        #[arg(long)]
        history_capacity: Option<usize>,
    },

    /// Standalone tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epics (containers whose status and schedule are derived)
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Subtasks owned by an epic
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Show recently viewed items, oldest first
    History,

    /// Show scheduled items ordered by start time
    Prioritized,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task name
        name: String,

        /// Longer description
        #[arg(long, default_value = "")]
        description: String,

        /// Initial status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// Scheduled start (RFC 3339, e.g. 2024-06-01T09:00:00Z)
        #[arg(long)]
        start: Option<String>,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },

    /// Show a task (records it in the view history)
    Show {
        /// Task id
        id: u32,
    },

    /// Update fields of a task; omitted flags leave fields unchanged
    Edit {
        /// Task id
        id: u32,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// New scheduled start (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// New duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },

    /// Remove a task
    Rm {
        /// Task id
        id: u32,
    },

    /// List all tasks
    Ls,

    /// Remove all tasks
    Clear,
}

/// Epic subcommands
#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an empty epic
    Add {
        /// Epic name
        name: String,

        /// Longer description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show an epic (records it in the view history)
    Show {
        /// Epic id
        id: u32,
    },

    /// Update an epic's name or description
    Edit {
        /// Epic id
        id: u32,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove an epic and all of its subtasks
    Rm {
        /// Epic id
        id: u32,
    },

    /// List all epics
    Ls,

    /// Remove all epics (and their subtasks)
    Clear,

    /// List the subtasks of an epic
    Subtasks {
        /// Epic id
        id: u32,
    },
}

/// Subtask subcommands
#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Create a subtask under an epic
    Add {
        /// Owning epic id
        epic: u32,

        /// Subtask name
        name: String,

        /// Longer description
        #[arg(long, default_value = "")]
        description: String,

        /// Initial status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// Scheduled start (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// Duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },

    /// Show a subtask (records it in the view history)
    Show {
        /// Subtask id
        id: u32,
    },

    /// Update fields of a subtask; omitted flags leave fields unchanged
    Edit {
        /// Subtask id
        id: u32,

        /// Owning epic id (must match the stored one)
        #[arg(long)]
        epic: Option<u32>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// New status: new, in-progress, done
        #[arg(long)]
        status: Option<String>,

        /// New scheduled start (RFC 3339)
        #[arg(long)]
        start: Option<String>,

        /// New duration in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },

    /// Remove a subtask
    Rm {
        /// Subtask id
        id: u32,
    },

    /// List all subtasks
    Ls,

    /// Remove all subtasks (epics reset to NEW)
    Clear,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init {
                data_file,
                history_capacity,
            } => init::run(init::InitOptions {
                data_file,
                history_capacity,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    name,
                    description,
                    status,
                    start,
                    duration,
                } => task::run_add(task::AddOptions {
                    name,
                    description,
                    status,
                    start,
                    duration,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Edit {
                    id,
                    name,
                    description,
                    status,
                    start,
                    duration,
                } => task::run_edit(task::EditOptions {
                    id,
                    name,
                    description,
                    status,
                    start,
                    duration,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Ls => task::run_ls(task::LsOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Clear => task::run_clear(task::ClearOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::Add { name, description } => epic::run_add(epic::AddOptions {
                    name,
                    description,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Show { id } => epic::run_show(epic::ShowOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Edit {
                    id,
                    name,
                    description,
                } => epic::run_edit(epic::EditOptions {
                    id,
                    name,
                    description,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Rm { id } => epic::run_rm(epic::RmOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Ls => epic::run_ls(epic::LsOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Clear => epic::run_clear(epic::ClearOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                EpicCommands::Subtasks { id } => epic::run_subtasks(epic::SubtasksOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Subtask(cmd) => match cmd {
                SubtaskCommands::Add {
                    epic,
                    name,
                    description,
                    status,
                    start,
                    duration,
                } => subtask::run_add(subtask::AddOptions {
                    epic,
                    name,
                    description,
                    status,
                    start,
                    duration,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SubtaskCommands::Show { id } => subtask::run_show(subtask::ShowOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SubtaskCommands::Edit {
                    id,
                    epic,
                    name,
                    description,
                    status,
                    start,
                    duration,
                } => subtask::run_edit(subtask::EditOptions {
                    id,
                    epic,
                    name,
                    description,
                    status,
                    start,
                    duration,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SubtaskCommands::Rm { id } => subtask::run_rm(subtask::RmOptions {
                    id,
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SubtaskCommands::Ls => subtask::run_ls(subtask::LsOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
                SubtaskCommands::Clear => subtask::run_clear(subtask::ClearOptions {
                    file: self.file,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::History => view::run_history(view::ViewOptions {
                file: self.file,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Prioritized => view::run_prioritized(view::ViewOptions {
                file: self.file,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

/// Resolve the data file (flag beats config) and open the store.
pub(crate) fn open_store(file: Option<PathBuf>) -> Result<FileBackedManager> {
    let cwd = std::env::current_dir()?;
    let config = Config::load_from_dir(&cwd);
    let path = file.unwrap_or_else(|| PathBuf::from(&config.data_file));
    FileBackedManager::open(path, config.history.capacity)
}

pub(crate) fn parse_start(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            Error::InvalidArgument(format!(
                "bad start time '{value}': {e} (expected RFC 3339, e.g. 2024-06-01T09:00:00Z)"
            ))
        })
}

pub(crate) fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn item_line(item: &Item) -> String {
    let schedule = match (item.start(), item.window()) {
        (Some(start), Some(window)) => {
            format!(" {} .. {}", start.to_rfc3339(), window.end.to_rfc3339())
        }
        (Some(start), None) => format!(" {}", start.to_rfc3339()),
        _ => String::new(),
    };
    format!(
        "#{} [{}] {} ({}){}",
        item.id(),
        item.kind(),
        item.name(),
        item.status(),
        schedule
    )
}
