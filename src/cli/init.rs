//! kanri init command implementation.
//!
//! Writes a `.kanri.toml` in the current directory so later commands pick
//! up the data file and history settings without flags.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct InitOptions {
    pub data_file: Option<String>,
    pub history_capacity: Option<usize>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct InitReport {
    config: PathBuf,
    created: bool,
}

pub fn run(opts: InitOptions) -> Result<()> {
    let path = std::env::current_dir()?.join(".kanri.toml");

    // An existing config is left alone, flags or not.
    if path.exists() {
        let human = HumanOutput::new("Nothing to do (.kanri.toml exists)");
        return emit_success(
            OutputOptions {
                json: opts.json,
                quiet: opts.quiet,
            },
            "init",
            &InitReport {
                config: path,
                created: false,
            },
            Some(&human),
        );
    }

    let mut config = Config::default();
    if let Some(data_file) = opts.data_file {
        if data_file.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "data_file cannot be empty".to_string(),
            ));
        }
        config.data_file = data_file;
    }
    config.history.capacity = opts.history_capacity;
    config.save(&path)?;

    let mut human = HumanOutput::new("Initialized .kanri.toml");
    human.push_summary("data_file", &config.data_file);
    human.push_summary(
        "history capacity",
        config
            .history
            .capacity
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unbounded".to_string()),
    );
    human.push_next_step("kanri task add <name>");

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "init",
        &InitReport {
            config: path,
            created: true,
        },
        Some(&human),
    )
}
