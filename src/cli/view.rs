//! kanri history and prioritized view commands.

use std::path::PathBuf;

use crate::cli::{item_line, open_store};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct ViewOptions {
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_history(opts: ViewOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let items = store.history();

    let mut human = HumanOutput::new(format!("{} viewed item(s), oldest first", items.len()));
    for item in &items {
        human.push_detail(item_line(item));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "history",
        &items,
        Some(&human),
    )
}

pub fn run_prioritized(opts: ViewOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let items = store.prioritized();

    let mut human = HumanOutput::new(format!("{} scheduled item(s), by start time", items.len()));
    for item in &items {
        human.push_detail(item_line(item));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "prioritized",
        &items,
        Some(&human),
    )
}
