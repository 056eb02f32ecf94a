//! kanri subtask command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{format_time, item_line, open_store, parse_start};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{Item, ItemKind, NewSubtask, Status, Subtask, SubtaskPatch};

pub struct AddOptions {
    pub epic: u32,
    pub name: String,
    pub description: String,
    pub status: Option<String>,
    pub start: Option<String>,
    pub duration: Option<i64>,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: u32,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct EditOptions {
    pub id: u32,
    pub epic: Option<u32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub start: Option<String>,
    pub duration: Option<i64>,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct RmOptions {
    pub id: u32,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct LsOptions {
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ClearOptions {
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct SubtaskData<'a> {
    subtask: &'a Subtask,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;

    let status = opts.status.as_deref().map(str::parse::<Status>).transpose()?;
    let start = opts.start.as_deref().map(parse_start).transpose()?;

    let id = store.create_subtask(NewSubtask {
        epic_id: opts.epic,
        name: opts.name,
        description: opts.description,
        status,
        start,
        duration_min: opts.duration,
    })?;
    let subtask = store
        .subtasks()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or(Error::NotFound {
            kind: ItemKind::Subtask,
            id,
        })?;

    let mut human = HumanOutput::new(format!("Created subtask {id} in epic {}", opts.epic));
    push_subtask_summary(&mut human, &subtask);
    human.push_next_step(format!("kanri epic show {}", opts.epic));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask add",
        &SubtaskData { subtask: &subtask },
        Some(&human),
    )
}

pub fn run_show(opts: ShowOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let subtask = store.subtask(opts.id)?;

    let mut human = HumanOutput::new(format!("Subtask {}", subtask.id));
    push_subtask_summary(&mut human, &subtask);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask show",
        &SubtaskData { subtask: &subtask },
        Some(&human),
    )
}

pub fn run_edit(opts: EditOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;

    let status = opts.status.as_deref().map(str::parse::<Status>).transpose()?;
    let start = opts.start.as_deref().map(parse_start).transpose()?;

    let subtask = store.update_subtask(
        opts.id,
        SubtaskPatch {
            epic_id: opts.epic,
            name: opts.name,
            description: opts.description,
            status,
            start,
            duration_min: opts.duration,
        },
    )?;

    let mut human = HumanOutput::new(format!("Updated subtask {}", subtask.id));
    push_subtask_summary(&mut human, &subtask);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask edit",
        &SubtaskData { subtask: &subtask },
        Some(&human),
    )
}

pub fn run_rm(opts: RmOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let subtask = store.remove_subtask(opts.id)?;

    let mut human = HumanOutput::new(format!(
        "Removed subtask {} ({})",
        subtask.id, subtask.name
    ));
    human.push_summary("epic", subtask.epic_id.to_string());

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask rm",
        &SubtaskData { subtask: &subtask },
        Some(&human),
    )
}

pub fn run_ls(opts: LsOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let subtasks = store.subtasks();

    let mut human = HumanOutput::new(format!("{} subtask(s)", subtasks.len()));
    for subtask in &subtasks {
        human.push_detail(item_line(&Item::Subtask(subtask.clone())));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask ls",
        &subtasks,
        Some(&human),
    )
}

pub fn run_clear(opts: ClearOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let removed = store.subtasks().len();
    store.clear_subtasks()?;

    #[derive(Serialize)]
    struct ClearData {
        removed: usize,
    }

    let human = HumanOutput::new(format!(
        "Removed {removed} subtask(s); epics reset to new"
    ));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "subtask clear",
        &ClearData { removed },
        Some(&human),
    )
}

fn push_subtask_summary(human: &mut HumanOutput, subtask: &Subtask) {
    human.push_summary("epic", subtask.epic_id.to_string());
    human.push_summary("name", &subtask.name);
    if !subtask.description.is_empty() {
        human.push_summary("description", &subtask.description);
    }
    human.push_summary("status", subtask.status.as_str());
    human.push_summary("start", format_time(subtask.start));
    human.push_summary(
        "duration",
        subtask
            .duration_min
            .map(|m| format!("{m}m"))
            .unwrap_or_else(|| "-".to_string()),
    );
}
