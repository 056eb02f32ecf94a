//! kanri epic command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{format_time, item_line, open_store};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{Epic, EpicPatch, Item, ItemKind, NewEpic, Subtask};

pub struct AddOptions {
    pub name: String,
    pub description: String,
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
    pub name: Option<String>,
    pub description: Option<String>,
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

pub struct SubtasksOptions {
    pub id: u32,
    pub file: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct EpicData<'a> {
    epic: &'a Epic,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let id = store.create_epic(NewEpic {
        name: opts.name,
        description: opts.description,
    })?;
    let epic = store
        .epics()
        .into_iter()
        .find(|e| e.id == id)
        .ok_or(Error::NotFound {
            kind: ItemKind::Epic,
            id,
        })?;

    let mut human = HumanOutput::new(format!("Created epic {id}"));
    push_epic_summary(&mut human, &epic);
    human.push_next_step(format!("kanri subtask add {id} <name>"));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic add",
        &EpicData { epic: &epic },
        Some(&human),
    )
}

pub fn run_show(opts: ShowOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let epic = store.epic(opts.id)?;

    let mut human = HumanOutput::new(format!("Epic {}", epic.id));
    push_epic_summary(&mut human, &epic);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic show",
        &EpicData { epic: &epic },
        Some(&human),
    )
}

pub fn run_edit(opts: EditOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let epic = store.update_epic(
        opts.id,
        EpicPatch {
            name: opts.name,
            description: opts.description,
        },
    )?;

    let mut human = HumanOutput::new(format!("Updated epic {}", epic.id));
    push_epic_summary(&mut human, &epic);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic edit",
        &EpicData { epic: &epic },
        Some(&human),
    )
}

pub fn run_rm(opts: RmOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let epic = store.remove_epic(opts.id)?;

    let mut human = HumanOutput::new(format!("Removed epic {} ({})", epic.id, epic.name));
    if !epic.subtask_ids.is_empty() {
        human.push_summary("subtasks removed", epic.subtask_ids.len().to_string());
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic rm",
        &EpicData { epic: &epic },
        Some(&human),
    )
}

pub fn run_ls(opts: LsOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let epics = store.epics();

    let mut human = HumanOutput::new(format!("{} epic(s)", epics.len()));
    for epic in &epics {
        human.push_detail(item_line(&Item::Epic(epic.clone())));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic ls",
        &epics,
        Some(&human),
    )
}

pub fn run_clear(opts: ClearOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let removed_epics = store.epics().len();
    let removed_subtasks = store.subtasks().len();
    store.clear_epics()?;

    #[derive(Serialize)]
    struct ClearData {
        removed_epics: usize,
        removed_subtasks: usize,
    }

    let human = HumanOutput::new(format!(
        "Removed {removed_epics} epic(s) and {removed_subtasks} subtask(s)"
    ));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic clear",
        &ClearData {
            removed_epics,
            removed_subtasks,
        },
        Some(&human),
    )
}

pub fn run_subtasks(opts: SubtasksOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let subtasks: Vec<Subtask> = store.subtasks_of_epic(opts.id)?;

    let mut human = HumanOutput::new(format!(
        "{} subtask(s) in epic {}",
        subtasks.len(),
        opts.id
    ));
    for subtask in &subtasks {
        human.push_detail(item_line(&Item::Subtask(subtask.clone())));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "epic subtasks",
        &subtasks,
        Some(&human),
    )
}

fn push_epic_summary(human: &mut HumanOutput, epic: &Epic) {
    human.push_summary("name", &epic.name);
    if !epic.description.is_empty() {
        human.push_summary("description", &epic.description);
    }
    human.push_summary("status", epic.status.as_str());
    human.push_summary("subtasks", epic.subtask_ids.len().to_string());
    human.push_summary("start", format_time(epic.start));
    human.push_summary("end", format_time(epic.end));
    human.push_summary(
        "duration",
        epic.duration_min
            .map(|m| format!("{m}m"))
            .unwrap_or_else(|| "-".to_string()),
    );
}
