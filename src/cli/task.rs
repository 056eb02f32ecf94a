//! kanri task command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{format_time, item_line, open_store, parse_start};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::task::{Item, ItemKind, NewTask, Status, Task, TaskPatch};

pub struct AddOptions {
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
struct TaskData<'a> {
    task: &'a Task,
}

pub fn run_add(opts: AddOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;

    let status = opts.status.as_deref().map(str::parse::<Status>).transpose()?;
    let start = opts.start.as_deref().map(parse_start).transpose()?;

    let id = store.create_task(NewTask {
        name: opts.name,
        description: opts.description,
        status,
        start,
        duration_min: opts.duration,
    })?;
    let task = store
        .tasks()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or(Error::NotFound {
            kind: ItemKind::Task,
            id,
        })?;

    let mut human = HumanOutput::new(format!("Created task {id}"));
    push_task_summary(&mut human, &task);
    human.push_next_step(format!("kanri task show {id}"));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task add",
        &TaskData { task: &task },
        Some(&human),
    )
}

pub fn run_show(opts: ShowOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let task = store.task(opts.id)?;

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    push_task_summary(&mut human, &task);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task show",
        &TaskData { task: &task },
        Some(&human),
    )
}

pub fn run_edit(opts: EditOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;

    let status = opts.status.as_deref().map(str::parse::<Status>).transpose()?;
    let start = opts.start.as_deref().map(parse_start).transpose()?;

    let task = store.update_task(
        opts.id,
        TaskPatch {
            name: opts.name,
            description: opts.description,
            status,
            start,
            duration_min: opts.duration,
        },
    )?;

    let mut human = HumanOutput::new(format!("Updated task {}", task.id));
    push_task_summary(&mut human, &task);

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task edit",
        &TaskData { task: &task },
        Some(&human),
    )
}

pub fn run_rm(opts: RmOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let task = store.remove_task(opts.id)?;

    let human = HumanOutput::new(format!("Removed task {} ({})", task.id, task.name));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task rm",
        &TaskData { task: &task },
        Some(&human),
    )
}

pub fn run_ls(opts: LsOptions) -> Result<()> {
    let store = open_store(opts.file)?;
    let tasks = store.tasks();

    let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(item_line(&Item::Task(task.clone())));
    }

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task ls",
        &tasks,
        Some(&human),
    )
}

pub fn run_clear(opts: ClearOptions) -> Result<()> {
    let mut store = open_store(opts.file)?;
    let removed = store.tasks().len();
    store.clear_tasks()?;

    #[derive(Serialize)]
    struct ClearData {
        removed: usize,
    }

    let human = HumanOutput::new(format!("Removed {removed} task(s)"));

    emit_success(
        OutputOptions {
            json: opts.json,
            quiet: opts.quiet,
        },
        "task clear",
        &ClearData { removed },
        Some(&human),
    )
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("name", &task.name);
    if !task.description.is_empty() {
        human.push_summary("description", &task.description);
    }
    human.push_summary("status", task.status.as_str());
    human.push_summary("start", format_time(task.start));
    human.push_summary(
        "duration",
        task.duration_min
            .map(|m| format!("{m}m"))
            .unwrap_or_else(|| "-".to_string()),
    );
}
