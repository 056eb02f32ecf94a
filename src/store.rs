//! CSV-file-backed store.
//!
//! `FileBackedManager` wraps a `TaskManager` and rewrites its backing file
//! after every call that changes state, lookups included (a lookup changes
//! the view history). The format is one CSV record per item, a blank line,
//! then one row of history ids (oldest first):
//!
//! ```text
//! id,type,name,description,status,start,duration,epic
//! 1,task,Call plumber,Kitchen sink,new,2024-06-01T09:00:00+00:00,30,
//! 2,epic,Renovation,,new,,,
//! 3,subtask,Order tiles,,done,,,2
//! <blank line>
//! 3,1
//! ```
//!
//! Epic aggregates are written as stored but never trusted on load; the
//! manager recomputes them from the subtasks. Text fields are quoted by the
//! csv writer, so names and descriptions may span lines; the history row is
//! recognized by its missing type tag, not by its position. Writes go to a
//! temp file in the same directory followed by a rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::task::{
    Epic, EpicPatch, Item, NewEpic, NewSubtask, NewTask, Status, Subtask, SubtaskPatch, Task,
    TaskPatch,
};

const HEADER: [&str; 8] = [
    "id",
    "type",
    "name",
    "description",
    "status",
    "start",
    "duration",
    "epic",
];

#[derive(Debug)]
pub struct FileBackedManager {
    inner: TaskManager,
    path: PathBuf,
}

impl FileBackedManager {
    /// Open the store at `path`, loading it if the file exists and starting
    /// empty otherwise. The file is only created on the first write.
    pub fn open(path: impl Into<PathBuf>, history_capacity: Option<usize>) -> Result<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let manager = load(&path, history_capacity)?;
            debug!(
                path = %path.display(),
                tasks = manager.tasks().len(),
                epics = manager.epics().len(),
                subtasks = manager.subtasks().len(),
                "loaded store"
            );
            manager
        } else {
            debug!(path = %path.display(), "starting with empty store");
            match history_capacity {
                Some(capacity) => TaskManager::with_history_capacity(capacity),
                None => TaskManager::new(),
            }
        };
        Ok(Self { inner, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // --- mutations: delegate, then persist ---

    pub fn create_task(&mut self, draft: NewTask) -> Result<u32> {
        let id = self.inner.create_task(draft)?;
        self.save()?;
        Ok(id)
    }

    pub fn create_epic(&mut self, draft: NewEpic) -> Result<u32> {
        let id = self.inner.create_epic(draft)?;
        self.save()?;
        Ok(id)
    }

    pub fn create_subtask(&mut self, draft: NewSubtask) -> Result<u32> {
        let id = self.inner.create_subtask(draft)?;
        self.save()?;
        Ok(id)
    }

    // Lookups mutate the view history, so they persist too.

    pub fn task(&mut self, id: u32) -> Result<Task> {
        let task = self.inner.task(id)?;
        self.save()?;
        Ok(task)
    }

    pub fn epic(&mut self, id: u32) -> Result<Epic> {
        let epic = self.inner.epic(id)?;
        self.save()?;
        Ok(epic)
    }

    pub fn subtask(&mut self, id: u32) -> Result<Subtask> {
        let subtask = self.inner.subtask(id)?;
        self.save()?;
        Ok(subtask)
    }

    pub fn update_task(&mut self, id: u32, patch: TaskPatch) -> Result<Task> {
        let task = self.inner.update_task(id, patch)?;
        self.save()?;
        Ok(task)
    }

    pub fn update_epic(&mut self, id: u32, patch: EpicPatch) -> Result<Epic> {
        let epic = self.inner.update_epic(id, patch)?;
        self.save()?;
        Ok(epic)
    }

    pub fn update_subtask(&mut self, id: u32, patch: SubtaskPatch) -> Result<Subtask> {
        let subtask = self.inner.update_subtask(id, patch)?;
        self.save()?;
        Ok(subtask)
    }

    pub fn remove_task(&mut self, id: u32) -> Result<Task> {
        let task = self.inner.remove_task(id)?;
        self.save()?;
        Ok(task)
    }

    pub fn remove_epic(&mut self, id: u32) -> Result<Epic> {
        let epic = self.inner.remove_epic(id)?;
        self.save()?;
        Ok(epic)
    }

    pub fn remove_subtask(&mut self, id: u32) -> Result<Subtask> {
        let subtask = self.inner.remove_subtask(id)?;
        self.save()?;
        Ok(subtask)
    }

    pub fn clear_tasks(&mut self) -> Result<()> {
        self.inner.clear_tasks();
        self.save()
    }

    pub fn clear_subtasks(&mut self) -> Result<()> {
        self.inner.clear_subtasks();
        self.save()
    }

    pub fn clear_epics(&mut self) -> Result<()> {
        self.inner.clear_epics();
        self.save()
    }

    // --- read-only views: straight delegation ---

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.tasks()
    }

    pub fn epics(&self) -> Vec<Epic> {
        self.inner.epics()
    }

    pub fn subtasks(&self) -> Vec<Subtask> {
        self.inner.subtasks()
    }

    pub fn subtasks_of_epic(&self, epic_id: u32) -> Result<Vec<Subtask>> {
        self.inner.subtasks_of_epic(epic_id)
    }

    pub fn history(&self) -> Vec<Item> {
        self.inner.history()
    }

    pub fn prioritized(&self) -> Vec<Item> {
        self.inner.prioritized()
    }

    fn save(&self) -> Result<()> {
        let bytes = serialize(&self.inner)?;
        write_atomic(&self.path, &bytes)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "saved store");
        Ok(())
    }
}

fn serialize(manager: &TaskManager) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for task in manager.tasks() {
        writer.write_record([
            task.id.to_string(),
            "task".to_string(),
            task.name.clone(),
            task.description.clone(),
            task.status.as_str().to_string(),
            time_field(task.start),
            int_field(task.duration_min),
            String::new(),
        ])?;
    }
    for epic in manager.epics() {
        writer.write_record([
            epic.id.to_string(),
            "epic".to_string(),
            epic.name.clone(),
            epic.description.clone(),
            epic.status.as_str().to_string(),
            time_field(epic.start),
            int_field(epic.duration_min),
            String::new(),
        ])?;
    }
    for subtask in manager.subtasks() {
        writer.write_record([
            subtask.id.to_string(),
            "subtask".to_string(),
            subtask.name.clone(),
            subtask.description.clone(),
            subtask.status.as_str().to_string(),
            time_field(subtask.start),
            int_field(subtask.duration_min),
            subtask.epic_id.to_string(),
        ])?;
    }

    let mut out = writer
        .into_inner()
        .map_err(|e| Error::Corrupt(format!("flushing records: {e}")))?;

    out.push(b'\n');
    let history: Vec<String> = manager.history_ids().iter().map(u32::to_string).collect();
    out.extend_from_slice(history.join(",").as_bytes());
    out.push(b'\n');
    Ok(out)
}

fn load(path: &Path, history_capacity: Option<usize>) -> Result<TaskManager> {
    let file = fs::File::open(path)?;

    let mut tasks = Vec::new();
    let mut epics = Vec::new();
    let mut subtasks = Vec::new();
    let mut history_ids: Option<Vec<u32>> = None;

    // A single quoting-aware pass; splitting the raw text would break on
    // names and descriptions that contain newlines. Entity rows carry a
    // type tag in the second field; the only untagged row is the history
    // row. The reader skips the blank line before it.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    for record in reader.records() {
        let record = record?;
        match record.get(1) {
            Some("task") | Some("epic") | Some("subtask") => {
                parse_record(&record, &mut tasks, &mut epics, &mut subtasks)?;
            }
            _ => {
                if history_ids.is_some() {
                    return Err(Error::Corrupt("more than one history row".to_string()));
                }
                history_ids = Some(parse_history_row(&record)?);
            }
        }
    }

    TaskManager::from_parts(
        tasks,
        epics,
        subtasks,
        &history_ids.unwrap_or_default(),
        history_capacity,
    )
}

fn parse_history_row(record: &csv::StringRecord) -> Result<Vec<u32>> {
    record
        .iter()
        .map(|field| {
            field
                .trim()
                .parse()
                .map_err(|_| Error::Corrupt(format!("bad history id '{field}'")))
        })
        .collect()
}

fn parse_record(
    record: &csv::StringRecord,
    tasks: &mut Vec<Task>,
    epics: &mut Vec<Epic>,
    subtasks: &mut Vec<Subtask>,
) -> Result<()> {
    if record.len() != HEADER.len() {
        return Err(Error::Corrupt(format!(
            "expected {} fields, got {}",
            HEADER.len(),
            record.len()
        )));
    }

    let id: u32 = record[0]
        .parse()
        .map_err(|_| Error::Corrupt(format!("bad id '{}'", &record[0])))?;
    let name = record[2].to_string();
    let description = record[3].to_string();
    let status: Status = record[4]
        .parse()
        .map_err(|_| Error::Corrupt(format!("bad status '{}'", &record[4])))?;
    let start = parse_time_field(&record[5])?;
    let duration_min = parse_int_field(&record[6])?;

    match &record[1] {
        "task" => tasks.push(Task {
            id,
            name,
            description,
            status,
            start,
            duration_min,
        }),
        "epic" => epics.push(Epic {
            id,
            name,
            description,
            status,
            start,
            duration_min,
            end: None,
            subtask_ids: Vec::new(),
        }),
        "subtask" => {
            let epic_id: u32 = record[7]
                .parse()
                .map_err(|_| Error::Corrupt(format!("bad epic id '{}'", &record[7])))?;
            subtasks.push(Subtask {
                id,
                epic_id,
                name,
                description,
                status,
                start,
                duration_min,
            });
        }
        other => return Err(Error::Corrupt(format!("unknown record type '{other}'"))),
    }
    Ok(())
}

fn time_field(value: Option<DateTime<Utc>>) -> String {
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

fn int_field(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_time_field(field: &str) -> Result<Option<DateTime<Utc>>> {
    if field.is_empty() {
        return Ok(None);
    }
    let parsed = DateTime::parse_from_rfc3339(field)
        .map_err(|e| Error::Corrupt(format!("bad timestamp '{field}': {e}")))?;
    Ok(Some(parsed.with_timezone(&Utc)))
}

fn parse_int_field(field: &str) -> Result<Option<i64>> {
    if field.is_empty() {
        return Ok(None);
    }
    let parsed: i64 = field
        .parse()
        .map_err(|_| Error::Corrupt(format!("bad duration '{field}'")))?;
    Ok(Some(parsed))
}

/// Write to a temp file in the same directory, then rename into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}
