//! Entity model for kanri work items.
//!
//! Three record types share a common base (id, name, description, status,
//! optional schedule): `Task` stands alone, `Epic` aggregates subtasks and
//! carries only derived status/schedule, `Subtask` belongs to exactly one
//! epic. `Item` is the tagged view used wherever the three are mixed
//! (history, prioritized view, serialization).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Work-item lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    New,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Status::New),
            "in_progress" | "in-progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown status '{other}' (expected new, in-progress, done)"
            ))),
        }
    }
}

/// Type tag distinguishing the three item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Epic,
    Subtask,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Task => "task",
            ItemKind::Epic => "epic",
            ItemKind::Subtask => "subtask",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully defined time slot. Items without both start and duration have no
/// window and never participate in overlap checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Half-open interval overlap: a slot starting exactly when another ends is
/// not a conflict, and zero-length slots conflict with nothing.
pub fn windows_overlap(a: Window, b: Window) -> bool {
    if a.start == a.end || b.start == b.end {
        return false;
    }
    (b.start >= a.start && b.start < a.end) || (b.end > a.start && b.end <= a.end)
}

fn end_of(start: Option<DateTime<Utc>>, duration_min: Option<i64>) -> Option<DateTime<Utc>> {
    Some(start? + Duration::minutes(duration_min?))
}

pub(crate) fn window_of(start: Option<DateTime<Utc>>, duration_min: Option<i64>) -> Option<Window> {
    let start = start?;
    let end = end_of(Some(start), duration_min)?;
    Some(Window { start, end })
}

/// A standalone work item.
///
/// Equality is by value over (id, name, description, status); schedule
/// fields are deliberately excluded so round-trip assertions hold whether
/// or not a task was ever scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
}

impl Task {
    /// End of the scheduled slot; defined only when both start and duration are.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        end_of(self.start, self.duration_min)
    }

    pub fn window(&self) -> Option<Window> {
        window_of(self.start, self.duration_min)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.status == other.status
    }
}

impl Eq for Task {}

/// A container item whose status and schedule are derived from its
/// subtasks, never set by a caller. `end` is stored separately because it
/// is the latest subtask end, not `start + duration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtask_ids: Vec<u32>,
}

impl Epic {
    pub fn window(&self) -> Option<Window> {
        let start = self.start?;
        let end = self.end?;
        Some(Window { start, end })
    }
}

impl PartialEq for Epic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.status == other.status
    }
}

impl Eq for Epic {}

/// A work item owned by exactly one epic. The owning epic is fixed at
/// creation; updates may not move a subtask to another epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u32,
    pub epic_id: u32,
    pub name: String,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<i64>,
}

impl Subtask {
    pub fn end(&self) -> Option<DateTime<Utc>> {
        end_of(self.start, self.duration_min)
    }

    pub fn window(&self) -> Option<Window> {
        window_of(self.start, self.duration_min)
    }
}

impl PartialEq for Subtask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.description == other.description
            && self.status == other.status
    }
}

impl Eq for Subtask {}

/// Unified view over the three item kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Item {
    pub fn id(&self) -> u32 {
        match self {
            Item::Task(t) => t.id,
            Item::Epic(e) => e.id,
            Item::Subtask(s) => s.id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Task(_) => ItemKind::Task,
            Item::Epic(_) => ItemKind::Epic,
            Item::Subtask(_) => ItemKind::Subtask,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Task(t) => &t.name,
            Item::Epic(e) => &e.name,
            Item::Subtask(s) => &s.name,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Item::Task(t) => t.status,
            Item::Epic(e) => e.status,
            Item::Subtask(s) => s.status,
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            Item::Task(t) => t.start,
            Item::Epic(e) => e.start,
            Item::Subtask(s) => s.start,
        }
    }

    pub fn window(&self) -> Option<Window> {
        match self {
            Item::Task(t) => t.window(),
            Item::Epic(e) => e.window(),
            Item::Subtask(s) => s.window(),
        }
    }
}

/// Draft for `TaskManager::create_task`; the store assigns the id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_min: Option<i64>,
}

/// Draft for `TaskManager::create_epic`. Epics are created empty; status
/// and schedule come from subtasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEpic {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Draft for `TaskManager::create_subtask`; `epic_id` must reference an
/// existing epic.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubtask {
    pub epic_id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_min: Option<i64>,
}

/// Partial update for a task: `None` leaves the stored field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub start: Option<DateTime<Utc>>,
    pub duration_min: Option<i64>,
}

/// Partial update for an epic. Only name and description are settable;
/// status and schedule are derived.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpicPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial update for a subtask. A present `epic_id` is verified against
/// the stored owner and rejected on mismatch, never applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubtaskPatch {
    pub epic_id: Option<u32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub start: Option<DateTime<Utc>>,
    pub duration_min: Option<i64>,
}
