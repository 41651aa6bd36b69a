use crate::domain::duration::{SLOT_MINUTES, validate_duration};
use crate::domain::time_grid::TimeSlot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "todo" | "pending" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("invalid task status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl TaskPriority {
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("invalid task priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSummary {
    pub id: String,
    pub name: String,
    pub gradient: Option<String>,
}

impl ClientSummary {
    /// First letter of up to two words of the client name.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Catalog entry; read-only from the planner's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_name: Option<String>,
    pub client: Option<ClientSummary>,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        Ok(())
    }
}

/// Per user, task and date. `is_scheduled` alone decides the bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPlanningRecord {
    pub user_id: String,
    pub task_id: String,
    pub scheduled_date: NaiveDate,
    pub allocated_minutes: u32,
    pub order_index: i64,
    pub is_scheduled: bool,
    pub start_time: Option<TimeSlot>,
}

impl TaskPlanningRecord {
    pub fn key(&self) -> (&str, &str, NaiveDate) {
        (&self.user_id, &self.task_id, self.scheduled_date)
    }
}

/// Upsert payload keyed on `(user_id, task_id, scheduled_date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanningRecordDraft {
    pub user_id: String,
    pub task_id: String,
    pub scheduled_date: NaiveDate,
    pub allocated_minutes: u32,
    pub order_index: i64,
    pub is_scheduled: bool,
    pub start_time: Option<TimeSlot>,
}

impl PlanningRecordDraft {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.user_id, "planning.user_id")?;
        validate_non_empty(&self.task_id, "planning.task_id")?;
        Ok(())
    }

    pub fn into_record(self) -> TaskPlanningRecord {
        TaskPlanningRecord {
            user_id: self.user_id,
            task_id: self.task_id,
            scheduled_date: self.scheduled_date,
            allocated_minutes: self.allocated_minutes,
            order_index: self.order_index,
            is_scheduled: self.is_scheduled,
            start_time: self.start_time,
        }
    }
}

/// A grid entry with no backing task record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomEntry {
    pub id: String,
    pub user_id: String,
    pub scheduled_date: NaiveDate,
    pub title: String,
    pub start_time: TimeSlot,
    pub duration_minutes: u32,
    pub color_tag: Option<String>,
}

impl CustomEntry {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "custom_entry.id")?;
        validate_non_empty(&self.user_id, "custom_entry.user_id")?;
        validate_non_empty(&self.title, "custom_entry.title")?;
        validate_duration(self.duration_minutes, "custom_entry.duration_minutes")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledTaskType {
    Task,
    Custom,
}

/// Identifies something that can sit on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EntryRef {
    Task(String),
    Custom(String),
}

impl EntryRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Task(id) | Self::Custom(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: String,
    pub task_type: ScheduledTaskType,
    pub title: String,
    pub start_time: TimeSlot,
    pub duration_minutes: u32,
    pub color_tag: Option<String>,
}

impl ScheduledTask {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "scheduled_task.id")?;
        validate_duration(self.duration_minutes, "scheduled_task.duration_minutes")?;
        if self.task_type == ScheduledTaskType::Task && self.color_tag.is_some() {
            return Err("scheduled_task.color_tag is only allowed on custom entries".to_string());
        }
        Ok(())
    }

    pub fn entry_ref(&self) -> EntryRef {
        match self.task_type {
            ScheduledTaskType::Task => EntryRef::Task(self.id.clone()),
            ScheduledTaskType::Custom => EntryRef::Custom(self.id.clone()),
        }
    }

    /// Minutes since midnight at which the entry ends; may pass midnight.
    pub fn end_minutes(&self) -> u32 {
        self.start_time.minutes_since_midnight() + self.duration_minutes
    }

    /// Derived end label, `None` when the entry runs past the day.
    pub fn end_time(&self) -> Option<TimeSlot> {
        self.start_time
            .plus_minutes(self.duration_minutes.div_ceil(SLOT_MINUTES) * SLOT_MINUTES)
    }
}

impl From<&CustomEntry> for ScheduledTask {
    fn from(entry: &CustomEntry) -> Self {
        Self {
            id: entry.id.clone(),
            task_type: ScheduledTaskType::Custom,
            title: entry.title.clone(),
            start_time: entry.start_time,
            duration_minutes: entry.duration_minutes,
            color_tag: entry.color_tag.clone(),
        }
    }
}

/// A catalog task joined with its planning record (or defaults) for one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPlanningItem {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee_name: Option<String>,
    pub client_name: Option<String>,
    pub client_gradient: Option<String>,
    pub client_initials: Option<String>,
    pub allocated_minutes: u32,
    pub order_index: i64,
    pub is_scheduled: bool,
    pub start_time: Option<TimeSlot>,
    pub has_record: bool,
    pub catalog_position: usize,
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("date '{}' must be YYYY-MM-DD", value.trim()))
}
