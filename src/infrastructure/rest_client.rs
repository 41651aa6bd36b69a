use crate::domain::models::{
    ClientSummary, CustomEntry, PlanningRecordDraft, Task, TaskPlanningRecord, TaskPriority,
    TaskStatus,
};
use crate::domain::time_grid::TimeSlot;
use crate::infrastructure::config::RestBackendConfig;
use crate::infrastructure::error::PlannerError;
use crate::infrastructure::planning_store::PlanningStore;
use crate::infrastructure::task_catalog::TaskCatalog;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

const PLANNING_TABLE: &str = "task_planning";
const CUSTOM_ENTRIES_TABLE: &str = "custom_entries";
const TASKS_TABLE: &str = "tasks";
const TASK_SELECT: &str = "id,title,description,status,priority,due_date,position,\
assignee:team_members(name),client:clients(id,name,gradient)";

/// Planning store and task catalog backed by a PostgREST-style HTTP API.
#[derive(Debug, Clone)]
pub struct RestBackendClient {
    client: Client,
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RestBackendClient {
    pub fn new(config: RestBackendConfig) -> Result<Self, PlannerError> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|error| {
            PlannerError::InvalidConfig(format!("invalid backend url '{}': {error}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PlannerError::InvalidConfig(format!(
                "backend url '{}' cannot be a base",
                config.base_url
            )));
        }
        if config.api_key.trim().is_empty() {
            return Err(PlannerError::InvalidConfig(
                "backend api key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            api_key: config.api_key,
            access_token: config.access_token,
        })
    }

    fn table_endpoint(&self, table: &str) -> Result<Url, PlannerError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PlannerError::InvalidConfig("backend url cannot be a base".to_string())
            })?;
            segments.pop_if_empty().extend(["rest", "v1", table]);
        }
        Ok(url)
    }

    fn filtered_endpoint(&self, table: &str, filters: &[(&str, String)]) -> Result<Url, PlannerError> {
        let mut url = self.table_endpoint(table)?;
        {
            let mut query = url.query_pairs_mut();
            for (column, value) in filters {
                query.append_pair(column, value);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<String, PlannerError> {
        let response: Response = self.authorized(request).send().await.map_err(|error| {
            PlannerError::Persistence(format!("network error while {action}: {error}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            PlannerError::Persistence(format!("failed reading response while {action}: {error}"))
        })?;

        if !status.is_success() {
            return Err(backend_http_error(action, status, &body));
        }
        Ok(body)
    }
}

fn backend_http_error(action: &str, status: reqwest::StatusCode, body: &str) -> PlannerError {
    if body.trim().is_empty() {
        PlannerError::Persistence(format!("backend error while {action}: http {}", status.as_u16()))
    } else {
        PlannerError::Persistence(format!(
            "backend error while {action}: http {}; body={body}",
            status.as_u16()
        ))
    }
}

fn eq_filter(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn parse_payload<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<T, PlannerError> {
    serde_json::from_str(body).map_err(|error| {
        PlannerError::Persistence(format!("invalid {what} payload: {error}; body={body}"))
    })
}

/// Database `time` columns come back as `HH:MM:SS`.
fn parse_remote_slot(value: &str) -> Result<TimeSlot, PlannerError> {
    let trimmed = value.trim();
    let label = trimmed.get(..5).unwrap_or(trimmed);
    TimeSlot::parse(label)
        .map_err(|error| PlannerError::Persistence(format!("invalid remote time slot: {error}")))
}

#[derive(Debug, Serialize, Deserialize)]
struct PlanningRow {
    user_id: String,
    task_id: String,
    scheduled_date: NaiveDate,
    allocated_minutes: u32,
    order_index: i64,
    is_scheduled: bool,
    #[serde(default)]
    start_time: Option<String>,
}

impl PlanningRow {
    fn from_draft(draft: &PlanningRecordDraft) -> Self {
        Self {
            user_id: draft.user_id.trim().to_string(),
            task_id: draft.task_id.trim().to_string(),
            scheduled_date: draft.scheduled_date,
            allocated_minutes: draft.allocated_minutes,
            order_index: draft.order_index,
            is_scheduled: draft.is_scheduled,
            start_time: draft.start_time.map(|slot| slot.to_string()),
        }
    }

    fn into_record(self) -> Result<TaskPlanningRecord, PlannerError> {
        Ok(TaskPlanningRecord {
            user_id: self.user_id,
            task_id: self.task_id,
            scheduled_date: self.scheduled_date,
            allocated_minutes: self.allocated_minutes,
            order_index: self.order_index,
            is_scheduled: self.is_scheduled,
            start_time: self.start_time.as_deref().map(parse_remote_slot).transpose()?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CustomEntryRow {
    id: String,
    user_id: String,
    scheduled_date: NaiveDate,
    title: String,
    start_time: String,
    duration_minutes: u32,
    #[serde(default)]
    color_tag: Option<String>,
}

impl CustomEntryRow {
    fn from_entry(entry: &CustomEntry) -> Self {
        Self {
            id: entry.id.trim().to_string(),
            user_id: entry.user_id.trim().to_string(),
            scheduled_date: entry.scheduled_date,
            title: entry.title.clone(),
            start_time: entry.start_time.to_string(),
            duration_minutes: entry.duration_minutes,
            color_tag: entry.color_tag.clone(),
        }
    }

    fn into_entry(self) -> Result<CustomEntry, PlannerError> {
        Ok(CustomEntry {
            id: self.id,
            user_id: self.user_id,
            scheduled_date: self.scheduled_date,
            title: self.title,
            start_time: parse_remote_slot(&self.start_time)?,
            duration_minutes: self.duration_minutes,
            color_tag: self.color_tag,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NamedRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    id: String,
    name: String,
    #[serde(default)]
    gradient: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskRow {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    status: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    assignee: Option<NamedRow>,
    #[serde(default)]
    client: Option<ClientRow>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, PlannerError> {
        let status = TaskStatus::parse(&self.status).map_err(PlannerError::Persistence)?;
        // Unknown priorities are treated as unset rather than failing the catalog.
        let priority = self
            .priority
            .as_deref()
            .and_then(|value| TaskPriority::parse(value).ok());
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            priority,
            due_date: self.due_date,
            assignee_name: self.assignee.map(|assignee| assignee.name),
            client: self.client.map(|client| ClientSummary {
                id: client.id,
                name: client.name,
                gradient: client.gradient,
            }),
        })
    }
}

#[derive(Debug, Serialize)]
struct StatusPatch<'a> {
    status: &'a str,
}

#[async_trait]
impl PlanningStore for RestBackendClient {
    async fn load_planning_records(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TaskPlanningRecord>, PlannerError> {
        let endpoint = self.filtered_endpoint(
            PLANNING_TABLE,
            &[
                ("select", "*".to_string()),
                ("user_id", eq_filter(user_id.trim())),
                ("scheduled_date", eq_filter(date)),
                ("order", "order_index.asc".to_string()),
            ],
        )?;
        let body = self
            .send(self.client.get(endpoint), "loading planning records")
            .await?;
        let rows: Vec<PlanningRow> = parse_payload(&body, "planning records")?;
        rows.into_iter().map(PlanningRow::into_record).collect()
    }

    async fn upsert_planning_record(
        &self,
        draft: &PlanningRecordDraft,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        draft.validate().map_err(PlannerError::Validation)?;
        let endpoint = self.filtered_endpoint(
            PLANNING_TABLE,
            &[("on_conflict", "user_id,task_id,scheduled_date".to_string())],
        )?;
        let request = self
            .client
            .post(endpoint)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[PlanningRow::from_draft(draft)]);
        let body = self.send(request, "upserting planning record").await?;
        let mut rows: Vec<PlanningRow> = parse_payload(&body, "planning record upsert")?;
        match rows.pop() {
            Some(row) => row.into_record(),
            None => Ok(draft.clone().into_record()),
        }
    }

    async fn delete_planning_record(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), PlannerError> {
        let endpoint = self.filtered_endpoint(
            PLANNING_TABLE,
            &[
                ("user_id", eq_filter(user_id.trim())),
                ("task_id", eq_filter(task_id.trim())),
                ("scheduled_date", eq_filter(date)),
            ],
        )?;
        self.send(self.client.delete(endpoint), "deleting planning record")
            .await?;
        Ok(())
    }

    async fn load_custom_entries(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CustomEntry>, PlannerError> {
        let endpoint = self.filtered_endpoint(
            CUSTOM_ENTRIES_TABLE,
            &[
                ("select", "*".to_string()),
                ("user_id", eq_filter(user_id.trim())),
                ("scheduled_date", eq_filter(date)),
                ("order", "start_time.asc".to_string()),
            ],
        )?;
        let body = self
            .send(self.client.get(endpoint), "loading custom entries")
            .await?;
        let rows: Vec<CustomEntryRow> = parse_payload(&body, "custom entries")?;
        rows.into_iter().map(CustomEntryRow::into_entry).collect()
    }

    async fn upsert_custom_entry(&self, entry: &CustomEntry) -> Result<CustomEntry, PlannerError> {
        entry.validate().map_err(PlannerError::Validation)?;
        let endpoint =
            self.filtered_endpoint(CUSTOM_ENTRIES_TABLE, &[("on_conflict", "id".to_string())])?;
        let request = self
            .client
            .post(endpoint)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[CustomEntryRow::from_entry(entry)]);
        let body = self.send(request, "upserting custom entry").await?;
        let mut rows: Vec<CustomEntryRow> = parse_payload(&body, "custom entry upsert")?;
        match rows.pop() {
            Some(row) => row.into_entry(),
            None => Ok(entry.clone()),
        }
    }

    async fn delete_custom_entry(&self, user_id: &str, entry_id: &str) -> Result<(), PlannerError> {
        let endpoint = self.filtered_endpoint(
            CUSTOM_ENTRIES_TABLE,
            &[
                ("user_id", eq_filter(user_id.trim())),
                ("id", eq_filter(entry_id.trim())),
            ],
        )?;
        self.send(self.client.delete(endpoint), "deleting custom entry")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskCatalog for RestBackendClient {
    async fn load_task_catalog(&self, user_id: &str) -> Result<Vec<Task>, PlannerError> {
        let endpoint = self.filtered_endpoint(
            TASKS_TABLE,
            &[
                ("select", TASK_SELECT.to_string()),
                ("user_id", eq_filter(user_id.trim())),
                ("order", "position.asc,created_at.asc".to_string()),
            ],
        )?;
        let body = self
            .send(self.client.get(endpoint), "loading task catalog")
            .await?;
        let rows: Vec<TaskRow> = parse_payload(&body, "task catalog")?;
        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<(), PlannerError> {
        let endpoint = self.filtered_endpoint(TASKS_TABLE, &[("id", eq_filter(task_id.trim()))])?;
        let request = self
            .client
            .patch(endpoint)
            .header("Prefer", "return=representation")
            .json(&StatusPatch {
                status: status.as_str(),
            });
        let body = self.send(request, "updating task status").await?;
        let rows: Vec<serde_json::Value> = parse_payload(&body, "task status update")?;
        if rows.is_empty() {
            return Err(PlannerError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}
