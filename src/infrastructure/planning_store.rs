use crate::domain::models::{CustomEntry, PlanningRecordDraft, TaskPlanningRecord};
use crate::domain::time_grid::TimeSlot;
use crate::infrastructure::error::PlannerError;
use crate::infrastructure::storage::{date_column, minutes_column};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persistence collaborator for planning records and custom grid entries.
///
/// Upserts are idempotent per `(user_id, task_id, scheduled_date)` and
/// deletes of missing rows succeed, so callers may retry freely.
#[async_trait]
pub trait PlanningStore: Send + Sync {
    async fn load_planning_records(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TaskPlanningRecord>, PlannerError>;

    async fn upsert_planning_record(
        &self,
        draft: &PlanningRecordDraft,
    ) -> Result<TaskPlanningRecord, PlannerError>;

    async fn delete_planning_record(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), PlannerError>;

    async fn load_custom_entries(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CustomEntry>, PlannerError>;

    async fn upsert_custom_entry(&self, entry: &CustomEntry) -> Result<CustomEntry, PlannerError>;

    async fn delete_custom_entry(&self, user_id: &str, entry_id: &str) -> Result<(), PlannerError>;
}

type RecordKey = (String, String, NaiveDate);

#[derive(Debug, Default)]
pub struct InMemoryPlanningStore {
    records: Mutex<BTreeMap<RecordKey, TaskPlanningRecord>>,
    custom_entries: Mutex<BTreeMap<String, CustomEntry>>,
}

impl InMemoryPlanningStore {
    pub fn with_records(records: Vec<TaskPlanningRecord>) -> Self {
        let store = Self::default();
        if let Ok(mut guard) = store.records.lock() {
            for record in records {
                guard.insert(record_key(&record.user_id, &record.task_id, record.scheduled_date), record);
            }
        }
        store
    }

    /// Every stored record in key order.
    pub fn records_snapshot(&self) -> Result<Vec<TaskPlanningRecord>, PlannerError> {
        let records = self.lock_records()?;
        Ok(records.values().cloned().collect())
    }

    pub fn custom_entries_snapshot(&self) -> Result<Vec<CustomEntry>, PlannerError> {
        let entries = self.lock_custom_entries()?;
        Ok(entries.values().cloned().collect())
    }

    fn lock_records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<RecordKey, TaskPlanningRecord>>, PlannerError> {
        self.records.lock().map_err(|error| {
            PlannerError::Persistence(format!("planning records lock poisoned: {error}"))
        })
    }

    fn lock_custom_entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, CustomEntry>>, PlannerError> {
        self.custom_entries.lock().map_err(|error| {
            PlannerError::Persistence(format!("custom entries lock poisoned: {error}"))
        })
    }
}

fn record_key(user_id: &str, task_id: &str, date: NaiveDate) -> RecordKey {
    (user_id.trim().to_string(), task_id.trim().to_string(), date)
}

#[async_trait]
impl PlanningStore for InMemoryPlanningStore {
    async fn load_planning_records(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TaskPlanningRecord>, PlannerError> {
        let user_id = user_id.trim();
        let records = self.lock_records()?;
        Ok(records
            .values()
            .filter(|record| record.user_id == user_id && record.scheduled_date == date)
            .cloned()
            .collect())
    }

    async fn upsert_planning_record(
        &self,
        draft: &PlanningRecordDraft,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        draft.validate().map_err(PlannerError::Validation)?;
        let record = draft.clone().into_record();
        let mut records = self.lock_records()?;
        records.insert(
            record_key(&record.user_id, &record.task_id, record.scheduled_date),
            record.clone(),
        );
        Ok(record)
    }

    async fn delete_planning_record(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), PlannerError> {
        let mut records = self.lock_records()?;
        records.remove(&record_key(user_id, task_id, date));
        Ok(())
    }

    async fn load_custom_entries(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CustomEntry>, PlannerError> {
        let user_id = user_id.trim();
        let entries = self.lock_custom_entries()?;
        Ok(entries
            .values()
            .filter(|entry| entry.user_id == user_id && entry.scheduled_date == date)
            .cloned()
            .collect())
    }

    async fn upsert_custom_entry(&self, entry: &CustomEntry) -> Result<CustomEntry, PlannerError> {
        entry.validate().map_err(PlannerError::Validation)?;
        let mut entries = self.lock_custom_entries()?;
        entries.insert(entry.id.trim().to_string(), entry.clone());
        Ok(entry.clone())
    }

    async fn delete_custom_entry(&self, user_id: &str, entry_id: &str) -> Result<(), PlannerError> {
        let mut entries = self.lock_custom_entries()?;
        let owned = entries
            .get(entry_id.trim())
            .is_some_and(|entry| entry.user_id == user_id.trim());
        if owned {
            entries.remove(entry_id.trim());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqlitePlanningStore {
    db_path: PathBuf,
}

impl SqlitePlanningStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, PlannerError> {
        Connection::open(&self.db_path).map_err(PlannerError::from)
    }
}

fn parse_stored_slot(value: &str) -> Result<TimeSlot, PlannerError> {
    TimeSlot::parse(value)
        .map_err(|error| PlannerError::Persistence(format!("invalid stored time slot: {error}")))
}

#[async_trait]
impl PlanningStore for SqlitePlanningStore {
    async fn load_planning_records(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TaskPlanningRecord>, PlannerError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT task_id, allocated_minutes, order_index, is_scheduled, start_time
             FROM task_planning
             WHERE user_id = ?1 AND scheduled_date = ?2
             ORDER BY order_index, task_id",
        )?;
        let rows = statement
            .query_map(params![user_id.trim(), date_column(date)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(task_id, allocated, order_index, is_scheduled, start_time)| {
                Ok::<_, PlannerError>(TaskPlanningRecord {
                    user_id: user_id.trim().to_string(),
                    task_id,
                    scheduled_date: date,
                    allocated_minutes: minutes_column(allocated, "allocated_minutes")?,
                    order_index,
                    is_scheduled,
                    start_time: start_time.as_deref().map(parse_stored_slot).transpose()?,
                })
            })
            .collect()
    }

    async fn upsert_planning_record(
        &self,
        draft: &PlanningRecordDraft,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        draft.validate().map_err(PlannerError::Validation)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO task_planning
               (user_id, task_id, scheduled_date, allocated_minutes, order_index, is_scheduled, start_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, task_id, scheduled_date) DO UPDATE SET
               allocated_minutes = excluded.allocated_minutes,
               order_index = excluded.order_index,
               is_scheduled = excluded.is_scheduled,
               start_time = excluded.start_time",
            params![
                draft.user_id.trim(),
                draft.task_id.trim(),
                date_column(draft.scheduled_date),
                i64::from(draft.allocated_minutes),
                draft.order_index,
                draft.is_scheduled,
                draft.start_time.map(|slot| slot.to_string()),
            ],
        )?;
        Ok(draft.clone().into_record())
    }

    async fn delete_planning_record(
        &self,
        user_id: &str,
        task_id: &str,
        date: NaiveDate,
    ) -> Result<(), PlannerError> {
        let connection = self.connect()?;
        connection.execute(
            "DELETE FROM task_planning WHERE user_id = ?1 AND task_id = ?2 AND scheduled_date = ?3",
            params![user_id.trim(), task_id.trim(), date_column(date)],
        )?;
        Ok(())
    }

    async fn load_custom_entries(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<CustomEntry>, PlannerError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, title, start_time, duration_minutes, color_tag
             FROM custom_entries
             WHERE user_id = ?1 AND scheduled_date = ?2
             ORDER BY start_time, id",
        )?;
        let rows = statement
            .query_map(params![user_id.trim(), date_column(date)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, title, start_time, duration, color_tag)| {
                Ok::<_, PlannerError>(CustomEntry {
                    id,
                    user_id: user_id.trim().to_string(),
                    scheduled_date: date,
                    title,
                    start_time: parse_stored_slot(&start_time)?,
                    duration_minutes: minutes_column(duration, "duration_minutes")?,
                    color_tag,
                })
            })
            .collect()
    }

    async fn upsert_custom_entry(&self, entry: &CustomEntry) -> Result<CustomEntry, PlannerError> {
        entry.validate().map_err(PlannerError::Validation)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO custom_entries
               (id, user_id, scheduled_date, title, start_time, duration_minutes, color_tag)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
               scheduled_date = excluded.scheduled_date,
               title = excluded.title,
               start_time = excluded.start_time,
               duration_minutes = excluded.duration_minutes,
               color_tag = excluded.color_tag",
            params![
                entry.id.trim(),
                entry.user_id.trim(),
                date_column(entry.scheduled_date),
                entry.title,
                entry.start_time.to_string(),
                i64::from(entry.duration_minutes),
                entry.color_tag,
            ],
        )?;
        Ok(entry.clone())
    }

    async fn delete_custom_entry(&self, user_id: &str, entry_id: &str) -> Result<(), PlannerError> {
        let connection = self.connect()?;
        connection.execute(
            "DELETE FROM custom_entries WHERE user_id = ?1 AND id = ?2",
            params![user_id.trim(), entry_id.trim()],
        )?;
        Ok(())
    }
}
