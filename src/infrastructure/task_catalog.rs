use crate::domain::models::{ClientSummary, Task, TaskPriority, TaskStatus};
use crate::infrastructure::error::PlannerError;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Read-only task lookups plus the single status write used by
/// "mark complete".
#[async_trait]
pub trait TaskCatalog: Send + Sync {
    async fn load_task_catalog(&self, user_id: &str) -> Result<Vec<Task>, PlannerError>;

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<(), PlannerError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTaskCatalog {
    tasks: Mutex<Vec<(String, Task)>>,
}

impl InMemoryTaskCatalog {
    pub fn with_tasks(user_id: &str, tasks: Vec<Task>) -> Self {
        let owned = tasks
            .into_iter()
            .map(|task| (user_id.trim().to_string(), task))
            .collect();
        Self {
            tasks: Mutex::new(owned),
        }
    }

    pub fn status_of(&self, task_id: &str) -> Result<Option<TaskStatus>, PlannerError> {
        let tasks = self.lock_tasks()?;
        Ok(tasks
            .iter()
            .find(|(_, task)| task.id == task_id)
            .map(|(_, task)| task.status))
    }

    fn lock_tasks(&self) -> Result<std::sync::MutexGuard<'_, Vec<(String, Task)>>, PlannerError> {
        self.tasks
            .lock()
            .map_err(|error| PlannerError::Persistence(format!("task catalog lock poisoned: {error}")))
    }
}

#[async_trait]
impl TaskCatalog for InMemoryTaskCatalog {
    async fn load_task_catalog(&self, user_id: &str) -> Result<Vec<Task>, PlannerError> {
        let user_id = user_id.trim();
        let tasks = self.lock_tasks()?;
        Ok(tasks
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, task)| task.clone())
            .collect())
    }

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<(), PlannerError> {
        let mut tasks = self.lock_tasks()?;
        let Some((_, task)) = tasks.iter_mut().find(|(_, task)| task.id == task_id.trim()) else {
            return Err(PlannerError::NotFound(format!("task {task_id}")));
        };
        task.status = status;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTaskCatalog {
    db_path: PathBuf,
}

impl SqliteTaskCatalog {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, PlannerError> {
        Connection::open(&self.db_path).map_err(PlannerError::from)
    }

    /// Replaces the stored copy of `tasks`, keeping their slice order as the
    /// catalog order.
    pub fn import_tasks(&self, user_id: &str, tasks: &[Task]) -> Result<usize, PlannerError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        for (position, task) in tasks.iter().enumerate() {
            task.validate().map_err(PlannerError::Validation)?;
            transaction.execute(
                "INSERT INTO tasks
                   (id, user_id, title, description, status, priority, due_date,
                    assignee_name, client_id, client_name, client_gradient, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                   user_id = excluded.user_id,
                   title = excluded.title,
                   description = excluded.description,
                   status = excluded.status,
                   priority = excluded.priority,
                   due_date = excluded.due_date,
                   assignee_name = excluded.assignee_name,
                   client_id = excluded.client_id,
                   client_name = excluded.client_name,
                   client_gradient = excluded.client_gradient,
                   position = excluded.position",
                params![
                    task.id.trim(),
                    user_id.trim(),
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.priority.map(priority_column),
                    task.due_date.map(|date| date.format("%Y-%m-%d").to_string()),
                    task.assignee_name,
                    task.client.as_ref().map(|client| client.id.clone()),
                    task.client.as_ref().map(|client| client.name.clone()),
                    task.client.as_ref().and_then(|client| client.gradient.clone()),
                    position as i64,
                ],
            )?;
        }
        transaction.commit()?;
        Ok(tasks.len())
    }
}

fn priority_column(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "high",
        TaskPriority::Medium => "medium",
        TaskPriority::Low => "low",
    }
}

struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: Option<String>,
    due_date: Option<String>,
    assignee_name: Option<String>,
    client_id: Option<String>,
    client_name: Option<String>,
    client_gradient: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Result<Task, PlannerError> {
        let status = TaskStatus::parse(&self.status).map_err(PlannerError::Persistence)?;
        let priority = self
            .priority
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(TaskPriority::parse)
            .transpose()
            .map_err(PlannerError::Persistence)?;
        let due_date = self
            .due_date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
            .transpose()
            .map_err(|error| PlannerError::Persistence(format!("invalid stored due_date: {error}")))?;
        let client = match (self.client_id, self.client_name) {
            (Some(id), Some(name)) => Some(ClientSummary {
                id,
                name,
                gradient: self.client_gradient,
            }),
            _ => None,
        };

        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            priority,
            due_date,
            assignee_name: self.assignee_name,
            client,
        })
    }
}

#[async_trait]
impl TaskCatalog for SqliteTaskCatalog {
    async fn load_task_catalog(&self, user_id: &str) -> Result<Vec<Task>, PlannerError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, title, description, status, priority, due_date,
                    assignee_name, client_id, client_name, client_gradient
             FROM tasks
             WHERE user_id = ?1
             ORDER BY position, rowid",
        )?;
        let rows = statement
            .query_map(params![user_id.trim()], |row| {
                Ok(TaskRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    status: row.get(3)?,
                    priority: row.get(4)?,
                    due_date: row.get(5)?,
                    assignee_name: row.get(6)?,
                    client_id: row.get(7)?,
                    client_name: row.get(8)?,
                    client_gradient: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<(), PlannerError> {
        let connection = self.connect()?;
        let updated = connection.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), task_id.trim()],
        )?;
        if updated == 0 {
            return Err(PlannerError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::initialize_database;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DB: AtomicUsize = AtomicUsize::new(0);

    struct TempDatabase {
        dir: PathBuf,
        path: PathBuf,
    }

    impl TempDatabase {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DB.fetch_add(1, Ordering::Relaxed);
            let dir = std::env::temp_dir().join(format!(
                "dayplan-catalog-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&dir).expect("create temp dir");
            let path = dir.join("planner.sqlite");
            initialize_database(&path).expect("initialize database");
            Self { dir, path }
        }
    }

    impl Drop for TempDatabase {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn sample_task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Some(TaskPriority::Medium),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            assignee_name: Some("Sam Rivera".to_string()),
            client: Some(ClientSummary {
                id: "client-1".to_string(),
                name: "Blue Harbor".to_string(),
                gradient: Some("from-sky-400 to-blue-600".to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn in_memory_catalog_filters_by_user() {
        let catalog = InMemoryTaskCatalog::with_tasks("user-1", vec![sample_task("t1", "Brief")]);
        assert_eq!(catalog.load_task_catalog("user-1").await.expect("load").len(), 1);
        assert!(catalog.load_task_catalog("user-2").await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn in_memory_set_status_reports_unknown_task() {
        let catalog = InMemoryTaskCatalog::with_tasks("user-1", vec![sample_task("t1", "Brief")]);
        catalog
            .set_task_status("t1", TaskStatus::Completed)
            .await
            .expect("set status");
        assert_eq!(catalog.status_of("t1").expect("status"), Some(TaskStatus::Completed));

        let missing = catalog.set_task_status("nope", TaskStatus::Completed).await;
        assert!(matches!(missing, Err(PlannerError::NotFound(_))));
    }

    #[tokio::test]
    async fn sqlite_catalog_preserves_import_order_and_lookups() {
        let database = TempDatabase::new();
        let catalog = SqliteTaskCatalog::new(&database.path);
        let tasks = vec![sample_task("t2", "Second"), sample_task("t1", "First")];
        catalog.import_tasks("user-1", &tasks).expect("import tasks");

        let loaded = catalog.load_task_catalog("user-1").await.expect("load catalog");
        assert_eq!(loaded, tasks);

        catalog
            .set_task_status("t1", TaskStatus::Completed)
            .await
            .expect("set status");
        let reloaded = catalog.load_task_catalog("user-1").await.expect("reload catalog");
        assert_eq!(reloaded[1].status, TaskStatus::Completed);

        let missing = catalog.set_task_status("t9", TaskStatus::Completed).await;
        assert!(matches!(missing, Err(PlannerError::NotFound(_))));
    }

    #[test]
    fn temp_database_is_removed_when_dropped() {
        let database = TempDatabase::new();
        let dir = database.dir.clone();
        assert!(database.path.exists());
        drop(database);
        assert!(!dir.exists());
    }
}
