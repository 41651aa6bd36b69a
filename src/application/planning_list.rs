use crate::application::drag_drop::PlanningCommand;
use crate::domain::duration::{DEFAULT_ALLOCATED_MINUTES, normalize_duration, validate_duration};
use crate::domain::models::{
    CustomEntry, PlanningRecordDraft, ScheduledTask, ScheduledTaskType, Task, TaskPlanningItem,
    TaskPlanningRecord, TaskStatus,
};
use crate::domain::sorting::{AvailableSortKey, partition, sort_available, sort_scheduled};
use crate::domain::time_grid::TimeSlot;
use crate::infrastructure::error::PlannerError;
use crate::infrastructure::planning_store::PlanningStore;
use crate::infrastructure::task_catalog::TaskCatalog;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_CUSTOM_ENTRY_MINUTES: u32 = 30;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

/// The planning view of one user's tasks on one date.
///
/// Mutating operations only talk to the collaborators; the in-memory view
/// changes on the next successful `load_for_date`/`reload`. A failed write
/// therefore leaves the view as it was.
pub struct TaskPlanningListManager<S, C>
where
    S: PlanningStore + ?Sized,
    C: TaskCatalog + ?Sized,
{
    planning_store: Arc<S>,
    task_catalog: Arc<C>,
    user_id: String,
    date: NaiveDate,
    items: Vec<TaskPlanningItem>,
    custom_entries: Vec<CustomEntry>,
}

impl<S, C> TaskPlanningListManager<S, C>
where
    S: PlanningStore + ?Sized,
    C: TaskCatalog + ?Sized,
{
    pub fn new(
        planning_store: Arc<S>,
        task_catalog: Arc<C>,
        user_id: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            planning_store,
            task_catalog,
            user_id: user_id.into(),
            date,
            items: Vec::new(),
            custom_entries: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn items(&self) -> &[TaskPlanningItem] {
        &self.items
    }

    pub fn custom_entries(&self) -> &[CustomEntry] {
        &self.custom_entries
    }

    pub async fn load_for_date(
        &mut self,
        date: NaiveDate,
    ) -> Result<&[TaskPlanningItem], PlannerError> {
        let tasks = self.task_catalog.load_task_catalog(&self.user_id).await?;
        let records = self
            .planning_store
            .load_planning_records(&self.user_id, date)
            .await?;
        let custom_entries = self
            .planning_store
            .load_custom_entries(&self.user_id, date)
            .await?;

        self.items = join_items(tasks, &records);
        self.custom_entries = custom_entries;
        self.date = date;
        Ok(&self.items)
    }

    pub async fn reload(&mut self) -> Result<&[TaskPlanningItem], PlannerError> {
        self.load_for_date(self.date).await
    }

    pub fn available(&self, key: AvailableSortKey) -> Vec<TaskPlanningItem> {
        let (mut available, _) = partition(self.items.clone());
        sort_available(&mut available, key);
        available
    }

    pub fn scheduled(&self) -> Vec<TaskPlanningItem> {
        let (_, mut scheduled) = partition(self.items.clone());
        sort_scheduled(&mut scheduled);
        scheduled
    }

    /// Index the next scheduled task will receive.
    pub fn next_order_index(&self) -> i64 {
        self.items
            .iter()
            .filter(|item| item.is_scheduled)
            .map(|item| item.order_index)
            .max()
            .unwrap_or(-1)
            + 1
    }

    pub async fn schedule_task(
        &self,
        task_id: &str,
        start_time: Option<TimeSlot>,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        let item = self.find_item(task_id)?;
        let draft = PlanningRecordDraft {
            order_index: self.next_order_index(),
            is_scheduled: true,
            start_time,
            ..self.draft_from(item)
        };
        self.planning_store.upsert_planning_record(&draft).await
    }

    /// Changes only the start time; allocation and order are kept.
    pub async fn move_task(
        &self,
        task_id: &str,
        start_time: TimeSlot,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        let item = self.find_item(task_id)?;
        if !item.is_scheduled {
            return self.schedule_task(task_id, Some(start_time)).await;
        }
        let draft = PlanningRecordDraft {
            start_time: Some(start_time),
            ..self.draft_from(item)
        };
        self.planning_store.upsert_planning_record(&draft).await
    }

    pub async fn unschedule_task(&self, task_id: &str) -> Result<(), PlannerError> {
        self.planning_store
            .delete_planning_record(&self.user_id, task_id, self.date)
            .await
    }

    /// Rewrites the moved record's index only; siblings are untouched.
    pub async fn update_order(
        &self,
        task_id: &str,
        new_index: i64,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        if new_index < 0 {
            return Err(PlannerError::Validation(format!(
                "order index must be >= 0, got {new_index}"
            )));
        }
        let item = self.find_item(task_id)?;
        let draft = PlanningRecordDraft {
            order_index: new_index,
            ..self.draft_from(item)
        };
        self.planning_store.upsert_planning_record(&draft).await
    }

    /// Stores `minutes` as given. Clamping is the resize engine's job.
    pub async fn update_allocation(
        &self,
        task_id: &str,
        minutes: u32,
    ) -> Result<TaskPlanningRecord, PlannerError> {
        let item = self.find_item(task_id)?;
        let draft = PlanningRecordDraft {
            allocated_minutes: minutes,
            ..self.draft_from(item)
        };
        self.planning_store.upsert_planning_record(&draft).await
    }

    /// Widened to `u64`: allocations are stored unclamped.
    pub fn total_allocated_minutes(&self) -> u64 {
        self.items
            .iter()
            .filter(|item| item.is_scheduled)
            .map(|item| u64::from(item.allocated_minutes))
            .sum()
    }

    pub async fn mark_complete(&self, task_id: &str) -> Result<(), PlannerError> {
        self.find_item(task_id)?;
        self.task_catalog
            .set_task_status(task_id, TaskStatus::Completed)
            .await
    }

    pub async fn add_custom_entry(
        &self,
        title: &str,
        color_tag: Option<String>,
        start_time: TimeSlot,
        duration_minutes: u32,
    ) -> Result<CustomEntry, PlannerError> {
        let entry = CustomEntry {
            id: next_id("custom"),
            user_id: self.user_id.clone(),
            scheduled_date: self.date,
            title: title.trim().to_string(),
            start_time,
            duration_minutes,
            color_tag,
        };
        entry.validate().map_err(PlannerError::Validation)?;
        self.planning_store.upsert_custom_entry(&entry).await
    }

    pub async fn move_custom_entry(
        &self,
        entry_id: &str,
        start_time: TimeSlot,
    ) -> Result<CustomEntry, PlannerError> {
        let entry = CustomEntry {
            start_time,
            ..self.find_custom_entry(entry_id)?.clone()
        };
        self.planning_store.upsert_custom_entry(&entry).await
    }

    pub async fn resize_custom_entry(
        &self,
        entry_id: &str,
        minutes: u32,
    ) -> Result<CustomEntry, PlannerError> {
        validate_duration(minutes, "custom_entry.duration_minutes")
            .map_err(PlannerError::Validation)?;
        let entry = CustomEntry {
            duration_minutes: minutes,
            ..self.find_custom_entry(entry_id)?.clone()
        };
        self.planning_store.upsert_custom_entry(&entry).await
    }

    pub async fn remove_custom_entry(&self, entry_id: &str) -> Result<(), PlannerError> {
        self.planning_store
            .delete_custom_entry(&self.user_id, entry_id)
            .await
    }

    /// Everything the grid renders, in start-time order. Scheduled tasks
    /// without a start time stay off the grid.
    pub fn grid_entries(&self) -> Vec<ScheduledTask> {
        let mut entries = self
            .scheduled()
            .into_iter()
            .filter_map(|item| {
                let start_time = item.start_time?;
                Some(ScheduledTask {
                    id: item.task_id,
                    task_type: ScheduledTaskType::Task,
                    title: item.title,
                    start_time,
                    duration_minutes: normalize_duration(item.allocated_minutes),
                    color_tag: None,
                })
            })
            .chain(self.custom_entries.iter().map(ScheduledTask::from))
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.start_time);
        entries
    }

    pub async fn execute(&self, command: &PlanningCommand) -> Result<(), PlannerError> {
        match command {
            PlanningCommand::Schedule {
                task_id,
                start_time,
            } => self.schedule_task(task_id, *start_time).await.map(|_| ()),
            PlanningCommand::Move {
                task_id,
                start_time,
            } => self.move_task(task_id, *start_time).await.map(|_| ()),
            PlanningCommand::Unschedule { task_id } => self.unschedule_task(task_id).await,
            PlanningCommand::UpdateOrder { task_id, index } => {
                self.update_order(task_id, *index).await.map(|_| ())
            }
            PlanningCommand::UpdateAllocation { task_id, minutes } => {
                self.update_allocation(task_id, *minutes).await.map(|_| ())
            }
            PlanningCommand::CreateCustom {
                title,
                color_tag,
                start_time,
            } => self
                .add_custom_entry(
                    title,
                    color_tag.clone(),
                    *start_time,
                    DEFAULT_CUSTOM_ENTRY_MINUTES,
                )
                .await
                .map(|_| ()),
            PlanningCommand::MoveCustom {
                entry_id,
                start_time,
            } => self
                .move_custom_entry(entry_id, *start_time)
                .await
                .map(|_| ()),
            PlanningCommand::ResizeCustom { entry_id, minutes } => self
                .resize_custom_entry(entry_id, *minutes)
                .await
                .map(|_| ()),
            PlanningCommand::RemoveCustom { entry_id } => self.remove_custom_entry(entry_id).await,
            PlanningCommand::MarkComplete { task_id } => self.mark_complete(task_id).await,
        }
    }

    fn find_item(&self, task_id: &str) -> Result<&TaskPlanningItem, PlannerError> {
        let task_id = task_id.trim();
        self.items
            .iter()
            .find(|item| item.task_id == task_id)
            .ok_or_else(|| PlannerError::NotFound(format!("task {task_id}")))
    }

    fn find_custom_entry(&self, entry_id: &str) -> Result<&CustomEntry, PlannerError> {
        let entry_id = entry_id.trim();
        self.custom_entries
            .iter()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| PlannerError::NotFound(format!("custom entry {entry_id}")))
    }

    fn draft_from(&self, item: &TaskPlanningItem) -> PlanningRecordDraft {
        PlanningRecordDraft {
            user_id: self.user_id.clone(),
            task_id: item.task_id.clone(),
            scheduled_date: self.date,
            allocated_minutes: item.allocated_minutes,
            order_index: item.order_index,
            is_scheduled: item.is_scheduled,
            start_time: item.start_time,
        }
    }
}

/// Joins the catalog with the day's records. Records for tasks missing from
/// the catalog are dropped.
fn join_items(tasks: Vec<Task>, records: &[TaskPlanningRecord]) -> Vec<TaskPlanningItem> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(position, task)| {
            let record = records.iter().find(|record| record.task_id == task.id);
            let client_initials = task.client.as_ref().map(|client| client.initials());
            let (client_name, client_gradient) = match task.client {
                Some(client) => (Some(client.name), client.gradient),
                None => (None, None),
            };
            TaskPlanningItem {
                task_id: task.id,
                title: task.title,
                description: task.description,
                status: task.status,
                priority: task.priority,
                due_date: task.due_date,
                assignee_name: task.assignee_name,
                client_name,
                client_gradient,
                client_initials,
                allocated_minutes: record
                    .map_or(DEFAULT_ALLOCATED_MINUTES, |record| record.allocated_minutes),
                order_index: record.map_or(position as i64, |record| record.order_index),
                is_scheduled: record.is_some_and(|record| record.is_scheduled),
                start_time: record.and_then(|record| record.start_time),
                has_record: record.is_some(),
                catalog_position: position,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ClientSummary, TaskPriority, parse_date};
    use crate::infrastructure::planning_store::InMemoryPlanningStore;
    use crate::infrastructure::task_catalog::InMemoryTaskCatalog;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    const USER: &str = "user-1";

    fn day() -> NaiveDate {
        parse_date("2024-03-04").expect("valid date")
    }

    fn slot(value: &str) -> TimeSlot {
        TimeSlot::parse(value).expect("valid slot")
    }

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            status: TaskStatus::Todo,
            priority: Some(TaskPriority::Medium),
            due_date: None,
            assignee_name: None,
            client: None,
        }
    }

    fn record(task_id: &str, order_index: i64, is_scheduled: bool) -> TaskPlanningRecord {
        TaskPlanningRecord {
            user_id: USER.to_string(),
            task_id: task_id.to_string(),
            scheduled_date: day(),
            allocated_minutes: 60,
            order_index,
            is_scheduled,
            start_time: None,
        }
    }

    type Manager = TaskPlanningListManager<InMemoryPlanningStore, InMemoryTaskCatalog>;

    async fn manager_with(
        tasks: Vec<Task>,
        records: Vec<TaskPlanningRecord>,
    ) -> (Manager, Arc<InMemoryPlanningStore>, Arc<InMemoryTaskCatalog>) {
        let store = Arc::new(InMemoryPlanningStore::with_records(records));
        let catalog = Arc::new(InMemoryTaskCatalog::with_tasks(USER, tasks));
        let mut manager =
            TaskPlanningListManager::new(Arc::clone(&store), Arc::clone(&catalog), USER, day());
        manager.load_for_date(day()).await.expect("load");
        (manager, store, catalog)
    }

    #[derive(Debug, Default)]
    struct RejectingPlanningStore {
        upsert_calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanningStore for RejectingPlanningStore {
        async fn load_planning_records(
            &self,
            _user_id: &str,
            _date: NaiveDate,
        ) -> Result<Vec<TaskPlanningRecord>, PlannerError> {
            Ok(Vec::new())
        }

        async fn upsert_planning_record(
            &self,
            _draft: &PlanningRecordDraft,
        ) -> Result<TaskPlanningRecord, PlannerError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            Err(PlannerError::Persistence("backend unavailable".to_string()))
        }

        async fn delete_planning_record(
            &self,
            _user_id: &str,
            _task_id: &str,
            _date: NaiveDate,
        ) -> Result<(), PlannerError> {
            Err(PlannerError::Persistence("backend unavailable".to_string()))
        }

        async fn load_custom_entries(
            &self,
            _user_id: &str,
            _date: NaiveDate,
        ) -> Result<Vec<CustomEntry>, PlannerError> {
            Ok(Vec::new())
        }

        async fn upsert_custom_entry(
            &self,
            _entry: &CustomEntry,
        ) -> Result<CustomEntry, PlannerError> {
            Err(PlannerError::Persistence("backend unavailable".to_string()))
        }

        async fn delete_custom_entry(
            &self,
            _user_id: &str,
            _entry_id: &str,
        ) -> Result<(), PlannerError> {
            Err(PlannerError::Persistence("backend unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn load_applies_defaults_for_tasks_without_records() {
        let mut client_task = task("b");
        client_task.client = Some(ClientSummary {
            id: "c1".to_string(),
            name: "Blue Harbor".to_string(),
            gradient: Some("from-sky-400".to_string()),
        });
        let mut scheduled = record("c", 7, true);
        scheduled.allocated_minutes = 90;
        let (manager, _, _) =
            manager_with(vec![task("a"), client_task, task("c")], vec![scheduled]).await;

        let items = manager.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].allocated_minutes, DEFAULT_ALLOCATED_MINUTES);
        assert_eq!(items[1].order_index, 1);
        assert!(!items[1].is_scheduled && !items[1].has_record);
        assert_eq!(items[1].client_initials.as_deref(), Some("BH"));
        assert_eq!(items[2].order_index, 7);
        assert!(items[2].is_scheduled);
        assert_eq!(manager.total_allocated_minutes(), 90);
    }

    // Feature: dayplan, Property 2: scheduling appends after the highest scheduled index
    #[tokio::test]
    async fn property2_schedule_uses_next_order_index() {
        let (manager, store, _) = manager_with(
            vec![task("a"), task("b"), task("c"), task("d")],
            vec![record("a", 0, true), record("b", 1, true), record("c", 2, true)],
        )
        .await;

        let created = manager
            .schedule_task("d", Some(slot("10:00")))
            .await
            .expect("schedule");
        assert_eq!(created.order_index, 3);
        assert!(created.is_scheduled);
        assert_eq!(created.start_time, Some(slot("10:00")));
        assert_eq!(store.records_snapshot().expect("snapshot").len(), 4);

        let (empty_manager, _, _) = manager_with(vec![task("a")], Vec::new()).await;
        let first = empty_manager.schedule_task("a", None).await.expect("schedule");
        assert_eq!(first.order_index, 0);
        assert_eq!(first.allocated_minutes, DEFAULT_ALLOCATED_MINUTES);
    }

    #[tokio::test]
    async fn schedule_unknown_task_is_not_found() {
        let (manager, store, _) = manager_with(vec![task("a")], Vec::new()).await;
        let result = manager.schedule_task("missing", None).await;
        assert!(matches!(result, Err(PlannerError::NotFound(_))));
        assert!(store.records_snapshot().expect("snapshot").is_empty());
    }

    // Feature: dayplan, Property 5: unschedule returns a task to the available bucket
    #[tokio::test]
    async fn property5_unschedule_roundtrip() {
        let (mut manager, store, _) = manager_with(vec![task("a"), task("b")], Vec::new()).await;

        manager.schedule_task("a", Some(slot("09:00"))).await.expect("schedule");
        manager.reload().await.expect("reload");
        assert_eq!(manager.scheduled().len(), 1);
        assert_eq!(manager.grid_entries().len(), 1);

        manager.unschedule_task("a").await.expect("unschedule");
        manager.reload().await.expect("reload");
        let available = manager.available(AvailableSortKey::Order);
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].task_id, "a");
        assert!(!available[0].has_record);
        assert!(manager.scheduled().is_empty());
        assert!(store.records_snapshot().expect("snapshot").is_empty());

        manager.unschedule_task("a").await.expect("second unschedule is a no-op");
    }

    #[tokio::test]
    async fn move_keeps_allocation_and_order() {
        let mut placed = record("a", 4, true);
        placed.allocated_minutes = 45;
        placed.start_time = Some(slot("09:00"));
        let (manager, _, _) = manager_with(vec![task("a")], vec![placed]).await;

        let moved = manager.move_task("a", slot("14:15")).await.expect("move");
        assert_eq!(moved.start_time, Some(slot("14:15")));
        assert_eq!(moved.allocated_minutes, 45);
        assert_eq!(moved.order_index, 4);
    }

    // Feature: dayplan, Property 8: reorder writes one record and ties keep catalog order
    #[tokio::test]
    async fn property8_update_order_leaves_siblings_and_breaks_ties_by_catalog() {
        let (mut manager, store, _) = manager_with(
            vec![task("a"), task("b"), task("c")],
            vec![record("a", 0, true), record("b", 1, true), record("c", 2, true)],
        )
        .await;

        manager.update_order("c", 1).await.expect("reorder");
        manager.reload().await.expect("reload");

        let order = manager
            .scheduled()
            .into_iter()
            .map(|item| (item.task_id, item.order_index))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 1)
            ]
        );
        let untouched = store
            .records_snapshot()
            .expect("snapshot")
            .into_iter()
            .find(|record| record.task_id == "b")
            .expect("record b");
        assert_eq!(untouched.order_index, 1);

        let negative = manager.update_order("a", -1).await;
        assert!(matches!(negative, Err(PlannerError::Validation(_))));
    }

    #[tokio::test]
    async fn upward_move_into_occupied_index_lands_after_earlier_catalog_entry() {
        let (mut manager, _, _) = manager_with(
            vec![task("a"), task("b"), task("c")],
            vec![record("a", 0, true), record("b", 1, true), record("c", 2, true)],
        )
        .await;

        manager.update_order("c", 0).await.expect("reorder");
        manager.reload().await.expect("reload");

        let order = manager
            .scheduled()
            .into_iter()
            .map(|item| item.task_id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn update_allocation_stores_value_unclamped() {
        let (manager, _, _) = manager_with(vec![task("a")], vec![record("a", 0, true)]).await;
        let updated = manager.update_allocation("a", 600).await.expect("allocate");
        assert_eq!(updated.allocated_minutes, 600);
    }

    #[tokio::test]
    async fn total_allocated_minutes_does_not_overflow_on_huge_allocations() {
        let (mut manager, _, _) = manager_with(
            vec![task("a"), task("b")],
            vec![record("a", 0, true), record("b", 1, true)],
        )
        .await;
        manager.update_allocation("a", u32::MAX).await.expect("allocate");
        manager.reload().await.expect("reload");

        assert_eq!(manager.total_allocated_minutes(), u64::from(u32::MAX) + 60);
    }

    #[tokio::test]
    async fn grid_entries_merge_tasks_and_custom_entries_by_start() {
        let mut late = record("a", 0, true);
        late.start_time = Some(slot("15:00"));
        late.allocated_minutes = 50;
        let unplaced = record("b", 1, true);
        let (mut manager, _, _) = manager_with(vec![task("a"), task("b")], vec![late, unplaced]).await;

        let entry = manager
            .add_custom_entry("Standup", Some("amber".to_string()), slot("09:30"), 15)
            .await
            .expect("custom entry");
        manager.reload().await.expect("reload");

        let grid = manager.grid_entries();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].id, entry.id);
        assert_eq!(grid[0].task_type, ScheduledTaskType::Custom);
        assert_eq!(grid[1].id, "a");
        assert_eq!(grid[1].duration_minutes, 45);
    }

    #[tokio::test]
    async fn custom_entry_lifecycle() {
        let (mut manager, store, _) = manager_with(vec![task("a")], Vec::new()).await;
        let entry = manager
            .add_custom_entry("Lunch", None, slot("12:00"), 60)
            .await
            .expect("add");
        manager.reload().await.expect("reload");

        manager
            .move_custom_entry(&entry.id, slot("12:30"))
            .await
            .expect("move");
        manager.reload().await.expect("reload");
        manager
            .resize_custom_entry(&entry.id, 45)
            .await
            .expect("resize");
        manager.reload().await.expect("reload");

        let stored = &manager.custom_entries()[0];
        assert_eq!(stored.start_time, slot("12:30"));
        assert_eq!(stored.duration_minutes, 45);

        let invalid = manager.resize_custom_entry(&entry.id, 50).await;
        assert!(matches!(invalid, Err(PlannerError::Validation(_))));
        let missing = manager.move_custom_entry("nope", slot("08:00")).await;
        assert!(matches!(missing, Err(PlannerError::NotFound(_))));

        manager.remove_custom_entry(&entry.id).await.expect("remove");
        assert!(store.custom_entries_snapshot().expect("snapshot").is_empty());
    }

    #[tokio::test]
    async fn add_custom_entry_rejects_empty_title() {
        let (manager, _, _) = manager_with(vec![task("a")], Vec::new()).await;
        let result = manager.add_custom_entry("  ", None, slot("08:00"), 30).await;
        assert!(matches!(result, Err(PlannerError::Validation(_))));
    }

    #[tokio::test]
    async fn mark_complete_updates_catalog_and_keeps_record() {
        let (mut manager, store, catalog) =
            manager_with(vec![task("a")], vec![record("a", 0, true)]).await;
        manager.mark_complete("a").await.expect("complete");
        manager.reload().await.expect("reload");

        assert_eq!(catalog.status_of("a").expect("status"), Some(TaskStatus::Completed));
        assert_eq!(manager.items()[0].status, TaskStatus::Completed);
        assert_eq!(store.records_snapshot().expect("snapshot").len(), 1);
    }

    #[tokio::test]
    async fn rejected_write_leaves_view_stale() {
        let store = Arc::new(RejectingPlanningStore::default());
        let catalog = Arc::new(InMemoryTaskCatalog::with_tasks(USER, vec![task("a")]));
        let mut manager =
            TaskPlanningListManager::new(Arc::clone(&store), catalog, USER, day());
        manager.load_for_date(day()).await.expect("load");
        let before = manager.items().to_vec();

        let result = manager.schedule_task("a", Some(slot("09:00"))).await;
        assert!(result.as_ref().is_err_and(PlannerError::is_persistence));
        assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 1);
        assert_eq!(manager.items(), before.as_slice());
    }

    #[tokio::test]
    async fn execute_dispatches_commands() {
        let (mut manager, _, _) = manager_with(vec![task("a"), task("b")], Vec::new()).await;
        manager
            .execute(&PlanningCommand::Schedule {
                task_id: "b".to_string(),
                start_time: None,
            })
            .await
            .expect("schedule");
        manager
            .execute(&PlanningCommand::CreateCustom {
                title: "Focus".to_string(),
                color_tag: None,
                start_time: slot("08:00"),
            })
            .await
            .expect("create custom");
        manager.reload().await.expect("reload");

        assert_eq!(manager.scheduled()[0].task_id, "b");
        assert_eq!(
            manager.custom_entries()[0].duration_minutes,
            DEFAULT_CUSTOM_ENTRY_MINUTES
        );
    }

    // Feature: dayplan, Property 2: scheduling appends after the highest scheduled index
    proptest! {
        #[test]
        fn property2_next_order_index_exceeds_every_scheduled_index(
            indices in proptest::collection::vec(0i64..1_000, 0..20)
        ) {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            let tasks = (0..=indices.len()).map(|n| task(&format!("t{n}"))).collect::<Vec<_>>();
            let records = indices
                .iter()
                .enumerate()
                .map(|(n, index)| record(&format!("t{n}"), *index, true))
                .collect::<Vec<_>>();
            let expected = indices.iter().copied().max().map_or(0, |max| max + 1);

            let (manager, _, _) = runtime.block_on(manager_with(tasks, records));
            let created = runtime
                .block_on(manager.schedule_task(&format!("t{}", indices.len()), None))
                .expect("schedule");

            prop_assert_eq!(created.order_index, expected);
        }
    }
}
