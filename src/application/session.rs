use crate::application::drag_drop::{DragDropController, DragSource, DropTarget, PlanningCommand};
use crate::application::notifications::NotificationCenter;
use crate::application::planning_list::TaskPlanningListManager;
use crate::application::resize::{ResizeEngine, ResizeOutcome};
use crate::domain::duration::format_minutes;
use crate::domain::models::{EntryRef, ScheduledTask, TaskPlanningItem};
use crate::domain::sorting::AvailableSortKey;
use crate::domain::time_grid::{SlotView, TimeGrid, TimeSlot};
use crate::infrastructure::command_log::CommandLog;
use crate::infrastructure::error::PlannerError;
use crate::infrastructure::planning_store::PlanningStore;
use crate::infrastructure::task_catalog::TaskCatalog;
use chrono::NaiveDate;
use serde::Serialize;

/// At most one pointer gesture runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureLock {
    #[default]
    None,
    Drag,
    Resize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CapacityReadout {
    pub scheduled_count: usize,
    pub available_count: usize,
    pub scheduled_minutes: u64,
    pub scheduled_label: String,
}

/// Shared state for one planner view: the list manager, both gesture
/// machines, the notification queue and the command log.
///
/// Every gesture handler puts the machines back to idle before awaiting a
/// collaborator. A successful command reloads the day; a failed one is
/// logged, queued as a notification and returned.
pub struct PlannerSession<S, C>
where
    S: PlanningStore + ?Sized,
    C: TaskCatalog + ?Sized,
{
    manager: TaskPlanningListManager<S, C>,
    grid: TimeGrid,
    grid_entries: Vec<ScheduledTask>,
    drag: DragDropController,
    resize: ResizeEngine,
    gesture: GestureLock,
    notifications: NotificationCenter,
    command_log: CommandLog,
    default_sort: AvailableSortKey,
}

impl<S, C> PlannerSession<S, C>
where
    S: PlanningStore + ?Sized,
    C: TaskCatalog + ?Sized,
{
    pub fn new(manager: TaskPlanningListManager<S, C>, grid: TimeGrid) -> Self {
        let resize = ResizeEngine::new(grid.slot_pixel_height());
        Self {
            manager,
            grid,
            grid_entries: Vec::new(),
            drag: DragDropController::new(),
            resize,
            gesture: GestureLock::None,
            notifications: NotificationCenter::default(),
            command_log: CommandLog::disabled(),
            default_sort: AvailableSortKey::default(),
        }
    }

    pub fn with_command_log(mut self, command_log: CommandLog) -> Self {
        self.command_log = command_log;
        self
    }

    pub fn with_default_sort(mut self, default_sort: AvailableSortKey) -> Self {
        self.default_sort = default_sort;
        self
    }

    pub fn manager(&self) -> &TaskPlanningListManager<S, C> {
        &self.manager
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn grid_entries(&self) -> &[ScheduledTask] {
        &self.grid_entries
    }

    pub fn gesture(&self) -> GestureLock {
        self.gesture
    }

    pub fn drag_controller(&self) -> &DragDropController {
        &self.drag
    }

    pub fn resize_engine(&self) -> &ResizeEngine {
        &self.resize
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    pub fn available(&self) -> Vec<TaskPlanningItem> {
        self.manager.available(self.default_sort)
    }

    pub fn available_sorted(&self, key: AvailableSortKey) -> Vec<TaskPlanningItem> {
        self.manager.available(key)
    }

    pub fn scheduled(&self) -> Vec<TaskPlanningItem> {
        self.manager.scheduled()
    }

    /// Switches the view to `date`, abandoning any gesture in flight.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<(), PlannerError> {
        self.drag.on_drag_cancel();
        self.resize.cancel();
        self.gesture = GestureLock::None;

        let loaded = self.manager.load_for_date(date).await.map(|_| ());
        match loaded {
            Ok(()) => {
                self.grid_entries = self.manager.grid_entries();
                self.command_log.info("select_date", &format!("loaded {date}"));
                Ok(())
            }
            Err(error) => Err(self.report_failure("select_date", error)),
        }
    }

    pub fn start_drag(&mut self, source: DragSource) -> Result<(), PlannerError> {
        if self.gesture == GestureLock::Resize {
            return Err(self.reject_gesture("start_drag", "a resize is in progress"));
        }
        if let Err(error) = self.drag.on_drag_start(source) {
            self.command_log.warn("start_drag", &error.to_string());
            return Err(error);
        }
        self.gesture = GestureLock::Drag;
        Ok(())
    }

    /// Ends the drag and persists whatever it implies. Returns the command
    /// that was applied, `None` when the drop was a no-op.
    pub async fn finish_drag(
        &mut self,
        destination: Option<DropTarget>,
    ) -> Result<Option<PlanningCommand>, PlannerError> {
        let command = self.drag.on_drag_end(destination);
        if self.gesture == GestureLock::Drag {
            self.gesture = GestureLock::None;
        }
        let Some(command) = command else {
            return Ok(None);
        };
        self.dispatch(&command).await?;
        Ok(Some(command))
    }

    pub fn cancel_drag(&mut self) -> Option<DragSource> {
        if self.gesture == GestureLock::Drag {
            self.gesture = GestureLock::None;
        }
        self.drag.on_drag_cancel()
    }

    pub fn begin_resize(&mut self, entry: EntryRef, pointer_y: f64) -> Result<(), PlannerError> {
        if self.gesture == GestureLock::Drag {
            return Err(self.reject_gesture("begin_resize", "a drag is in progress"));
        }
        let Some(current) = self
            .grid_entries
            .iter()
            .find(|candidate| candidate.entry_ref() == entry)
        else {
            return Err(PlannerError::NotFound(format!(
                "grid entry {}",
                entry.id()
            )));
        };
        let current_duration = current.duration_minutes;
        if let Err(error) = self.resize.begin(entry, pointer_y, current_duration) {
            self.command_log.warn("begin_resize", &error.to_string());
            return Err(error);
        }
        self.gesture = GestureLock::Resize;
        Ok(())
    }

    pub fn resize_move(&mut self, pointer_y: f64) -> Option<u32> {
        self.resize.move_to(pointer_y)
    }

    pub async fn finish_resize(&mut self, pointer_y: f64) -> Result<ResizeOutcome, PlannerError> {
        let outcome = self.resize.end(pointer_y);
        if self.gesture == GestureLock::Resize {
            self.gesture = GestureLock::None;
        }
        if let ResizeOutcome::Committed { entry, minutes } = &outcome {
            let command = match entry {
                EntryRef::Task(task_id) => PlanningCommand::UpdateAllocation {
                    task_id: task_id.clone(),
                    minutes: *minutes,
                },
                EntryRef::Custom(entry_id) => PlanningCommand::ResizeCustom {
                    entry_id: entry_id.clone(),
                    minutes: *minutes,
                },
            };
            self.dispatch(&command).await?;
        }
        Ok(outcome)
    }

    pub fn cancel_resize(&mut self) -> Option<EntryRef> {
        if self.gesture == GestureLock::Resize {
            self.gesture = GestureLock::None;
        }
        self.resize.cancel()
    }

    pub async fn mark_complete(&mut self, task_id: &str) -> Result<(), PlannerError> {
        self.dispatch(&PlanningCommand::MarkComplete {
            task_id: task_id.to_string(),
        })
        .await?;
        self.notifications.info("Task completed", task_id);
        Ok(())
    }

    pub async fn add_custom_entry(
        &mut self,
        title: &str,
        color_tag: Option<String>,
        start_time: TimeSlot,
    ) -> Result<(), PlannerError> {
        self.dispatch(&PlanningCommand::CreateCustom {
            title: title.to_string(),
            color_tag,
            start_time,
        })
        .await
    }

    pub fn capacity_readout(&self) -> CapacityReadout {
        let scheduled_minutes = self.manager.total_allocated_minutes();
        let (available, scheduled): (Vec<_>, Vec<_>) = self
            .manager
            .items()
            .iter()
            .partition(|item| !item.is_scheduled);
        CapacityReadout {
            scheduled_count: scheduled.len(),
            available_count: available.len(),
            scheduled_minutes,
            scheduled_label: format_minutes(scheduled_minutes),
        }
    }

    pub fn slot_view(&self, label: TimeSlot) -> SlotView<'_> {
        self.grid.slot_view(label, &self.grid_entries)
    }

    /// Card height, following the live preview while the entry is resized.
    pub fn card_height_px(&self, entry: &ScheduledTask) -> f64 {
        let minutes = self
            .resize
            .preview_for(&entry.entry_ref())
            .unwrap_or(entry.duration_minutes);
        self.grid.card_height_px(minutes)
    }

    async fn dispatch(&mut self, command: &PlanningCommand) -> Result<(), PlannerError> {
        let name = command.name();
        if let Some(label) = command.target_slot() {
            if let Err(message) = self.grid.index_of(label) {
                return Err(self.report_failure(name, PlannerError::NotFound(message)));
            }
        }

        match self.manager.execute(command).await {
            Ok(()) => {
                self.command_log.info(name, &describe(command));
                self.refresh(name).await
            }
            Err(error) => Err(self.report_failure(name, error)),
        }
    }

    async fn refresh(&mut self, after: &str) -> Result<(), PlannerError> {
        let reloaded = self.manager.reload().await.map(|_| ());
        match reloaded {
            Ok(()) => {
                self.grid_entries = self.manager.grid_entries();
                Ok(())
            }
            Err(error) => Err(self.report_failure(&format!("{after}:reload"), error)),
        }
    }

    fn report_failure(&mut self, command: &str, error: PlannerError) -> PlannerError {
        let message = error.to_string();
        self.command_log.error(command, &message);
        self.notifications.error(&failure_title(command), &message);
        error
    }

    fn reject_gesture(&self, command: &str, reason: &str) -> PlannerError {
        self.command_log.warn(command, reason);
        PlannerError::GestureConflict(reason.to_string())
    }
}

fn failure_title(command: &str) -> String {
    let action = command.split(':').next().unwrap_or(command);
    format!("Could not {}", action.replace('_', " "))
}

fn describe(command: &PlanningCommand) -> String {
    serde_json::to_string(command).unwrap_or_else(|_| command.name().to_string())
}
