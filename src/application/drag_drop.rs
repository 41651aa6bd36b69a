use crate::domain::models::EntryRef;
use crate::domain::time_grid::TimeSlot;
use crate::infrastructure::error::PlannerError;
use serde::{Deserialize, Serialize};

const TASK_POOL_ID: &str = "task-pool";
const AVAILABLE_LIST_ID: &str = "available";
const SCHEDULED_LIST_ID: &str = "scheduled";
const SLOT_ID_PREFIX: &str = "slot-";

/// Every place a draggable can come from or land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum DropContainer {
    TaskPool,
    TimeSlot(TimeSlot),
    AvailableList,
    ScheduledList,
}

impl DropContainer {
    /// Stable droppable id, e.g. `task-pool` or `slot-09:15`.
    pub fn droppable_id(&self) -> String {
        match self {
            Self::TaskPool => TASK_POOL_ID.to_string(),
            Self::TimeSlot(label) => format!("{SLOT_ID_PREFIX}{label}"),
            Self::AvailableList => AVAILABLE_LIST_ID.to_string(),
            Self::ScheduledList => SCHEDULED_LIST_ID.to_string(),
        }
    }

    pub fn parse(droppable_id: &str) -> Result<Self, String> {
        match droppable_id.trim() {
            TASK_POOL_ID => Ok(Self::TaskPool),
            AVAILABLE_LIST_ID => Ok(Self::AvailableList),
            SCHEDULED_LIST_ID => Ok(Self::ScheduledList),
            other => match other.strip_prefix(SLOT_ID_PREFIX) {
                Some(label) => TimeSlot::parse(label).map(Self::TimeSlot),
                None => Err(format!("unknown droppable id: {other}")),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragItem {
    Entry(EntryRef),
    /// A palette item that becomes a new custom entry when dropped on a slot.
    CustomTemplate {
        title: String,
        color_tag: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSource {
    pub item: DragItem,
    pub container: DropContainer,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub container: DropContainer,
    pub index: usize,
}

/// The single persistence intent a completed gesture produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlanningCommand {
    Schedule {
        task_id: String,
        start_time: Option<TimeSlot>,
    },
    Move {
        task_id: String,
        start_time: TimeSlot,
    },
    Unschedule {
        task_id: String,
    },
    UpdateOrder {
        task_id: String,
        index: i64,
    },
    UpdateAllocation {
        task_id: String,
        minutes: u32,
    },
    CreateCustom {
        title: String,
        color_tag: Option<String>,
        start_time: TimeSlot,
    },
    MoveCustom {
        entry_id: String,
        start_time: TimeSlot,
    },
    ResizeCustom {
        entry_id: String,
        minutes: u32,
    },
    RemoveCustom {
        entry_id: String,
    },
    MarkComplete {
        task_id: String,
    },
}

impl PlanningCommand {
    /// Name used in the command log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Schedule { .. } => "schedule_task",
            Self::Move { .. } => "move_task",
            Self::Unschedule { .. } => "unschedule_task",
            Self::UpdateOrder { .. } => "update_order",
            Self::UpdateAllocation { .. } => "update_allocation",
            Self::CreateCustom { .. } => "add_custom_entry",
            Self::MoveCustom { .. } => "move_custom_entry",
            Self::ResizeCustom { .. } => "resize_custom_entry",
            Self::RemoveCustom { .. } => "remove_custom_entry",
            Self::MarkComplete { .. } => "mark_complete",
        }
    }

    pub fn target_slot(&self) -> Option<TimeSlot> {
        match self {
            Self::Schedule { start_time, .. } => *start_time,
            Self::Move { start_time, .. }
            | Self::CreateCustom { start_time, .. }
            | Self::MoveCustom { start_time, .. } => Some(*start_time),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSource),
}

#[derive(Debug, Clone, Default)]
pub struct DragDropController {
    state: DragState,
}

impl DragDropController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn on_drag_start(&mut self, source: DragSource) -> Result<(), PlannerError> {
        if let DragState::Dragging(active) = &self.state {
            return Err(PlannerError::GestureConflict(format!(
                "a drag from {} is already in progress",
                active.container.droppable_id()
            )));
        }
        self.state = DragState::Dragging(source);
        Ok(())
    }

    /// Always returns to idle. `None` destination means the item was
    /// released outside every container.
    pub fn on_drag_end(&mut self, destination: Option<DropTarget>) -> Option<PlanningCommand> {
        let DragState::Dragging(source) = std::mem::take(&mut self.state) else {
            return None;
        };
        destination.and_then(|target| command_for_drop(&source, target))
    }

    pub fn on_drag_cancel(&mut self) -> Option<DragSource> {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(source) => Some(source),
            DragState::Idle => None,
        }
    }
}

/// Maps a completed drop to the command it implies, if any.
pub fn command_for_drop(source: &DragSource, target: DropTarget) -> Option<PlanningCommand> {
    match (&source.item, target.container) {
        (DragItem::Entry(EntryRef::Task(task_id)), DropContainer::TimeSlot(label)) => {
            match source.container {
                DropContainer::TimeSlot(from) if from == label => None,
                DropContainer::TimeSlot(_) | DropContainer::ScheduledList => {
                    Some(PlanningCommand::Move {
                        task_id: task_id.clone(),
                        start_time: label,
                    })
                }
                DropContainer::TaskPool | DropContainer::AvailableList => {
                    Some(PlanningCommand::Schedule {
                        task_id: task_id.clone(),
                        start_time: Some(label),
                    })
                }
            }
        }
        (DragItem::Entry(EntryRef::Custom(entry_id)), DropContainer::TimeSlot(label)) => {
            if source.container == DropContainer::TimeSlot(label) {
                return None;
            }
            Some(PlanningCommand::MoveCustom {
                entry_id: entry_id.clone(),
                start_time: label,
            })
        }
        (DragItem::CustomTemplate { title, color_tag }, DropContainer::TimeSlot(label)) => {
            Some(PlanningCommand::CreateCustom {
                title: title.clone(),
                color_tag: color_tag.clone(),
                start_time: label,
            })
        }
        (DragItem::Entry(EntryRef::Task(task_id)), DropContainer::TaskPool) => {
            Some(PlanningCommand::Unschedule {
                task_id: task_id.clone(),
            })
        }
        (DragItem::Entry(EntryRef::Custom(entry_id)), DropContainer::TaskPool) => {
            Some(PlanningCommand::RemoveCustom {
                entry_id: entry_id.clone(),
            })
        }
        (
            DragItem::Entry(EntryRef::Task(task_id)),
            list @ (DropContainer::AvailableList | DropContainer::ScheduledList),
        ) => {
            list_drop(task_id, source, list, target.index)
        }
        _ => None,
    }
}

fn list_drop(
    task_id: &str,
    source: &DragSource,
    list: DropContainer,
    index: usize,
) -> Option<PlanningCommand> {
    if source.container == list {
        if source.index == index {
            return None;
        }
        return Some(PlanningCommand::UpdateOrder {
            task_id: task_id.to_string(),
            index: i64::try_from(index).unwrap_or(i64::MAX),
        });
    }
    match (source.container, list) {
        (DropContainer::AvailableList | DropContainer::TaskPool, DropContainer::ScheduledList) => {
            Some(PlanningCommand::Schedule {
                task_id: task_id.to_string(),
                start_time: None,
            })
        }
        (
            DropContainer::ScheduledList | DropContainer::TimeSlot(_),
            DropContainer::AvailableList,
        ) => Some(PlanningCommand::Unschedule {
            task_id: task_id.to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(value: &str) -> TimeSlot {
        TimeSlot::parse(value).expect("valid slot")
    }

    fn task_source(task_id: &str, container: DropContainer, index: usize) -> DragSource {
        DragSource {
            item: DragItem::Entry(EntryRef::Task(task_id.to_string())),
            container,
            index,
        }
    }

    fn drop_on(container: DropContainer, index: usize) -> Option<DropTarget> {
        Some(DropTarget { container, index })
    }

    fn run(source: DragSource, target: Option<DropTarget>) -> Option<PlanningCommand> {
        let mut controller = DragDropController::new();
        controller.on_drag_start(source).expect("start drag");
        let command = controller.on_drag_end(target);
        assert!(!controller.is_active());
        command
    }

    #[test]
    fn droppable_ids_roundtrip() {
        for container in [
            DropContainer::TaskPool,
            DropContainer::TimeSlot(slot("09:15")),
            DropContainer::AvailableList,
            DropContainer::ScheduledList,
        ] {
            assert_eq!(DropContainer::parse(&container.droppable_id()), Ok(container));
        }
        assert_eq!(DropContainer::TimeSlot(slot("09:15")).droppable_id(), "slot-09:15");
        assert!(DropContainer::parse("slot-9:15").is_err());
        assert!(DropContainer::parse("slot-+9:15").is_err());
        assert!(DropContainer::parse("sidebar").is_err());
    }

    #[test]
    fn pool_to_slot_schedules_with_start_time() {
        let command = run(
            task_source("t1", DropContainer::TaskPool, 0),
            drop_on(DropContainer::TimeSlot(slot("10:00")), 0),
        );
        assert_eq!(
            command,
            Some(PlanningCommand::Schedule {
                task_id: "t1".to_string(),
                start_time: Some(slot("10:00")),
            })
        );
    }

    #[test]
    fn slot_to_slot_moves_and_same_slot_is_noop() {
        let from = DropContainer::TimeSlot(slot("09:00"));
        let moved = run(
            task_source("t1", from, 0),
            drop_on(DropContainer::TimeSlot(slot("13:30")), 0),
        );
        assert_eq!(
            moved,
            Some(PlanningCommand::Move {
                task_id: "t1".to_string(),
                start_time: slot("13:30"),
            })
        );
        assert_eq!(run(task_source("t1", from, 0), drop_on(from, 0)), None);
    }

    #[test]
    fn drop_on_pool_unschedules_tasks_and_removes_custom_entries() {
        let unscheduled = run(
            task_source("t1", DropContainer::TimeSlot(slot("09:00")), 0),
            drop_on(DropContainer::TaskPool, 3),
        );
        assert_eq!(
            unscheduled,
            Some(PlanningCommand::Unschedule {
                task_id: "t1".to_string()
            })
        );

        let removed = run(
            DragSource {
                item: DragItem::Entry(EntryRef::Custom("c1".to_string())),
                container: DropContainer::TimeSlot(slot("12:00")),
                index: 0,
            },
            drop_on(DropContainer::TaskPool, 0),
        );
        assert_eq!(
            removed,
            Some(PlanningCommand::RemoveCustom {
                entry_id: "c1".to_string()
            })
        );
    }

    #[test]
    fn drop_on_pool_unschedules_from_any_source() {
        for container in [
            DropContainer::TaskPool,
            DropContainer::AvailableList,
            DropContainer::ScheduledList,
        ] {
            assert_eq!(
                run(task_source("t1", container, 1), drop_on(DropContainer::TaskPool, 0)),
                Some(PlanningCommand::Unschedule {
                    task_id: "t1".to_string()
                })
            );
        }
    }

    #[test]
    fn template_drop_creates_custom_entry_only_on_slots() {
        let template = DragSource {
            item: DragItem::CustomTemplate {
                title: "Lunch".to_string(),
                color_tag: Some("green".to_string()),
            },
            container: DropContainer::TaskPool,
            index: 0,
        };
        assert_eq!(
            run(template.clone(), drop_on(DropContainer::TimeSlot(slot("12:00")), 0)),
            Some(PlanningCommand::CreateCustom {
                title: "Lunch".to_string(),
                color_tag: Some("green".to_string()),
                start_time: slot("12:00"),
            })
        );
        assert_eq!(run(template, drop_on(DropContainer::TaskPool, 0)), None);
    }

    #[test]
    fn list_drops_reorder_or_move_between_buckets() {
        assert_eq!(
            run(
                task_source("t1", DropContainer::ScheduledList, 2),
                drop_on(DropContainer::ScheduledList, 0)
            ),
            Some(PlanningCommand::UpdateOrder {
                task_id: "t1".to_string(),
                index: 0
            })
        );
        assert_eq!(
            run(
                task_source("t1", DropContainer::ScheduledList, 2),
                drop_on(DropContainer::ScheduledList, 2)
            ),
            None
        );
        assert_eq!(
            run(
                task_source("t1", DropContainer::AvailableList, 0),
                drop_on(DropContainer::ScheduledList, 1)
            ),
            Some(PlanningCommand::Schedule {
                task_id: "t1".to_string(),
                start_time: None
            })
        );
        assert_eq!(
            run(
                task_source("t1", DropContainer::ScheduledList, 0),
                drop_on(DropContainer::AvailableList, 4)
            ),
            Some(PlanningCommand::Unschedule {
                task_id: "t1".to_string()
            })
        );
    }

    #[test]
    fn release_outside_and_cancel_emit_nothing() {
        assert_eq!(run(task_source("t1", DropContainer::TaskPool, 0), None), None);

        let mut controller = DragDropController::new();
        controller
            .on_drag_start(task_source("t1", DropContainer::TaskPool, 0))
            .expect("start drag");
        assert!(controller.on_drag_cancel().is_some());
        assert_eq!(controller.state(), &DragState::Idle);
        assert_eq!(
            controller.on_drag_end(drop_on(DropContainer::TaskPool, 0)),
            None
        );
    }

    #[test]
    fn second_drag_start_is_rejected() {
        let mut controller = DragDropController::new();
        controller
            .on_drag_start(task_source("t1", DropContainer::TaskPool, 0))
            .expect("start drag");
        let second = controller.on_drag_start(task_source("t2", DropContainer::TaskPool, 1));
        assert!(matches!(second, Err(PlannerError::GestureConflict(_))));
    }

    #[test]
    fn command_names_match_log_vocabulary() {
        let command = PlanningCommand::ResizeCustom {
            entry_id: "c1".to_string(),
            minutes: 45,
        };
        assert_eq!(command.name(), "resize_custom_entry");
        assert_eq!(command.target_slot(), None);
    }
}
