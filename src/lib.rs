pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{
    BootstrapResult, DynPlannerSession, bootstrap_workspace, open_session,
};
pub use application::drag_drop::{
    DragDropController, DragItem, DragSource, DropContainer, DropTarget, PlanningCommand,
};
pub use application::notifications::{Notification, NotificationCenter, NotificationLevel};
pub use application::planning_list::TaskPlanningListManager;
pub use application::resize::{ResizeEngine, ResizeOutcome};
pub use application::session::{CapacityReadout, GestureLock, PlannerSession};
pub use domain::models::{
    CustomEntry, EntryRef, ScheduledTask, ScheduledTaskType, Task, TaskPlanningItem,
    TaskPlanningRecord,
};
pub use domain::sorting::AvailableSortKey;
pub use domain::time_grid::{SlotView, TimeGrid, TimeSlot};
pub use infrastructure::error::PlannerError;
pub use infrastructure::planning_store::PlanningStore;
pub use infrastructure::task_catalog::TaskCatalog;
