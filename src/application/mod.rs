pub mod bootstrap;
pub mod drag_drop;
pub mod notifications;
pub mod planning_list;
pub mod resize;
pub mod session;
