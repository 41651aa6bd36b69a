use crate::domain::models::TaskPlanningItem;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailableSortKey {
    #[default]
    Order,
    DueDate,
    Priority,
    Title,
}

impl AvailableSortKey {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "order" => Ok(Self::Order),
            "due_date" => Ok(Self::DueDate),
            "priority" => Ok(Self::Priority),
            "title" => Ok(Self::Title),
            other => Err(format!("invalid sort key: {other}")),
        }
    }
}

/// Splits a day's items into `(available, scheduled)` by `is_scheduled`.
pub fn partition(items: Vec<TaskPlanningItem>) -> (Vec<TaskPlanningItem>, Vec<TaskPlanningItem>) {
    let (scheduled, available): (Vec<_>, Vec<_>) =
        items.into_iter().partition(|item| item.is_scheduled);
    (available, scheduled)
}

pub fn sort_available(items: &mut [TaskPlanningItem], key: AvailableSortKey) {
    match key {
        AvailableSortKey::Order => items.sort_by(compare_order),
        AvailableSortKey::DueDate => items.sort_by(|left, right| {
            match (left.due_date, right.due_date) {
                (Some(left), Some(right)) => left.cmp(&right),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        AvailableSortKey::Priority => items.sort_by_key(|item| {
            item.priority.map(|priority| priority.rank()).unwrap_or(u8::MAX)
        }),
        AvailableSortKey::Title => items.sort_by(|left, right| {
            left.title
                .to_lowercase()
                .cmp(&right.title.to_lowercase())
                .then_with(|| left.title.cmp(&right.title))
        }),
    }
}

/// The scheduled bucket is always ordered by `order_index`, never by time.
pub fn sort_scheduled(items: &mut [TaskPlanningItem]) {
    items.sort_by(compare_order);
}

// Equal indices fall back to catalog order so partial reorder writes stay
// deterministic until the next full renumbering.
fn compare_order(left: &TaskPlanningItem, right: &TaskPlanningItem) -> Ordering {
    left.order_index
        .cmp(&right.order_index)
        .then_with(|| left.catalog_position.cmp(&right.catalog_position))
}
