use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

const MAX_PENDING_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A user-facing toast. The core only queues them; rendering is up to the
/// caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    pending: VecDeque<Notification>,
}

impl NotificationCenter {
    pub fn info(&mut self, title: &str, message: &str) {
        self.push(NotificationLevel::Info, title, message);
    }

    pub fn error(&mut self, title: &str, message: &str) {
        self.push(NotificationLevel::Error, title, message);
    }

    pub fn pending(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.pending.back()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Hands every queued notification to the caller, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    fn push(&mut self, level: NotificationLevel, title: &str, message: &str) {
        if self.pending.len() == MAX_PENDING_NOTIFICATIONS {
            self.pending.pop_front();
        }
        self.pending.push_back(Notification {
            level,
            title: title.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        });
    }
}
