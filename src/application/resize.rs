use crate::domain::duration::{normalize_duration, resized_duration};
use crate::domain::models::EntryRef;
use crate::domain::time_grid::DEFAULT_SLOT_PIXEL_HEIGHT;
use crate::infrastructure::error::PlannerError;

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeState {
    Idle,
    Resizing {
        entry: EntryRef,
        start_pointer_y: f64,
        start_duration: u32,
        preview: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    Committed { entry: EntryRef, minutes: u32 },
    Unchanged { entry: EntryRef },
    NotResizing,
}

/// Bottom-edge drag of a grid card. Only `end` produces a value worth
/// persisting; `move_to` is preview only.
#[derive(Debug, Clone)]
pub struct ResizeEngine {
    state: ResizeState,
    slot_pixel_height: f64,
}

impl ResizeEngine {
    pub fn new(slot_pixel_height: f64) -> Self {
        Self {
            state: ResizeState::Idle,
            slot_pixel_height,
        }
    }

    pub fn state(&self) -> &ResizeState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ResizeState::Resizing { .. })
    }

    pub fn begin(
        &mut self,
        entry: EntryRef,
        pointer_y: f64,
        current_duration: u32,
    ) -> Result<(), PlannerError> {
        if let ResizeState::Resizing { entry: active, .. } = &self.state {
            return Err(PlannerError::GestureConflict(format!(
                "already resizing {}",
                active.id()
            )));
        }
        let start_duration = normalize_duration(current_duration);
        self.state = ResizeState::Resizing {
            entry,
            start_pointer_y: pointer_y,
            start_duration,
            preview: start_duration,
        };
        Ok(())
    }

    /// Updates and returns the preview duration; `None` when idle.
    pub fn move_to(&mut self, pointer_y: f64) -> Option<u32> {
        let slot_pixel_height = self.slot_pixel_height;
        match &mut self.state {
            ResizeState::Resizing {
                start_pointer_y,
                start_duration,
                preview,
                ..
            } => {
                *preview = resized_duration(
                    *start_duration,
                    pointer_y - *start_pointer_y,
                    slot_pixel_height,
                );
                Some(*preview)
            }
            ResizeState::Idle => None,
        }
    }

    pub fn end(&mut self, pointer_y: f64) -> ResizeOutcome {
        let state = std::mem::replace(&mut self.state, ResizeState::Idle);
        let ResizeState::Resizing {
            entry,
            start_pointer_y,
            start_duration,
            ..
        } = state
        else {
            return ResizeOutcome::NotResizing;
        };

        let minutes = resized_duration(
            start_duration,
            pointer_y - start_pointer_y,
            self.slot_pixel_height,
        );
        if minutes == start_duration {
            ResizeOutcome::Unchanged { entry }
        } else {
            ResizeOutcome::Committed { entry, minutes }
        }
    }

    /// Pointer-cancel: drops the preview and returns to idle.
    pub fn cancel(&mut self) -> Option<EntryRef> {
        match std::mem::replace(&mut self.state, ResizeState::Idle) {
            ResizeState::Resizing { entry, .. } => Some(entry),
            ResizeState::Idle => None,
        }
    }

    /// Preview duration to render for `entry` while it is being resized.
    pub fn preview_for(&self, entry: &EntryRef) -> Option<u32> {
        match &self.state {
            ResizeState::Resizing {
                entry: active,
                preview,
                ..
            } if active == entry => Some(*preview),
            _ => None,
        }
    }
}

impl Default for ResizeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_PIXEL_HEIGHT)
    }
}
