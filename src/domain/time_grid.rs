use crate::domain::duration::{SLOT_MINUTES, slot_span};
use crate::domain::models::ScheduledTask;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

pub const DEFAULT_SLOT_PIXEL_HEIGHT: f64 = 64.0;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// A slot-aligned time of day, written as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn from_minutes(minutes_since_midnight: u32) -> Option<Self> {
        if minutes_since_midnight >= MINUTES_PER_DAY || minutes_since_midnight % SLOT_MINUTES != 0
        {
            return None;
        }
        NaiveTime::from_hms_opt(minutes_since_midnight / 60, minutes_since_midnight % 60, 0)
            .map(Self)
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        let bytes = value.as_bytes();
        let digits = |range: &[u8]| range.iter().all(u8::is_ascii_digit);
        if bytes.len() != 5 || bytes[2] != b':' || !digits(&bytes[..2]) || !digits(&bytes[3..]) {
            return Err(format!("time slot '{value}' must be HH:MM"));
        }
        let hour = value[..2]
            .parse::<u32>()
            .map_err(|_| format!("time slot '{value}' must be HH:MM"))?;
        let minute = value[3..]
            .parse::<u32>()
            .map_err(|_| format!("time slot '{value}' must be HH:MM"))?;
        if hour > 23 || minute > 59 {
            return Err(format!("time slot '{value}' must be HH:MM"));
        }
        Self::from_minutes(hour * 60 + minute).ok_or_else(|| {
            format!("time slot '{value}' is not aligned to {SLOT_MINUTES} minutes")
        })
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Slot `minutes` later on the same day, `None` past the last slot.
    pub fn plus_minutes(&self, minutes: u32) -> Option<Self> {
        Self::from_minutes(self.minutes_since_midnight().checked_add(minutes)?)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Ordered slot labels from `day_start` to `day_end`, both inclusive.
pub fn generate_day(day_start: TimeSlot, day_end: TimeSlot) -> Vec<TimeSlot> {
    let start = day_start.minutes_since_midnight();
    let end = day_end.minutes_since_midnight();
    (start..=end)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(TimeSlot::from_minutes)
        .collect()
}

/// How one slot row renders for the current set of grid entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotView<'a> {
    Card(&'a ScheduledTask),
    Continuation(&'a ScheduledTask),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    slots: Vec<TimeSlot>,
    slot_pixel_height: f64,
}

impl TimeGrid {
    pub fn new(
        day_start: TimeSlot,
        day_end: TimeSlot,
        slot_pixel_height: f64,
    ) -> Result<Self, String> {
        if day_end < day_start {
            return Err(format!("grid end {day_end} must not be before start {day_start}"));
        }
        if !slot_pixel_height.is_finite() || slot_pixel_height <= 0.0 {
            return Err("grid slot_pixel_height must be > 0".to_string());
        }
        Ok(Self {
            slots: generate_day(day_start, day_end),
            slot_pixel_height,
        })
    }

    pub fn full_day() -> Self {
        Self {
            slots: (0..MINUTES_PER_DAY)
                .step_by(SLOT_MINUTES as usize)
                .filter_map(TimeSlot::from_minutes)
                .collect(),
            slot_pixel_height: DEFAULT_SLOT_PIXEL_HEIGHT,
        }
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot_pixel_height(&self) -> f64 {
        self.slot_pixel_height
    }

    pub fn position(&self, label: TimeSlot) -> Option<usize> {
        self.slots.binary_search(&label).ok()
    }

    pub fn index_of(&self, label: TimeSlot) -> Result<usize, String> {
        self.position(label).ok_or_else(|| {
            format!(
                "time slot {label} is outside the grid ({}..{})",
                self.first_label(),
                self.last_label()
            )
        })
    }

    /// Half-open index interval covered by `task`, which may run past the
    /// last slot. `None` when the task starts off the grid.
    pub fn coverage(&self, task: &ScheduledTask) -> Option<Range<usize>> {
        let start = self.position(task.start_time)?;
        Some(start..start + slot_span(task.duration_minutes))
    }

    /// Indices `task` covers, truncated at the grid boundary.
    pub fn covered_indices(&self, task: &ScheduledTask) -> Range<usize> {
        match self.coverage(task) {
            Some(range) => range.start..range.end.min(self.slots.len()),
            None => 0..0,
        }
    }

    pub fn covering_task<'a>(
        &self,
        label: TimeSlot,
        tasks: &'a [ScheduledTask],
    ) -> Option<&'a ScheduledTask> {
        let index = self.position(label)?;
        tasks.iter().find(|task| {
            self.coverage(task)
                .is_some_and(|range| range.contains(&index))
        })
    }

    pub fn slot_view<'a>(&self, label: TimeSlot, tasks: &'a [ScheduledTask]) -> SlotView<'a> {
        if self.position(label).is_none() {
            return SlotView::Empty;
        }
        if let Some(starting) = tasks.iter().find(|task| task.start_time == label) {
            return SlotView::Card(starting);
        }
        match self.covering_task(label, tasks) {
            Some(task) => SlotView::Continuation(task),
            None => SlotView::Empty,
        }
    }

    pub fn card_height_px(&self, duration_minutes: u32) -> f64 {
        f64::from(duration_minutes) / f64::from(SLOT_MINUTES) * self.slot_pixel_height
    }

    fn first_label(&self) -> String {
        self.slots.first().map(ToString::to_string).unwrap_or_default()
    }

    fn last_label(&self) -> String {
        self.slots.last().map(ToString::to_string).unwrap_or_default()
    }
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::full_day()
    }
}
