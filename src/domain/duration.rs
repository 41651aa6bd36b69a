//! Duration rules shared by the grid, the resize engine and the list manager.
//!
//! Durations are whole minutes snapped to the slot granularity and clamped
//! to `[MIN_DURATION_MINUTES, MAX_DURATION_MINUTES]`. The bounds do not move
//! with the grid configuration.

pub const SLOT_MINUTES: u32 = 15;
pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 8 * 60;
pub const DEFAULT_ALLOCATED_MINUTES: u32 = 60;

/// Snaps `minutes` to the nearest slot multiple, then clamps it into the
/// allowed range.
pub fn clamp_duration(minutes: i64) -> u32 {
    let slot = i64::from(SLOT_MINUTES);
    let snapped = minutes
        .saturating_add(slot / 2)
        .div_euclid(slot)
        .saturating_mul(slot);
    snapped.clamp(
        i64::from(MIN_DURATION_MINUTES),
        i64::from(MAX_DURATION_MINUTES),
    ) as u32
}

pub fn normalize_duration(minutes: u32) -> u32 {
    clamp_duration(i64::from(minutes))
}

/// Rounds a pointer movement to a whole number of slots.
pub fn snap_slot_delta(pixel_delta: f64, slot_pixel_height: f64) -> i64 {
    if !pixel_delta.is_finite() || !slot_pixel_height.is_finite() || slot_pixel_height <= 0.0 {
        return 0;
    }
    (pixel_delta / slot_pixel_height).round() as i64
}

pub fn resized_duration(start_duration: u32, pixel_delta: f64, slot_pixel_height: f64) -> u32 {
    let slot_delta = snap_slot_delta(pixel_delta, slot_pixel_height);
    let candidate = i64::from(start_duration)
        .saturating_add(slot_delta.saturating_mul(i64::from(SLOT_MINUTES)));
    clamp_duration(candidate)
}

pub fn validate_duration(minutes: u32, field_name: &str) -> Result<(), String> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(format!(
            "{field_name} must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes, got {minutes}"
        ));
    }
    if minutes % SLOT_MINUTES != 0 {
        return Err(format!(
            "{field_name} must be a multiple of {SLOT_MINUTES} minutes, got {minutes}"
        ));
    }
    Ok(())
}

/// Number of grid slots a duration occupies.
pub fn slot_span(duration_minutes: u32) -> usize {
    duration_minutes.div_ceil(SLOT_MINUTES) as usize
}

pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, rest) => format!("{rest}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h {rest}m"),
    }
}
