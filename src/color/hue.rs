//! Hue wheel helpers
//!
//! Hue values are degrees carried in a `u16`. Shortest-arc math can push a
//! value outside `0..360`, so anything read back from a hue transition has
//! to go through [`normalize_hue`] before use.

use embassy_time::{Duration, Instant};

use crate::transition::Transition;

const FULL_TURN: i32 = 360;
const HALF_TURN: i32 = 180;

/// Reduce a raw hue into `0..360`
///
/// The raw value is read as a signed angle, so a wrapped negative value such
/// as `65476` (-60) becomes 300.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub const fn normalize_hue(raw: u16) -> u16 {
    let signed = raw as i16 as i32;
    signed.rem_euclid(FULL_TURN) as u16
}

/// Adjust `target` so that moving linearly from `current` takes the shorter
/// way around the wheel
///
/// The result may be negative or above 360.
#[allow(clippy::cast_possible_truncation)]
pub const fn shortest_arc(current: u16, target: u16) -> i16 {
    let current = current as i32;
    let mut target = target as i32;
    let diff = target - current;
    if diff > HALF_TURN {
        target -= FULL_TURN;
    } else if diff < -HALF_TURN {
        target += FULL_TURN;
    }
    target as i16
}

/// Start a hue transition along the shorter arc
///
/// A zero duration snaps straight to the normalized target. Otherwise both
/// ends are kept non-negative: when the shorter path crosses below zero, the
/// current position is moved up one full turn first, which is the same point
/// on the wheel.
#[allow(clippy::cast_sign_loss)]
pub fn start_hue_transition(
    transition: &mut Transition,
    target_hue: u16,
    duration: Duration,
    now: Instant,
) {
    if duration.as_ticks() == 0 {
        transition.set_instant(normalize_hue(target_hue));
        return;
    }

    let current = normalize_hue(transition.value());
    let adjusted = shortest_arc(current, normalize_hue(target_hue));

    if adjusted < 0 {
        transition.set_instant(current + 360);
        transition.start((adjusted + 360) as u16, duration, now);
    } else {
        transition.set_instant(current);
        transition.start(adjusted as u16, duration, now);
    }
}

/// Convert a 16-bit enhanced hue to degrees
#[allow(clippy::cast_possible_truncation)]
pub const fn enhanced_hue_to_degrees(enhanced: u16) -> u16 {
    (enhanced as u32 * 360 / 65535) as u16
}

/// Convert degrees to a 16-bit enhanced hue
#[allow(clippy::cast_possible_truncation)]
pub const fn degrees_to_enhanced_hue(degrees: u16) -> u16 {
    let degrees = normalize_hue(degrees) as u32;
    (degrees * 65535 / 360) as u16
}
