//! Single interpolated scalar
//!
//! A [`Transition`] is embedded by value in the state it animates. It never
//! allocates and is only mutated through [`Transition::start`],
//! [`Transition::tick`], [`Transition::cancel`] and instant seeding.

use embassy_time::{Duration, Instant};

/// Linear transition of an unsigned 16-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Whether the value is still moving towards the target
    active: bool,
    /// Time at which the transition started
    start_time: Instant,
    /// Total transition duration
    duration: Duration,
    /// Furthest elapsed time applied by `tick`
    elapsed: Duration,
    /// Value at the start of transition
    start_value: u16,
    /// Value reached when the transition completes
    target_value: u16,
    /// Current interpolated value
    current_value: u16,
}

impl Default for Transition {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Transition {
    /// Create a settled transition resting at `value`
    pub const fn new(value: u16) -> Self {
        Self {
            active: false,
            start_time: Instant::from_millis(0),
            duration: Duration::from_millis(0),
            elapsed: Duration::from_millis(0),
            start_value: value,
            target_value: value,
            current_value: value,
        }
    }

    /// Get current value
    pub const fn value(&self) -> u16 {
        self.current_value
    }

    /// Value the transition is heading to (or resting at)
    pub const fn target(&self) -> u16 {
        self.target_value
    }

    /// Check if a transition is in progress
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Snap to `value` without interpolation
    pub fn set_instant(&mut self, value: u16) {
        self.start_value = value;
        self.target_value = value;
        self.current_value = value;
        self.duration = Duration::from_millis(0);
        self.elapsed = Duration::from_millis(0);
        self.active = false;
    }

    /// Start moving towards `target`
    ///
    /// A zero duration snaps immediately. Otherwise the transition starts
    /// from the current value, so interrupting a running transition
    /// continues from wherever it currently is.
    pub fn start(&mut self, target: u16, duration: Duration, now: Instant) {
        if duration.as_ticks() == 0 {
            self.set_instant(target);
            return;
        }

        self.start_value = self.current_value;
        self.target_value = target;
        self.duration = duration;
        self.elapsed = Duration::from_millis(0);
        self.start_time = now;
        self.active = true;
    }

    /// Freeze at the current value
    pub fn cancel(&mut self) {
        self.active = false;
        self.target_value = self.current_value;
    }

    /// Advance the transition to `now`
    ///
    /// Timestamps earlier than the start time count as zero elapsed time.
    /// Elapsed time never decreases: a clock that steps back holds the value
    /// where it is.
    pub fn tick(&mut self, now: Instant) {
        if !self.active {
            return;
        }

        let elapsed = now.saturating_duration_since(self.start_time).max(self.elapsed);
        self.elapsed = elapsed;
        if elapsed >= self.duration {
            self.current_value = self.target_value;
            self.active = false;
            return;
        }

        let distance = u64::from(self.start_value.abs_diff(self.target_value));
        let step = distance.saturating_mul(elapsed.as_ticks()) / self.duration.as_ticks();
        let step = u16::try_from(step).unwrap_or(u16::MAX);

        self.current_value = if self.target_value >= self.start_value {
            self.start_value.saturating_add(step).min(self.target_value)
        } else {
            self.start_value.saturating_sub(step).max(self.target_value)
        };
    }
}
