//! Frame pacing for the periodic context
//!
//! Portable pacing without async/await or platform timers. The caller
//! sleeps for the returned duration between ticks.

use embassy_time::{Duration, Instant};

use crate::controller::{Controller, TickEffects};
use crate::storage::PersistentStore;
use crate::StripDriver;

/// Result of a frame tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// Deadline of the next frame
    pub next_deadline: Instant,
    /// How long to wait until the next frame, zero when behind schedule
    pub sleep_duration: Duration,
    /// What the controller did this frame
    pub effects: TickEffects,
}

/// Drives a [`Controller`] at the transition engine period
///
/// # Usage
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(controller, driver, storage);
///
/// loop {
///     let result = scheduler.tick(Instant::now());
///     if result.effects.state_sync {
///         publish_state(scheduler.controller().segments());
///     }
///     Timer::at(result.next_deadline).await;
/// }
/// ```
pub struct FrameScheduler<'a, D, S, const MAX_LEDS: usize, const COMMAND_SIZE: usize>
where
    D: StripDriver,
    S: PersistentStore,
{
    controller: Controller<'a, MAX_LEDS, COMMAND_SIZE>,
    driver: D,
    storage: S,
    next_frame: Option<Instant>,
    frame_duration: Duration,
}

impl<'a, D, S, const MAX_LEDS: usize, const COMMAND_SIZE: usize>
    FrameScheduler<'a, D, S, MAX_LEDS, COMMAND_SIZE>
where
    D: StripDriver,
    S: PersistentStore,
{
    /// Create a scheduler ticking at the controller's engine period
    pub fn new(controller: Controller<'a, MAX_LEDS, COMMAND_SIZE>, driver: D, storage: S) -> Self {
        let frame_duration = controller.period();
        Self {
            controller,
            driver,
            storage,
            next_frame: None,
            frame_duration,
        }
    }

    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Run one frame and return timing information
    ///
    /// When more than two periods behind, the schedule restarts from `now`
    /// instead of bursting through the backlog.
    pub fn tick(&mut self, now: Instant) -> FrameResult {
        let max_drift = self.frame_duration + self.frame_duration;
        let frame = match self.next_frame {
            Some(deadline) if now.saturating_duration_since(deadline) <= max_drift => deadline,
            _ => now,
        };

        let effects = self
            .controller
            .tick(now, &mut self.driver, &mut self.storage);

        let next_deadline = frame.checked_add(self.frame_duration).unwrap_or(now);
        self.next_frame = Some(next_deadline);

        FrameResult {
            next_deadline,
            sleep_duration: next_deadline.saturating_duration_since(now),
            effects,
        }
    }

    pub const fn controller(&self) -> &Controller<'a, MAX_LEDS, COMMAND_SIZE> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<'a, MAX_LEDS, COMMAND_SIZE> {
        &mut self.controller
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access for saves and preset operations made outside a tick
    pub fn parts_mut(&mut self) -> (&mut Controller<'a, MAX_LEDS, COMMAND_SIZE>, &mut S) {
        (&mut self.controller, &mut self.storage)
    }
}
