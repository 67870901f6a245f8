//! Transition engine
//!
//! The engine keeps a fixed-capacity registry of transition handles and
//! advances every registered, active transition once per tick. It never owns
//! the transitions themselves: handles are resolved through a
//! [`TransitionStore`] supplied by the caller on every call.

use core::fmt;

use embassy_time::{Duration, Instant};
use heapless::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::transition::Transition;

/// Maximum number of registered transitions.
pub const REGISTRY_CAPACITY: usize = 64;

/// Default tick rate used when `init` is given zero.
pub const DEFAULT_UPDATE_RATE_HZ: u16 = 200;

/// Error returned by the transition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Registry already holds `REGISTRY_CAPACITY` distinct handles
    RegistryFull,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "transition registry is full"),
        }
    }
}

/// Caller-owned storage of transitions addressed by a handle
///
/// Unknown handles resolve to `None`; the provided operations then behave
/// as no-ops.
pub trait TransitionStore {
    /// Handle type used to address a transition
    type Id: Copy + Eq;

    /// Resolve a handle
    fn transition(&self, id: Self::Id) -> Option<&Transition>;

    /// Resolve a handle for mutation
    fn transition_mut(&mut self, id: Self::Id) -> Option<&mut Transition>;

    /// Start a transition (see [`Transition::start`])
    fn start_transition(&mut self, id: Self::Id, target: u16, duration: Duration, now: Instant) {
        if let Some(transition) = self.transition_mut(id) {
            transition.start(target, duration, now);
        }
    }

    /// Current value, zero for unknown handles
    fn transition_value(&self, id: Self::Id) -> u16 {
        self.transition(id).map_or(0, Transition::value)
    }

    /// Whether the transition is moving
    fn is_transition_active(&self, id: Self::Id) -> bool {
        self.transition(id).is_some_and(Transition::is_active)
    }

    /// Freeze a transition in place
    fn cancel_transition(&mut self, id: Self::Id) {
        if let Some(transition) = self.transition_mut(id) {
            transition.cancel();
        }
    }
}

impl<const N: usize> TransitionStore for [Transition; N] {
    type Id = usize;

    fn transition(&self, id: usize) -> Option<&Transition> {
        self.get(id)
    }

    fn transition_mut(&mut self, id: usize) -> Option<&mut Transition> {
        self.get_mut(id)
    }
}

/// Registry of transition handles with a periodic tick
#[derive(Debug)]
pub struct TransitionEngine<Id, const CAPACITY: usize = REGISTRY_CAPACITY> {
    registry: Vec<Id, CAPACITY>,
    period: Option<Duration>,
}

impl<Id: Copy + Eq, const CAPACITY: usize> Default for TransitionEngine<Id, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + Eq, const CAPACITY: usize> TransitionEngine<Id, CAPACITY> {
    /// Create an empty, uninitialized engine
    pub const fn new() -> Self {
        Self {
            registry: Vec::new(),
            period: None,
        }
    }

    /// Configure the tick period
    ///
    /// Only the first call has an effect; later calls return the period
    /// chosen by the first one.
    pub fn init(&mut self, update_rate_hz: u16) -> Duration {
        if let Some(period) = self.period {
            return period;
        }

        let rate = if update_rate_hz == 0 {
            DEFAULT_UPDATE_RATE_HZ
        } else {
            update_rate_hz
        };
        let period = Duration::from_micros(1_000_000 / u64::from(rate));
        self.period = Some(period);

        #[cfg(feature = "esp32-log")]
        println!(
            "[TransitionEngine.init] {} Hz (period {} us)",
            rate,
            period.as_micros()
        );

        period
    }

    /// Check if `init` has been called
    pub const fn is_initialized(&self) -> bool {
        self.period.is_some()
    }

    /// Tick period, or the default period before `init`
    pub fn period(&self) -> Duration {
        self.period.unwrap_or(Duration::from_micros(
            1_000_000 / u64::from(DEFAULT_UPDATE_RATE_HZ),
        ))
    }

    /// Add a handle to the registry
    ///
    /// Registering the same handle twice is a no-op.
    pub fn register(&mut self, id: Id) -> Result<(), EngineError> {
        if self.is_registered(id) {
            return Ok(());
        }

        self.registry.push(id).map_err(|_| {
            #[cfg(feature = "esp32-log")]
            println!("[TransitionEngine.register] registry full ({} entries)", CAPACITY);
            EngineError::RegistryFull
        })
    }

    /// Check if the handle is registered
    pub fn is_registered(&self, id: Id) -> bool {
        self.registry.contains(&id)
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Registered handles in registration order
    pub fn handles(&self) -> &[Id] {
        &self.registry
    }

    /// Advance every registered, active transition
    ///
    /// Returns how many transitions were advanced.
    pub fn tick<S>(&self, store: &mut S, now: Instant) -> usize
    where
        S: TransitionStore<Id = Id> + ?Sized,
    {
        let mut advanced = 0;
        for &id in &self.registry {
            let Some(transition) = store.transition_mut(id) else {
                continue;
            };
            if transition.is_active() {
                transition.tick(now);
                advanced += 1;
            }
        }
        advanced
    }
}
