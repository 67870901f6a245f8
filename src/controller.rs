//! Application context
//!
//! [`Controller`] owns every piece of mutable state: segments, the
//! transition engine, presets, the strip buffers and the save timer. It is
//! driven from a single periodic context through [`Controller::tick`]; other
//! contexts reach it only through the command queue.

use core::fmt;

use embassy_time::{Duration, Instant};
use heapless::Deque;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::StripDriver;
use crate::command::{
    Command, CommandReceiver, check_segment, check_slot, check_strip, check_value,
    truncated_name,
};
use crate::config::{ControllerConfig, DeviceSettings, MAX_STRIP_LENGTH};
use crate::engine::{TransitionEngine, TransitionStore};
use crate::preset::{PresetError, PresetName, PresetStore};
use crate::renderer::Renderer;
use crate::segment::{
    ColorMode, LightChannel, LightSettings, LoadReport, PowerOnBehavior, SegmentDefaults,
    SegmentGeometry, SegmentLightState, SegmentStore, TransitionId,
};
use crate::storage::{LoadStatus, PersistentStore, SaveDebouncer, StorageError};

/// Number of deferred tasks that can wait for the next tick.
pub const DEFERRED_CAPACITY: usize = 4;

/// Error returned for rejected control requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Segment index is not below `MAX_SEGMENTS`
    SegmentOutOfRange,
    /// Strip index is not below `MAX_STRIPS`
    StripOutOfRange,
    /// Value outside the channel's range
    ValueOutOfRange,
    /// Command queue is full
    QueueFull,
    /// Preset operation failed
    Preset(PresetError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentOutOfRange => write!(f, "segment index out of range"),
            Self::StripOutOfRange => write!(f, "strip index out of range"),
            Self::ValueOutOfRange => write!(f, "value out of range"),
            Self::QueueFull => write!(f, "command queue is full"),
            Self::Preset(err) => write!(f, "{err}"),
        }
    }
}

impl From<PresetError> for ControlError {
    fn from(err: PresetError) -> Self {
        Self::Preset(err)
    }
}

/// Work posted from a command to the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Settled state changed in bulk; the protocol layer should re-read it
    StateSync,
}

/// What happened during one [`Controller::tick`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickEffects {
    /// Queued commands applied
    pub applied: usize,
    /// Queued commands rejected
    pub rejected: usize,
    /// Transitions advanced by the engine
    pub advanced: usize,
    /// A deferred state sync ran; publish the settled state
    pub state_sync: bool,
    /// Outcome of the debounced save, if it ran
    pub saved: Option<Result<(), StorageError>>,
}

/// Outcome of loading persisted state at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub device: LoadStatus,
    pub segments: LoadReport,
    /// Occupied preset slots
    pub presets: usize,
    /// Transitions that could not be registered and will only snap
    pub unregistered: usize,
}

/// Segmented strip controller
pub struct Controller<'a, const MAX_LEDS: usize, const COMMAND_SIZE: usize> {
    commands: CommandReceiver<'a, COMMAND_SIZE>,
    segments: SegmentStore,
    engine: TransitionEngine<TransitionId>,
    presets: PresetStore,
    renderer: Renderer<MAX_LEDS>,
    debouncer: SaveDebouncer,
    deferred: Deque<Deferred, DEFERRED_CAPACITY>,
    /// Persisted device settings; strip lengths apply after restart
    device: DeviceSettings,
    color_transitions: bool,
    pending_preset_name: Option<PresetName>,
    startup: StartupReport,
}

impl<'a, const MAX_LEDS: usize, const COMMAND_SIZE: usize> Controller<'a, MAX_LEDS, COMMAND_SIZE> {
    /// Load persisted state and prepare the first frame
    ///
    /// Never fails: anything missing or unreadable falls back to defaults.
    pub fn new<S: PersistentStore + ?Sized>(
        commands: CommandReceiver<'a, COMMAND_SIZE>,
        config: &ControllerConfig,
        storage: &mut S,
    ) -> Self {
        let mut device = config.device;
        let device_status = device.load(storage);

        let defaults = SegmentDefaults {
            base_count: device.strip_lengths[0],
            ..config.segments
        };
        let mut segments = SegmentStore::new(&defaults);
        let segment_status = segments.load(storage);

        let mut engine: TransitionEngine<TransitionId> = TransitionEngine::new();
        engine.init(config.update_rate_hz);
        segments.init_transitions_from_state();

        let mut unregistered = 0;
        for id in SegmentStore::transition_ids() {
            if engine.register(id).is_err() {
                unregistered += 1;
            }
        }

        let mut presets = PresetStore::new();
        let preset_count = presets.load(storage);

        segments.apply_power_on_behavior();

        #[cfg(feature = "esp32-log")]
        println!(
            "[Controller.new] strips {}/{} leds, {} presets, {} transitions registered",
            device.strip_lengths[0],
            device.strip_lengths[1],
            preset_count,
            engine.len()
        );

        Self {
            commands,
            segments,
            engine,
            presets,
            renderer: Renderer::new(device.strip_lengths),
            debouncer: SaveDebouncer::new(config.save_delay),
            deferred: Deque::new(),
            device,
            color_transitions: config.color_transitions,
            pending_preset_name: None,
            startup: StartupReport {
                device: device_status,
                segments: segment_status,
                presets: preset_count,
                unregistered,
            },
        }
    }

    /// Tick period chosen by the transition engine
    pub fn period(&self) -> Duration {
        self.engine.period()
    }

    pub const fn startup_report(&self) -> &StartupReport {
        &self.startup
    }

    pub const fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub const fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub const fn renderer(&self) -> &Renderer<MAX_LEDS> {
        &self.renderer
    }

    pub const fn engine(&self) -> &TransitionEngine<TransitionId> {
        &self.engine
    }

    pub const fn device_settings(&self) -> &DeviceSettings {
        &self.device
    }

    pub const fn global_transition(&self) -> Duration {
        self.device.global_transition
    }

    pub fn pending_preset_name(&self) -> Option<&str> {
        self.pending_preset_name.as_deref()
    }

    /// Check if a debounced save is waiting
    pub const fn is_save_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Settled state of a segment
    pub fn state(&self, segment: u8) -> Result<&SegmentLightState, ControlError> {
        let index = check_segment(segment)?;
        self.segments
            .state(index)
            .ok_or(ControlError::SegmentOutOfRange)
    }

    pub fn geometry(&self, segment: u8) -> Result<&SegmentGeometry, ControlError> {
        let index = check_segment(segment)?;
        self.segments
            .geometry(index)
            .ok_or(ControlError::SegmentOutOfRange)
    }

    fn state_mut(&mut self, segment: u8) -> Result<&mut SegmentLightState, ControlError> {
        let index = check_segment(segment)?;
        self.segments
            .state_mut(index)
            .ok_or(ControlError::SegmentOutOfRange)
    }

    /// Duration applied to a channel when the caller supplied `requested`
    fn channel_duration(&self, channel: LightChannel, requested: Option<Duration>) -> Duration {
        let animated = match channel {
            LightChannel::Level | LightChannel::ColorTemperature => true,
            LightChannel::Hue | LightChannel::Saturation => self.color_transitions,
        };
        if animated {
            requested.unwrap_or(self.device.global_transition)
        } else {
            Duration::from_ticks(0)
        }
    }

    fn changed(&mut self, now: Instant) {
        self.debouncer.schedule(now);
    }

    /// Move one channel of a segment to a new settled value
    ///
    /// Level and color temperature animate over `duration` (the global
    /// transition when `None`); hue and saturation snap unless color
    /// transitions are enabled. Hue selects the hue color mode and color
    /// temperature the white mode.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_target(
        &mut self,
        segment: u8,
        channel: LightChannel,
        value: u16,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ControlError> {
        let value = check_value(channel, value)?;
        let duration = self.channel_duration(channel, duration);
        let state = self.state_mut(segment)?;
        match channel {
            LightChannel::Level => state.level = value as u8,
            LightChannel::Hue => {
                state.hue = value;
                state.color_mode = ColorMode::EnhancedHue;
            }
            LightChannel::Saturation => state.saturation = value as u8,
            LightChannel::ColorTemperature => {
                state.color_temperature = value;
                state.color_mode = ColorMode::ColorTemperature;
            }
        }
        self.segments
            .start_transition(TransitionId::new(segment, channel), value, duration, now);
        self.changed(now);
        Ok(())
    }

    pub fn set_level(
        &mut self,
        segment: u8,
        level: u8,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::Level, u16::from(level), duration, now)
    }

    pub fn set_hue(
        &mut self,
        segment: u8,
        hue: u16,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::Hue, hue, duration, now)
    }

    pub fn set_saturation(
        &mut self,
        segment: u8,
        saturation: u8,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.set_target(
            segment,
            LightChannel::Saturation,
            u16::from(saturation),
            duration,
            now,
        )
    }

    pub fn set_color_temperature(
        &mut self,
        segment: u8,
        mireds: u16,
        duration: Option<Duration>,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::ColorTemperature, mireds, duration, now)
    }

    /// Switch a segment on or off; the level snaps instead of fading
    pub fn set_on(&mut self, segment: u8, on: bool, now: Instant) -> Result<(), ControlError> {
        let state = self.state_mut(segment)?;
        state.on = on;
        let level = u16::from(state.level);
        self.segments.start_transition(
            TransitionId::new(segment, LightChannel::Level),
            level,
            Duration::from_ticks(0),
            now,
        );
        self.changed(now);
        Ok(())
    }

    pub fn set_color_mode(
        &mut self,
        segment: u8,
        mode: ColorMode,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.state_mut(segment)?.color_mode = mode;
        self.changed(now);
        Ok(())
    }

    /// Set CIE xy chromaticity and select the xy color mode
    pub fn set_color_xy(
        &mut self,
        segment: u8,
        x: u16,
        y: u16,
        now: Instant,
    ) -> Result<(), ControlError> {
        let state = self.state_mut(segment)?;
        state.color_x = x;
        state.color_y = y;
        state.color_mode = ColorMode::Xy;
        self.changed(now);
        Ok(())
    }

    pub fn set_power_on_behavior(
        &mut self,
        segment: u8,
        behavior: PowerOnBehavior,
        now: Instant,
    ) -> Result<(), ControlError> {
        self.state_mut(segment)?.power_on_behavior = behavior;
        self.changed(now);
        Ok(())
    }

    /// Place a segment on a strip; a zero count disables it
    pub fn set_geometry(
        &mut self,
        segment: u8,
        geometry: SegmentGeometry,
        now: Instant,
    ) -> Result<(), ControlError> {
        let index = check_segment(segment)?;
        check_strip(geometry.strip_id)?;
        if let Some(slot) = self.segments.geometry_mut(index) {
            *slot = geometry;
        }
        self.changed(now);
        Ok(())
    }

    /// Change the duration used when a setter gets none
    pub fn set_global_transition(&mut self, duration: Duration, now: Instant) {
        self.device.global_transition = duration;
        self.changed(now);
    }

    /// Store a new strip length, used from the next restart
    pub fn set_strip_length(
        &mut self,
        strip: u8,
        length: u16,
        now: Instant,
    ) -> Result<(), ControlError> {
        let index = check_strip(strip)?;
        if length > MAX_STRIP_LENGTH {
            return Err(ControlError::ValueOutOfRange);
        }
        self.device.strip_lengths[index] = length;
        self.changed(now);
        Ok(())
    }

    /// Name used by the next save without an explicit name
    ///
    /// Longer names are cut to fit; an empty name clears it.
    pub fn set_pending_preset_name(&mut self, name: &str) {
        let name = truncated_name(name);
        self.pending_preset_name = if name.is_empty() { None } else { Some(name) };
    }

    /// Apply a preset to every segment
    ///
    /// Settled fields are replaced at once; level and color temperature then
    /// animate from where they are, hue and saturation snap. Power-on
    /// behavior is kept.
    pub fn trigger_recall(&mut self, slot: u8, now: Instant) -> Result<(), ControlError> {
        let index = check_slot(slot)?;
        let settings = *self.presets.recall(index)?;
        self.apply_preset(&settings, now);

        #[cfg(feature = "esp32-log")]
        println!("[Controller.trigger_recall] recalled slot {}", slot);

        Ok(())
    }

    /// Capture every segment into a preset slot
    ///
    /// Without a name the pending preset name is used, then `"Preset N"`.
    /// The pending name is consumed only when the save succeeds.
    pub fn trigger_save<S: PersistentStore + ?Sized>(
        &mut self,
        slot: u8,
        name: Option<&str>,
        storage: &mut S,
    ) -> Result<(), ControlError> {
        let index = check_slot(slot)?;
        let uses_pending = name.is_none() && self.pending_preset_name.is_some();
        let name = name.or(self.pending_preset_name.as_deref());
        self.presets
            .save(index, name, &self.segments, storage)
            .map_err(|err| {
                #[cfg(feature = "esp32-log")]
                println!("[Controller.trigger_save] slot {} failed: {}", slot, err);
                ControlError::Preset(err)
            })?;
        if uses_pending {
            self.pending_preset_name = None;
        }
        Ok(())
    }

    /// Empty a preset slot
    pub fn trigger_delete<S: PersistentStore + ?Sized>(
        &mut self,
        slot: u8,
        storage: &mut S,
    ) -> Result<(), ControlError> {
        let index = check_slot(slot)?;
        self.presets.delete(index, storage)?;
        Ok(())
    }

    pub fn recall_by_name(&mut self, name: &str, now: Instant) -> Result<(), ControlError> {
        let slot = self.presets.find(name).ok_or(PresetError::NotFound)?;
        let settings = *self.presets.recall(slot)?;
        self.apply_preset(&settings, now);
        Ok(())
    }

    /// Save under a name, reusing its slot or taking the first free one
    pub fn save_by_name<S: PersistentStore + ?Sized>(
        &mut self,
        name: &str,
        storage: &mut S,
    ) -> Result<usize, ControlError> {
        Ok(self.presets.save_by_name(name, &self.segments, storage)?)
    }

    pub fn delete_by_name<S: PersistentStore + ?Sized>(
        &mut self,
        name: &str,
        storage: &mut S,
    ) -> Result<(), ControlError> {
        let slot = self.presets.find(name).ok_or(PresetError::NotFound)?;
        self.presets.delete(slot, storage)?;
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply_preset(&mut self, settings: &[LightSettings], now: Instant) {
        let durations = LightChannel::ALL.map(|channel| self.channel_duration(channel, None));
        for (index, settings) in settings.iter().enumerate() {
            let Some(state) = self.segments.state_mut(index) else {
                continue;
            };
            state.apply_settings(settings);
            for (channel, duration) in LightChannel::ALL.into_iter().zip(durations) {
                self.segments.start_transition(
                    TransitionId::new(index as u8, channel),
                    settings.channel_value(channel),
                    duration,
                    now,
                );
            }
        }

        self.changed(now);
        if self.deferred.push_back(Deferred::StateSync).is_err() {
            #[cfg(feature = "esp32-log")]
            println!("[Controller.apply_preset] deferred queue full, state sync dropped");
        }
    }

    /// Apply a command as if it came from the owning context
    pub fn apply<S: PersistentStore + ?Sized>(
        &mut self,
        command: Command,
        now: Instant,
        storage: &mut S,
    ) -> Result<(), ControlError> {
        match command {
            Command::SetTarget {
                segment,
                channel,
                value,
                duration,
            } => self.set_target(segment, channel, value, duration, now),
            Command::SetOn { segment, on } => self.set_on(segment, on, now),
            Command::SetColorMode { segment, mode } => self.set_color_mode(segment, mode, now),
            Command::SetColorXy { segment, x, y } => self.set_color_xy(segment, x, y, now),
            Command::SetPowerOnBehavior { segment, behavior } => {
                self.set_power_on_behavior(segment, behavior, now)
            }
            Command::SetGeometry { segment, geometry } => {
                self.set_geometry(segment, geometry, now)
            }
            Command::SetGlobalTransition(duration) => {
                self.set_global_transition(duration, now);
                Ok(())
            }
            Command::SetStripLength { strip, length } => {
                self.set_strip_length(strip, length, now)
            }
            Command::RecallPreset(slot) => self.trigger_recall(slot, now),
            Command::SavePreset { slot, name } => {
                self.trigger_save(slot, name.as_deref(), storage)
            }
            Command::DeletePreset(slot) => self.trigger_delete(slot, storage),
            Command::SetPresetSaveName(name) => {
                self.set_pending_preset_name(&name);
                Ok(())
            }
            Command::RecallPresetByName(name) => self.recall_by_name(&name, now),
            Command::SavePresetByName(name) => self.save_by_name(&name, storage).map(|_| ()),
            Command::DeletePresetByName(name) => self.delete_by_name(&name, storage),
        }
    }

    /// Save segments and device settings now
    ///
    /// Both are attempted; the first failure is returned.
    pub fn save<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> Result<(), StorageError> {
        self.debouncer.cancel();
        let segments = self.segments.save(storage);
        let device = self.device.save(storage);
        segments.and(device)
    }

    /// Run one periodic step
    ///
    /// Order: queued commands, deferred tasks, transitions, composition and
    /// flush, then the debounced save once it is due. A failed save is
    /// retried after another delay.
    pub fn tick<D, S>(&mut self, now: Instant, driver: &mut D, storage: &mut S) -> TickEffects
    where
        D: StripDriver + ?Sized,
        S: PersistentStore + ?Sized,
    {
        let mut effects = TickEffects::default();

        while let Ok(command) = self.commands.try_receive() {
            match self.apply(command, now, storage) {
                Ok(()) => effects.applied += 1,
                Err(_err) => {
                    #[cfg(feature = "esp32-log")]
                    println!("[Controller.tick] command rejected: {}", _err);
                    effects.rejected += 1;
                }
            }
        }

        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::StateSync => effects.state_sync = true,
            }
        }

        effects.advanced = self.engine.tick(&mut self.segments, now);
        self.renderer.render(&self.segments, driver);

        if self.debouncer.poll(now) {
            let result = self.save(storage);
            if let Err(_err) = result {
                #[cfg(feature = "esp32-log")]
                println!("[Controller.tick] save failed, retrying: {}", _err);
                self.debouncer.schedule(now);
            }
            effects.saved = Some(result);
        }

        effects
    }
}
