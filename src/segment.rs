//! Segment geometry and light state
//!
//! Up to [`MAX_SEGMENTS`] virtual segments are overlaid on up to
//! [`MAX_STRIPS`] physical strips. Each segment carries its settled light
//! settings plus one embedded [`Transition`] per animated channel.

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::engine::TransitionStore;
use crate::storage::{
    KEY_GEOMETRY, KEY_STATE, LoadStatus, PersistentStore, RecordReader, RecordWriter,
    StorageError,
};
use crate::transition::Transition;

/// Number of virtual segments.
pub const MAX_SEGMENTS: usize = 8;
/// Number of physical strips.
pub const MAX_STRIPS: usize = 2;

/// Maximum level and saturation.
pub const LEVEL_MAX: u8 = 254;
/// Maximum hue in degrees.
pub const HUE_MAX: u16 = 360;
/// Coldest supported color temperature in mireds (6500 K).
pub const COLOR_TEMPERATURE_MIN: u16 = 153;
/// Warmest supported color temperature in mireds (2700 K).
pub const COLOR_TEMPERATURE_MAX: u16 = 370;

/// Encoded size of [`SegmentGeometry`].
pub const GEOMETRY_RECORD_LEN: usize = 5;
/// Encoded size of [`LightSettings`]; also the first state record layout.
pub const SETTINGS_RECORD_LEN: usize = 12;
/// Encoded size of a light state record (settings + power-on behavior).
pub const STATE_RECORD_LEN: usize = SETTINGS_RECORD_LEN + 1;

const GEOMETRY_BLOB_LEN: usize = GEOMETRY_RECORD_LEN * MAX_SEGMENTS;
const STATE_BLOB_LEN: usize = STATE_RECORD_LEN * MAX_SEGMENTS;

/// Placement of a segment on a physical strip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentGeometry {
    /// First LED index
    pub start: u16,
    /// Number of LEDs, 0 disables the segment
    pub count: u16,
    /// Physical strip index
    pub strip_id: u8,
}

impl SegmentGeometry {
    pub const fn new(start: u16, count: u16, strip_id: u8) -> Self {
        Self {
            start,
            count,
            strip_id,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.count > 0
    }

    fn encode(&self, out: &mut RecordWriter<'_>) {
        out.put_u16(self.start);
        out.put_u16(self.count);
        out.put_u8(self.strip_id);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode(input: &mut RecordReader<'_>) -> Self {
        let start = input.get_u16();
        let count = input.get_u16();
        let strip_id = input.get_u8().min(MAX_STRIPS as u8 - 1);
        Self {
            start,
            count,
            strip_id,
        }
    }
}

/// Which channels drive a segment's output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorMode {
    /// Hue and saturation drive RGB
    #[default]
    EnhancedHue = 0,
    /// CIE xy chromaticity drives RGB
    Xy = 1,
    /// Color temperature, level drives the white channel
    ColorTemperature = 2,
}

impl ColorMode {
    pub const fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::EnhancedHue,
            1 => Self::Xy,
            2 => Self::ColorTemperature,
            _ => return None,
        })
    }
}

/// Policy applied to the on/off state at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerOnBehavior {
    Off = 0x00,
    On = 0x01,
    Toggle = 0x02,
    #[default]
    RestorePrevious = 0xFF,
}

impl PowerOnBehavior {
    /// Unknown values fall back to restoring the previous state
    pub const fn from_raw(value: u8) -> Self {
        match value {
            0x00 => Self::Off,
            0x01 => Self::On,
            0x02 => Self::Toggle,
            _ => Self::RestorePrevious,
        }
    }

    /// Resolve the startup on/off state from the persisted one
    pub const fn apply(self, previous: bool) -> bool {
        match self {
            Self::Off => false,
            Self::On => true,
            Self::Toggle => !previous,
            Self::RestorePrevious => previous,
        }
    }
}

/// Animated channel of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightChannel {
    Level,
    Hue,
    Saturation,
    ColorTemperature,
}

impl LightChannel {
    pub const ALL: [Self; 4] = [
        Self::Level,
        Self::Hue,
        Self::Saturation,
        Self::ColorTemperature,
    ];

    /// Check if `value` is a valid settled value for the channel
    pub const fn accepts(self, value: u16) -> bool {
        match self {
            Self::Level | Self::Saturation => value <= LEVEL_MAX as u16,
            Self::Hue => value <= HUE_MAX,
            Self::ColorTemperature => {
                value >= COLOR_TEMPERATURE_MIN && value <= COLOR_TEMPERATURE_MAX
            }
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Level => 0,
            Self::Hue => 1,
            Self::Saturation => 2,
            Self::ColorTemperature => 3,
        }
    }
}

/// Handle of one segment transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionId {
    pub segment: u8,
    pub channel: LightChannel,
}

impl TransitionId {
    pub const fn new(segment: u8, channel: LightChannel) -> Self {
        Self { segment, channel }
    }
}

/// Settled light settings of a segment
///
/// This is the part of the state captured by presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightSettings {
    pub on: bool,
    /// Brightness 0-254
    pub level: u8,
    /// Degrees 0-360
    pub hue: u16,
    /// 0-254
    pub saturation: u8,
    pub color_mode: ColorMode,
    /// CIE x, 16-bit fixed point
    pub color_x: u16,
    /// CIE y, 16-bit fixed point
    pub color_y: u16,
    /// Mireds
    pub color_temperature: u16,
}

impl LightSettings {
    /// Value of an animated channel
    pub fn channel_value(&self, channel: LightChannel) -> u16 {
        match channel {
            LightChannel::Level => u16::from(self.level),
            LightChannel::Hue => self.hue,
            LightChannel::Saturation => u16::from(self.saturation),
            LightChannel::ColorTemperature => self.color_temperature,
        }
    }

    pub(crate) fn encode(&self, out: &mut RecordWriter<'_>) {
        out.put_bool(self.on);
        out.put_u8(self.level);
        out.put_u16(self.hue);
        out.put_u8(self.saturation);
        out.put_u8(self.color_mode as u8);
        out.put_u16(self.color_x);
        out.put_u16(self.color_y);
        out.put_u16(self.color_temperature);
    }

    pub(crate) fn decode(input: &mut RecordReader<'_>) -> Self {
        Self {
            on: input.get_bool(),
            level: input.get_u8().min(LEVEL_MAX),
            hue: input.get_u16().min(HUE_MAX),
            saturation: input.get_u8().min(LEVEL_MAX),
            color_mode: ColorMode::from_raw(input.get_u8()).unwrap_or_default(),
            color_x: input.get_u16(),
            color_y: input.get_u16(),
            color_temperature: input.get_u16(),
        }
    }
}

/// Interpolated channel values of a segment at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSample {
    pub level: u16,
    pub hue: u16,
    pub saturation: u16,
    pub color_temperature: u16,
}

/// Current and animated appearance of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLightState {
    pub on: bool,
    /// Brightness 0-254
    pub level: u8,
    /// Degrees 0-360
    pub hue: u16,
    /// 0-254
    pub saturation: u8,
    pub color_mode: ColorMode,
    /// CIE x, 16-bit fixed point
    pub color_x: u16,
    /// CIE y, 16-bit fixed point
    pub color_y: u16,
    /// Mireds
    pub color_temperature: u16,
    pub power_on_behavior: PowerOnBehavior,
    /// Level, hue, saturation, color temperature; never persisted
    transitions: [Transition; 4],
}

impl Default for SegmentLightState {
    fn default() -> Self {
        Self::from_settings(&LightSettings::default(), PowerOnBehavior::default())
    }
}

impl SegmentLightState {
    pub fn from_settings(settings: &LightSettings, power_on_behavior: PowerOnBehavior) -> Self {
        let mut state = Self {
            on: false,
            level: 0,
            hue: 0,
            saturation: 0,
            color_mode: ColorMode::default(),
            color_x: 0,
            color_y: 0,
            color_temperature: 0,
            power_on_behavior,
            transitions: [Transition::new(0); 4],
        };
        state.apply_settings(settings);
        state
    }

    /// Settled settings without power-on behavior
    pub const fn settings(&self) -> LightSettings {
        LightSettings {
            on: self.on,
            level: self.level,
            hue: self.hue,
            saturation: self.saturation,
            color_mode: self.color_mode,
            color_x: self.color_x,
            color_y: self.color_y,
            color_temperature: self.color_temperature,
        }
    }

    /// Overwrite the settled settings, keeping power-on behavior and
    /// transitions untouched
    pub fn apply_settings(&mut self, settings: &LightSettings) {
        self.on = settings.on;
        self.level = settings.level;
        self.hue = settings.hue;
        self.saturation = settings.saturation;
        self.color_mode = settings.color_mode;
        self.color_x = settings.color_x;
        self.color_y = settings.color_y;
        self.color_temperature = settings.color_temperature;
    }

    /// Settled value backing a channel
    pub fn settled(&self, channel: LightChannel) -> u16 {
        self.settings().channel_value(channel)
    }

    pub const fn transition(&self, channel: LightChannel) -> &Transition {
        &self.transitions[channel.index()]
    }

    pub const fn transition_mut(&mut self, channel: LightChannel) -> &mut Transition {
        &mut self.transitions[channel.index()]
    }

    /// Read the interpolated value of every channel
    pub const fn sample(&self) -> ChannelSample {
        ChannelSample {
            level: self.transition(LightChannel::Level).value(),
            hue: self.transition(LightChannel::Hue).value(),
            saturation: self.transition(LightChannel::Saturation).value(),
            color_temperature: self.transition(LightChannel::ColorTemperature).value(),
        }
    }

    /// Snap every transition to its settled field
    pub fn seed_transitions(&mut self) {
        for channel in LightChannel::ALL {
            let value = self.settled(channel);
            self.transition_mut(channel).set_instant(value);
        }
    }

    /// Check if any channel is still moving
    pub fn is_animating(&self) -> bool {
        self.transitions.iter().any(Transition::is_active)
    }

    fn encode(&self, out: &mut RecordWriter<'_>) {
        self.settings().encode(out);
        out.put_u8(self.power_on_behavior as u8);
    }
}

/// Defaults applied to every segment by [`SegmentStore::new`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDefaults {
    pub level: u8,
    /// Mireds
    pub color_temperature: u16,
    pub power_on_behavior: PowerOnBehavior,
    /// Length of segment 0, which covers strip 0 from its first pixel
    pub base_count: u16,
}

impl Default for SegmentDefaults {
    fn default() -> Self {
        Self {
            level: 128,
            color_temperature: 250,
            power_on_behavior: PowerOnBehavior::RestorePrevious,
            base_count: 0,
        }
    }
}

/// Result of [`SegmentStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub geometry: LoadStatus,
    pub state: LoadStatus,
}

/// Geometry and light state of all segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentStore {
    geometry: [SegmentGeometry; MAX_SEGMENTS],
    states: [SegmentLightState; MAX_SEGMENTS],
    defaults: SegmentDefaults,
}

impl SegmentStore {
    /// Create the store with defaults
    pub fn new(defaults: &SegmentDefaults) -> Self {
        let mut store = Self {
            geometry: [SegmentGeometry::default(); MAX_SEGMENTS],
            states: core::array::from_fn(|_| SegmentLightState::default()),
            defaults: *defaults,
        };
        store.reset_geometry();
        store.reset_states();
        store
    }

    fn reset_geometry(&mut self) {
        self.geometry = [SegmentGeometry::default(); MAX_SEGMENTS];
        self.geometry[0] = SegmentGeometry::new(0, self.defaults.base_count, 0);
    }

    fn reset_states(&mut self) {
        let settings = LightSettings {
            level: self.defaults.level,
            color_temperature: self.defaults.color_temperature,
            ..LightSettings::default()
        };
        for state in &mut self.states {
            *state = SegmentLightState::from_settings(&settings, self.defaults.power_on_behavior);
        }
    }

    pub fn geometry(&self, segment: usize) -> Option<&SegmentGeometry> {
        self.geometry.get(segment)
    }

    pub fn geometry_mut(&mut self, segment: usize) -> Option<&mut SegmentGeometry> {
        self.geometry.get_mut(segment)
    }

    pub fn state(&self, segment: usize) -> Option<&SegmentLightState> {
        self.states.get(segment)
    }

    pub fn state_mut(&mut self, segment: usize) -> Option<&mut SegmentLightState> {
        self.states.get_mut(segment)
    }

    pub const fn geometries(&self) -> &[SegmentGeometry; MAX_SEGMENTS] {
        &self.geometry
    }

    pub const fn states(&self) -> &[SegmentLightState; MAX_SEGMENTS] {
        &self.states
    }

    /// Segments paired with their state, in layer order
    pub fn iter(&self) -> impl Iterator<Item = (&SegmentGeometry, &SegmentLightState)> {
        self.geometry.iter().zip(self.states.iter())
    }

    /// Settled settings of every segment
    pub fn settings(&self) -> [LightSettings; MAX_SEGMENTS] {
        core::array::from_fn(|i| self.states[i].settings())
    }

    /// Handles of every embedded transition
    #[allow(clippy::cast_possible_truncation)]
    pub fn transition_ids() -> impl Iterator<Item = TransitionId> {
        (0..MAX_SEGMENTS).flat_map(|segment| {
            LightChannel::ALL
                .into_iter()
                .map(move |channel| TransitionId::new(segment as u8, channel))
        })
    }

    /// Seed every transition from the settled fields
    ///
    /// Call once after [`SegmentStore::load`] and before the first tick.
    pub fn init_transitions_from_state(&mut self) {
        for state in &mut self.states {
            state.seed_transitions();
        }
    }

    /// Apply every segment's power-on behavior to its on/off state
    pub fn apply_power_on_behavior(&mut self) {
        for state in &mut self.states {
            state.on = state.power_on_behavior.apply(state.on);
        }
    }

    /// Load geometry and light state
    ///
    /// Never fails: unusable records keep the defaults, records written by
    /// older firmware are migrated.
    pub fn load<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> LoadReport {
        LoadReport {
            geometry: self.load_geometry(storage),
            state: self.load_states(storage),
        }
    }

    fn load_geometry<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> LoadStatus {
        // Room for records up to twice the current size
        let mut buf = [0u8; GEOMETRY_BLOB_LEN * 2];
        let len = match storage.load(KEY_GEOMETRY, &mut buf) {
            Ok(len) => len,
            Err(_err) => {
                #[cfg(feature = "esp32-log")]
                if _err != StorageError::NotFound {
                    println!("[SegmentStore.load] geometry load failed: {}", _err);
                }
                return LoadStatus::Defaults;
            }
        };

        let record_len = len / MAX_SEGMENTS;
        if len > buf.len() || len % MAX_SEGMENTS != 0 || record_len < GEOMETRY_RECORD_LEN {
            #[cfg(feature = "esp32-log")]
            println!(
                "[SegmentStore.load] geometry blob has {} bytes, using defaults",
                len
            );
            self.reset_geometry();
            return LoadStatus::Defaults;
        }

        for (geometry, record) in self.geometry.iter_mut().zip(buf[..len].chunks_exact(record_len)) {
            *geometry = SegmentGeometry::decode(&mut RecordReader::new(record));
        }

        if record_len == GEOMETRY_RECORD_LEN {
            LoadStatus::Loaded
        } else {
            #[cfg(feature = "esp32-log")]
            println!(
                "[SegmentStore.load] migrated geometry records of {} bytes to {}",
                record_len, GEOMETRY_RECORD_LEN
            );
            LoadStatus::Migrated(record_len)
        }
    }

    fn load_states<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> LoadStatus {
        // Room for records up to twice the current size
        let mut buf = [0u8; STATE_BLOB_LEN * 2];
        let len = match storage.load(KEY_STATE, &mut buf) {
            Ok(len) => len,
            Err(_err) => {
                #[cfg(feature = "esp32-log")]
                if _err != StorageError::NotFound {
                    println!("[SegmentStore.load] state load failed: {}", _err);
                }
                return LoadStatus::Defaults;
            }
        };

        let record_len = len / MAX_SEGMENTS;
        if len > buf.len() || len % MAX_SEGMENTS != 0 || record_len < SETTINGS_RECORD_LEN {
            #[cfg(feature = "esp32-log")]
            println!(
                "[SegmentStore.load] state blob has {} bytes, using defaults",
                len
            );
            return LoadStatus::Defaults;
        }

        for (state, record) in self.states.iter_mut().zip(buf[..len].chunks_exact(record_len)) {
            let mut input = RecordReader::new(record);
            state.apply_settings(&LightSettings::decode(&mut input));
            state.power_on_behavior = if input.remaining() > 0 {
                PowerOnBehavior::from_raw(input.get_u8())
            } else {
                self.defaults.power_on_behavior
            };
        }

        if record_len == STATE_RECORD_LEN {
            LoadStatus::Loaded
        } else {
            #[cfg(feature = "esp32-log")]
            println!(
                "[SegmentStore.load] migrated state records of {} bytes to {}",
                record_len, STATE_RECORD_LEN
            );
            LoadStatus::Migrated(record_len)
        }
    }

    /// Save geometry and light state in the current layout
    ///
    /// Both records are attempted; the first failure is returned.
    pub fn save<S: PersistentStore + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        let mut geometry = [0u8; GEOMETRY_BLOB_LEN];
        let mut out = RecordWriter::new(&mut geometry);
        for segment in &self.geometry {
            segment.encode(&mut out);
        }
        let geometry_result = storage.save(KEY_GEOMETRY, &geometry);

        let mut states = [0u8; STATE_BLOB_LEN];
        let mut out = RecordWriter::new(&mut states);
        for state in &self.states {
            state.encode(&mut out);
        }
        let state_result = storage.save(KEY_STATE, &states);

        geometry_result.and(state_result)
    }
}

impl TransitionStore for SegmentStore {
    type Id = TransitionId;

    fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.states
            .get(usize::from(id.segment))
            .map(|state| state.transition(id.channel))
    }

    fn transition_mut(&mut self, id: TransitionId) -> Option<&mut Transition> {
        self.states
            .get_mut(usize::from(id.segment))
            .map(|state| state.transition_mut(id.channel))
    }

    fn start_transition(
        &mut self,
        id: TransitionId,
        target: u16,
        duration: Duration,
        now: Instant,
    ) {
        let Some(transition) = self.transition_mut(id) else {
            return;
        };
        if id.channel == LightChannel::Hue {
            crate::color::start_hue_transition(transition, target, duration, now);
        } else {
            transition.start(target, duration, now);
        }
    }
}
