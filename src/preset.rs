//! Named snapshots of every segment's settled light settings

use core::fmt::{self, Write};

use heapless::String;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::segment::{LightSettings, MAX_SEGMENTS, SETTINGS_RECORD_LEN, SegmentStore};
use crate::storage::{KEY_PRESETS, PersistentStore, RecordReader, RecordWriter, StorageError};

/// Number of preset slots.
pub const MAX_PRESETS: usize = 8;
/// Maximum preset name length in bytes.
pub const PRESET_NAME_MAX: usize = 16;

/// Name length byte plus the padded name.
const PRESET_HEADER_LEN: usize = 1 + PRESET_NAME_MAX;
/// Encoded size of one preset slot.
pub const PRESET_RECORD_LEN: usize = PRESET_HEADER_LEN + SETTINGS_RECORD_LEN * MAX_SEGMENTS;

/// Preset name
pub type PresetName = String<PRESET_NAME_MAX>;

/// Error returned by preset operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetError {
    /// Slot index is not below [`MAX_PRESETS`]
    InvalidSlot,
    /// Slot holds no preset
    EmptySlot,
    /// Name is empty
    EmptyName,
    /// Name is longer than [`PRESET_NAME_MAX`] bytes
    NameTooLong,
    /// No preset has the given name
    NotFound,
    /// Every slot is taken
    Full,
    /// The in-memory change was applied but could not be persisted
    Storage(StorageError),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSlot => write!(f, "preset slot out of range"),
            Self::EmptySlot => write!(f, "preset slot is empty"),
            Self::EmptyName => write!(f, "preset name is empty"),
            Self::NameTooLong => write!(f, "preset name longer than {PRESET_NAME_MAX} bytes"),
            Self::NotFound => write!(f, "preset not found"),
            Self::Full => write!(f, "all preset slots are in use"),
            Self::Storage(err) => write!(f, "preset storage failed: {err}"),
        }
    }
}

impl From<StorageError> for PresetError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// One preset slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preset {
    /// Empty for an unused slot
    pub name: PresetName,
    pub settings: [LightSettings; MAX_SEGMENTS],
}

impl Preset {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self, buf: &mut [u8; PRESET_RECORD_LEN]) {
        let mut out = RecordWriter::new(buf);
        let name = self.name.as_bytes();
        out.put_u8(name.len() as u8);
        out.put_bytes(name);
        out.put_bytes(&[0; PRESET_NAME_MAX][name.len()..]);
        for settings in &self.settings {
            settings.encode(&mut out);
        }
    }

    /// Decode a stored slot of any supported size
    ///
    /// Settings records longer than the current layout keep their known
    /// prefix. Returns `None` when the size or the name is unusable.
    fn decode(blob: &[u8]) -> Option<Self> {
        let (offset, record_len) = settings_layout(blob.len())?;

        let mut input = RecordReader::new(blob);
        let len = usize::from(input.get_u8());
        let raw = input.get_bytes::<PRESET_NAME_MAX>();
        if len == 0 || len > PRESET_NAME_MAX {
            return None;
        }
        let name = core::str::from_utf8(&raw[..len]).ok()?;
        let name = PresetName::try_from(name).ok()?;

        let mut records = blob[offset..].chunks_exact(record_len);
        let settings = core::array::from_fn(|_| {
            records
                .next()
                .map(|record| LightSettings::decode(&mut RecordReader::new(record)))
                .unwrap_or_default()
        });
        Some(Self { name, settings })
    }
}

/// Offset and size of the settings records in a slot blob of `len` bytes
///
/// The records may start right after the name or after one alignment byte.
fn settings_layout(len: usize) -> Option<(usize, usize)> {
    [PRESET_HEADER_LEN, PRESET_HEADER_LEN + 1]
        .into_iter()
        .filter(|&offset| len > offset && (len - offset) % MAX_SEGMENTS == 0)
        .map(|offset| (offset, (len - offset) / MAX_SEGMENTS))
        .find(|&(_, record_len)| record_len >= SETTINGS_RECORD_LEN)
}

fn validate_name(name: &str) -> Result<PresetName, PresetError> {
    if name.is_empty() {
        return Err(PresetError::EmptyName);
    }
    PresetName::try_from(name).map_err(|()| PresetError::NameTooLong)
}

/// Name shown for a slot without a stored name, 1-based
pub fn default_preset_name(slot: usize) -> PresetName {
    let mut name = PresetName::new();
    // "Preset 8" always fits
    let _ = write!(name, "Preset {}", slot + 1);
    name
}

/// Fixed set of preset slots
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    slots: [Preset; MAX_PRESETS],
    active: Option<usize>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every slot; unreadable slots stay empty
    pub fn load<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> usize {
        let mut buf = [0u8; PRESET_RECORD_LEN * 2];
        for (slot, key) in self.slots.iter_mut().zip(KEY_PRESETS) {
            *slot = match storage.load(key, &mut buf) {
                Ok(len) if len <= buf.len() => match Preset::decode(&buf[..len]) {
                    Some(preset) => preset,
                    None => {
                        #[cfg(feature = "esp32-log")]
                        println!("[PresetStore.load] {} is unreadable ({} bytes)", key, len);
                        Preset::default()
                    }
                },
                Ok(_len) => {
                    #[cfg(feature = "esp32-log")]
                    println!("[PresetStore.load] {} has {} bytes, too large", key, _len);
                    Preset::default()
                }
                Err(_) => Preset::default(),
            };
        }
        self.active = None;

        #[cfg(feature = "esp32-log")]
        println!("[PresetStore.load] {} presets loaded", self.count());

        self.count()
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    pub fn preset(&self, slot: usize) -> Option<&Preset> {
        self.slots.get(slot).filter(|preset| !preset.is_empty())
    }

    /// Stored name of an occupied slot
    pub fn name(&self, slot: usize) -> Option<&str> {
        self.preset(slot).map(|preset| preset.name.as_str())
    }

    /// Stored name, or `"Preset N"` for an empty slot
    pub fn display_name(&self, slot: usize) -> PresetName {
        self.preset(slot)
            .map_or_else(|| default_preset_name(slot), |preset| preset.name.clone())
    }

    /// Slot holding a preset with this exact name
    pub fn find(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.slots.iter().position(|slot| slot.name.as_str() == name)
    }

    /// Slot last recalled, cleared when that slot is deleted
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    /// Capture every segment's settings into a slot
    ///
    /// `None` names the slot `"Preset N"`. The slot is updated in memory
    /// even when persisting it fails.
    pub fn save<S: PersistentStore + ?Sized>(
        &mut self,
        slot: usize,
        name: Option<&str>,
        segments: &SegmentStore,
        storage: &mut S,
    ) -> Result<(), PresetError> {
        if slot >= MAX_PRESETS {
            return Err(PresetError::InvalidSlot);
        }
        let name = match name {
            Some(name) => validate_name(name)?,
            None => default_preset_name(slot),
        };

        let preset = &mut self.slots[slot];
        preset.name = name;
        preset.settings = segments.settings();

        let mut buf = [0u8; PRESET_RECORD_LEN];
        preset.encode(&mut buf);
        storage.save(KEY_PRESETS[slot], &buf).map_err(|err| {
            #[cfg(feature = "esp32-log")]
            println!("[PresetStore.save] slot {} not persisted: {}", slot, err);
            PresetError::Storage(err)
        })?;

        #[cfg(feature = "esp32-log")]
        println!("[PresetStore.save] slot {} saved as '{}'", slot, preset.name);

        Ok(())
    }

    /// Save under a name, reusing the slot that already has it or taking
    /// the first free one
    pub fn save_by_name<S: PersistentStore + ?Sized>(
        &mut self,
        name: &str,
        segments: &SegmentStore,
        storage: &mut S,
    ) -> Result<usize, PresetError> {
        validate_name(name)?;
        let slot = self
            .find(name)
            .or_else(|| self.slots.iter().position(Preset::is_empty))
            .ok_or(PresetError::Full)?;
        self.save(slot, Some(name), segments, storage)?;
        Ok(slot)
    }

    /// Settings stored in a slot; marks the slot active
    pub fn recall(&mut self, slot: usize) -> Result<&[LightSettings; MAX_SEGMENTS], PresetError> {
        let preset = self.slots.get(slot).ok_or(PresetError::InvalidSlot)?;
        if preset.is_empty() {
            return Err(PresetError::EmptySlot);
        }
        self.active = Some(slot);
        Ok(&preset.settings)
    }

    /// Empty a slot and erase its record
    pub fn delete<S: PersistentStore + ?Sized>(
        &mut self,
        slot: usize,
        storage: &mut S,
    ) -> Result<(), PresetError> {
        let preset = self.slots.get_mut(slot).ok_or(PresetError::InvalidSlot)?;
        if preset.is_empty() {
            return Err(PresetError::EmptySlot);
        }
        *preset = Preset::default();
        if self.active == Some(slot) {
            self.active = None;
        }

        match storage.erase(KEY_PRESETS[slot]) {
            Ok(()) | Err(StorageError::NotFound) => Ok(()),
            Err(err) => {
                #[cfg(feature = "esp32-log")]
                println!("[PresetStore.delete] slot {} not erased: {}", slot, err);
                Err(PresetError::Storage(err))
            }
        }
    }
}
