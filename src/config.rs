//! Controller configuration and persisted device settings

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::engine::DEFAULT_UPDATE_RATE_HZ;
use crate::segment::{MAX_STRIPS, SegmentDefaults};
use crate::storage::{
    DEFAULT_SAVE_DELAY, KEY_DEVICE, LoadStatus, PersistentStore, RecordReader, RecordWriter,
    StorageError,
};

/// Longest supported strip.
pub const MAX_STRIP_LENGTH: u16 = 500;
/// Length of the first strip when nothing is configured.
pub const DEFAULT_STRIP_LENGTH: u16 = 30;
/// Transition used for level and color temperature changes.
pub const DEFAULT_GLOBAL_TRANSITION: Duration = Duration::from_millis(100);

/// Encoded size of [`DeviceSettings`].
pub const DEVICE_RECORD_LEN: usize = 6;
/// Size of the first device settings layout, strip lengths only.
const LEGACY_DEVICE_RECORD_LEN: usize = 4;

/// Device settings that survive a restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Pixel count per physical strip, 0 disables the strip
    pub strip_lengths: [u16; MAX_STRIPS],
    /// Duration used for level and color temperature changes
    pub global_transition: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            strip_lengths: [DEFAULT_STRIP_LENGTH, 0],
            global_transition: DEFAULT_GLOBAL_TRANSITION,
        }
    }
}

impl DeviceSettings {
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&self) -> [u8; DEVICE_RECORD_LEN] {
        let mut buf = [0u8; DEVICE_RECORD_LEN];
        let mut out = RecordWriter::new(&mut buf);
        for len in self.strip_lengths {
            out.put_u16(len);
        }
        out.put_u16(self.global_transition.as_millis().min(u64::from(u16::MAX)) as u16);
        buf
    }

    /// Override fields with the stored record
    ///
    /// Strip lengths above [`MAX_STRIP_LENGTH`] keep their current value.
    pub fn load<S: PersistentStore + ?Sized>(&mut self, storage: &mut S) -> LoadStatus {
        let mut buf = [0u8; DEVICE_RECORD_LEN];
        let len = match storage.load(KEY_DEVICE, &mut buf) {
            Ok(len) => len,
            Err(_err) => {
                #[cfg(feature = "esp32-log")]
                if _err != StorageError::NotFound {
                    println!("[DeviceSettings.load] load failed: {}", _err);
                }
                return LoadStatus::Defaults;
            }
        };
        if len < LEGACY_DEVICE_RECORD_LEN {
            #[cfg(feature = "esp32-log")]
            println!("[DeviceSettings.load] record has {} bytes, using defaults", len);
            return LoadStatus::Defaults;
        }

        let mut input = RecordReader::new(&buf);
        for slot in &mut self.strip_lengths {
            let stored = input.get_u16();
            if stored <= MAX_STRIP_LENGTH {
                *slot = stored;
            }
        }
        if len >= DEVICE_RECORD_LEN {
            self.global_transition = Duration::from_millis(u64::from(input.get_u16()));
        }

        if len == DEVICE_RECORD_LEN {
            LoadStatus::Loaded
        } else {
            #[cfg(feature = "esp32-log")]
            println!("[DeviceSettings.load] migrated {}-byte record", len);
            LoadStatus::Migrated(len)
        }
    }

    pub fn save<S: PersistentStore + ?Sized>(&self, storage: &mut S) -> Result<(), StorageError> {
        storage.save(KEY_DEVICE, &self.encode())
    }
}

/// Configuration of a [`Controller`](crate::Controller)
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Device settings used when nothing is persisted
    pub device: DeviceSettings,
    /// Transition engine rate, 0 selects the default
    pub update_rate_hz: u16,
    /// Quiet period before changed state is saved
    pub save_delay: Duration,
    /// Animate hue and saturation with the supplied duration instead of
    /// snapping them
    pub color_transitions: bool,
    /// Per-segment defaults; `base_count` is replaced by the strip 0 length
    pub segments: SegmentDefaults,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
            save_delay: DEFAULT_SAVE_DELAY,
            color_transitions: false,
            segments: SegmentDefaults::default(),
        }
    }
}
