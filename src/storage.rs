//! Persistence plumbing
//!
//! Records are stored as little-endian byte blobs under short keys. Every
//! reader has to cope with blobs written by older firmware, so decoding is
//! driven by the stored size rather than by a version field.

use core::fmt;

use embassy_time::{Duration, Instant};

/// Key of the segment geometry blob.
pub const KEY_GEOMETRY: &str = "seg_geom";
/// Key of the segment light state blob.
pub const KEY_STATE: &str = "seg_state";
/// Key of the device settings blob.
pub const KEY_DEVICE: &str = "dev_cfg";
/// Keys of the preset slots.
pub const KEY_PRESETS: [&str; 8] = [
    "prst_0", "prst_1", "prst_2", "prst_3", "prst_4", "prst_5", "prst_6", "prst_7",
];

/// Default quiet period before a debounced save runs.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(500);

/// Error returned by a [`PersistentStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Nothing stored under the key
    NotFound,
    /// Backend failed to read, write or commit
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Io => write!(f, "storage i/o failure"),
        }
    }
}

/// Byte-blob key/value storage
///
/// Implement this trait to support different flash backends.
pub trait PersistentStore {
    /// Read the blob stored under `key` into `buf`
    ///
    /// Returns the full stored length. When the blob is longer than `buf`,
    /// only the first `buf.len()` bytes are copied.
    fn load(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Replace the blob stored under `key`
    fn save(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Remove the blob stored under `key`
    fn erase(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Outcome of loading one persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Stored in the current layout
    Loaded,
    /// Stored in another layout and converted; holds the stored record size
    Migrated(usize),
    /// Nothing usable stored, defaults kept
    Defaults,
}

/// Sequential little-endian writer over a fixed buffer
///
/// Writes past the end of the buffer are dropped.
pub(crate) struct RecordWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> RecordWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        if let Some(slot) = self.buf.get_mut(self.pos) {
            *slot = value;
        }
        self.pos += 1;
    }

    pub(crate) fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    pub(crate) fn put_u16(&mut self, value: u16) {
        for byte in value.to_le_bytes() {
            self.put_u8(byte);
        }
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put_u8(byte);
        }
    }
}

/// Sequential little-endian reader
///
/// Reads past the end yield zero, which is how fields added after a record
/// was written come out.
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn get_u8(&mut self) -> u8 {
        let value = self.buf.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        value
    }

    pub(crate) fn get_bool(&mut self) -> bool {
        self.get_u8() != 0
    }

    pub(crate) fn get_u16(&mut self) -> u16 {
        u16::from_le_bytes([self.get_u8(), self.get_u8()])
    }

    pub(crate) fn get_bytes<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0; N];
        for byte in &mut out {
            *byte = self.get_u8();
        }
        out
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }
}

/// Restart-on-write save timer
///
/// Every [`SaveDebouncer::schedule`] pushes the deadline to `now + delay`,
/// so a burst of changes produces a single save once things go quiet.
#[derive(Debug, Clone, Copy)]
pub struct SaveDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm or re-arm the timer
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now.checked_add(self.delay).unwrap_or(now));
    }

    /// Drop a pending save
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Check if a save is waiting
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time at which the pending save becomes due
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once when the deadline has passed and disarms
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
