//! Shared fakes for the integration tests

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::vec::Vec;

use myrtio_segment_controller::{PersistentStore, Rgbw, StorageError, StripDriver};

/// In-memory byte-blob store
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, Vec<u8>>,
    /// Every `save` and `erase` fails while set
    pub fail_writes: bool,
    pub saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, data: &[u8]) {
        self.blobs.insert(key.to_string(), data.to_vec());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }
}

impl PersistentStore for MemoryStore {
    fn load(&mut self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let blob = self.blobs.get(key).ok_or(StorageError::NotFound)?;
        let len = blob.len().min(buf.len());
        buf[..len].copy_from_slice(&blob[..len]);
        Ok(blob.len())
    }

    fn save(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        self.saves += 1;
        self.insert(key, data);
        Ok(())
    }

    fn erase(&mut self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        self.blobs.remove(key).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

/// Strip driver keeping the last flushed frame of each strip
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pending: [Vec<Rgbw>; 2],
    pub frames: [Vec<Rgbw>; 2],
    pub flushes: usize,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixel(&self, strip: usize, index: usize) -> Rgbw {
        self.frames[strip][index]
    }
}

impl StripDriver for RecordingDriver {
    fn write_pixel(&mut self, strip: u8, index: u16, color: Rgbw) {
        let buffer = &mut self.pending[usize::from(strip)];
        let index = usize::from(index);
        if buffer.len() <= index {
            buffer.resize(index + 1, Rgbw::OFF);
        }
        buffer[index] = color;
    }

    fn clear(&mut self, strip: u8) {
        self.pending[usize::from(strip)].fill(Rgbw::OFF);
    }

    fn flush(&mut self) {
        self.frames = self.pending.clone();
        self.flushes += 1;
    }
}
