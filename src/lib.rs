#![no_std]

pub mod bounds;
pub mod channel;
pub mod color;
pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod frame_scheduler;
pub mod preset;
pub mod renderer;
pub mod segment;
pub mod storage;
pub mod transition;

pub use command::{Command, CommandChannel, CommandReceiver, CommandSender, LightHandle};
pub use config::{ControllerConfig, DeviceSettings};
pub use controller::{ControlError, Controller, StartupReport, TickEffects};
pub use engine::{EngineError, TransitionEngine, TransitionStore};
pub use frame_scheduler::{FrameResult, FrameScheduler};
pub use preset::{Preset, PresetError, PresetName, PresetStore};
pub use renderer::Renderer;
pub use segment::{
    ColorMode, LightChannel, LightSettings, PowerOnBehavior, SegmentGeometry, SegmentLightState,
    SegmentStore,
};
pub use storage::{LoadStatus, PersistentStore, SaveDebouncer, StorageError};
pub use transition::Transition;

pub use color::{Rgb, Rgbw};
pub use embassy_time::{Duration, Instant};

/// Physical strip output
///
/// Implement this trait to support different LED hardware. Pixels written
/// between two [`StripDriver::flush`] calls belong to the same frame.
pub trait StripDriver {
    /// Set one pixel of a strip's output buffer
    fn write_pixel(&mut self, strip: u8, index: u16, color: Rgbw);

    /// Turn every pixel of a strip's output buffer off
    fn clear(&mut self, strip: u8);

    /// Transmit both strips
    fn flush(&mut self);
}
