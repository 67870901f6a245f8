//! Commands from other execution contexts
//!
//! Protocol handlers never touch segment state directly. They validate
//! their input through a [`LightHandle`] and queue a [`Command`], which the
//! [`Controller`](crate::Controller) applies at the start of its next tick.

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channel::{Channel, Receiver, Sender};
use crate::config::MAX_STRIP_LENGTH;
use crate::controller::ControlError;
use crate::preset::{MAX_PRESETS, PresetError, PresetName};
use crate::segment::{
    ColorMode, LightChannel, MAX_SEGMENTS, MAX_STRIPS, PowerOnBehavior, SegmentGeometry,
};

/// State change queued for the periodic context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move one channel to a new value; `None` picks the channel's default
    /// duration
    SetTarget {
        segment: u8,
        channel: LightChannel,
        value: u16,
        duration: Option<Duration>,
    },
    SetOn {
        segment: u8,
        on: bool,
    },
    SetColorMode {
        segment: u8,
        mode: ColorMode,
    },
    SetColorXy {
        segment: u8,
        x: u16,
        y: u16,
    },
    SetPowerOnBehavior {
        segment: u8,
        behavior: PowerOnBehavior,
    },
    SetGeometry {
        segment: u8,
        geometry: SegmentGeometry,
    },
    SetGlobalTransition(Duration),
    /// Takes effect after restart
    SetStripLength {
        strip: u8,
        length: u16,
    },
    RecallPreset(u8),
    /// `None` uses the pending save name, then `"Preset N"`
    SavePreset {
        slot: u8,
        name: Option<PresetName>,
    },
    DeletePreset(u8),
    /// Name for the next unnamed save; empty clears it
    SetPresetSaveName(PresetName),
    RecallPresetByName(PresetName),
    SavePresetByName(PresetName),
    DeletePresetByName(PresetName),
}

pub(crate) const fn check_segment(segment: u8) -> Result<usize, ControlError> {
    if (segment as usize) < MAX_SEGMENTS {
        Ok(segment as usize)
    } else {
        Err(ControlError::SegmentOutOfRange)
    }
}

pub(crate) const fn check_strip(strip: u8) -> Result<usize, ControlError> {
    if (strip as usize) < MAX_STRIPS {
        Ok(strip as usize)
    } else {
        Err(ControlError::StripOutOfRange)
    }
}

pub(crate) const fn check_slot(slot: u8) -> Result<usize, ControlError> {
    if (slot as usize) < MAX_PRESETS {
        Ok(slot as usize)
    } else {
        Err(ControlError::Preset(PresetError::InvalidSlot))
    }
}

pub(crate) const fn check_value(channel: LightChannel, value: u16) -> Result<u16, ControlError> {
    if channel.accepts(value) {
        Ok(value)
    } else {
        Err(ControlError::ValueOutOfRange)
    }
}

fn check_name(name: &str) -> Result<(), ControlError> {
    if name.is_empty() {
        Err(ControlError::Preset(PresetError::EmptyName))
    } else {
        Ok(())
    }
}

impl Command {
    /// Check indices and values without touching any state
    pub fn validate(&self) -> Result<(), ControlError> {
        match self {
            Self::SetTarget {
                segment,
                channel,
                value,
                ..
            } => {
                check_segment(*segment)?;
                check_value(*channel, *value)?;
            }
            Self::SetOn { segment, .. }
            | Self::SetColorMode { segment, .. }
            | Self::SetColorXy { segment, .. }
            | Self::SetPowerOnBehavior { segment, .. } => {
                check_segment(*segment)?;
            }
            Self::SetGeometry { segment, geometry } => {
                check_segment(*segment)?;
                check_strip(geometry.strip_id)?;
            }
            Self::SetGlobalTransition(_) | Self::SetPresetSaveName(_) => {}
            Self::SetStripLength { strip, length } => {
                check_strip(*strip)?;
                if *length > MAX_STRIP_LENGTH {
                    return Err(ControlError::ValueOutOfRange);
                }
            }
            Self::RecallPreset(slot) | Self::DeletePreset(slot) => {
                check_slot(*slot)?;
            }
            Self::SavePreset { slot, name } => {
                check_slot(*slot)?;
                if let Some(name) = name {
                    check_name(name)?;
                }
            }
            Self::RecallPresetByName(name)
            | Self::SavePresetByName(name)
            | Self::DeletePresetByName(name) => check_name(name)?,
        }
        Ok(())
    }
}

/// Command queue between the protocol context and the controller
pub type CommandChannel<const SIZE: usize> = Channel<Command, SIZE>;

/// Producer side of a [`CommandChannel`]
pub type CommandSender<'a, const SIZE: usize> = Sender<'a, Command, SIZE>;

/// Consumer side of a [`CommandChannel`]
pub type CommandReceiver<'a, const SIZE: usize> = Receiver<'a, Command, SIZE>;

/// Validating front end of the command queue
///
/// Every method rejects bad input synchronously and never blocks.
#[derive(Clone, Copy)]
pub struct LightHandle<'a, const SIZE: usize> {
    sender: CommandSender<'a, SIZE>,
}

impl<'a, const SIZE: usize> LightHandle<'a, SIZE> {
    pub const fn new(sender: CommandSender<'a, SIZE>) -> Self {
        Self { sender }
    }

    /// Validate and queue a command
    pub fn send(&self, command: Command) -> Result<(), ControlError> {
        command.validate()?;
        self.sender.try_send(command).map_err(|_| {
            #[cfg(feature = "esp32-log")]
            println!("[LightHandle.send] command queue full");
            ControlError::QueueFull
        })
    }

    pub fn set_target(
        &self,
        segment: u8,
        channel: LightChannel,
        value: u16,
        duration: Option<Duration>,
    ) -> Result<(), ControlError> {
        self.send(Command::SetTarget {
            segment,
            channel,
            value,
            duration,
        })
    }

    pub fn set_on(&self, segment: u8, on: bool) -> Result<(), ControlError> {
        self.send(Command::SetOn { segment, on })
    }

    pub fn set_level(&self, segment: u8, level: u8) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::Level, u16::from(level), None)
    }

    pub fn set_hue(&self, segment: u8, hue: u16) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::Hue, hue, None)
    }

    pub fn set_saturation(&self, segment: u8, saturation: u8) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::Saturation, u16::from(saturation), None)
    }

    pub fn set_color_temperature(&self, segment: u8, mireds: u16) -> Result<(), ControlError> {
        self.set_target(segment, LightChannel::ColorTemperature, mireds, None)
    }

    pub fn set_color_mode(&self, segment: u8, mode: ColorMode) -> Result<(), ControlError> {
        self.send(Command::SetColorMode { segment, mode })
    }

    pub fn set_color_xy(&self, segment: u8, x: u16, y: u16) -> Result<(), ControlError> {
        self.send(Command::SetColorXy { segment, x, y })
    }

    pub fn set_power_on_behavior(
        &self,
        segment: u8,
        behavior: PowerOnBehavior,
    ) -> Result<(), ControlError> {
        self.send(Command::SetPowerOnBehavior { segment, behavior })
    }

    pub fn set_geometry(&self, segment: u8, geometry: SegmentGeometry) -> Result<(), ControlError> {
        self.send(Command::SetGeometry { segment, geometry })
    }

    pub fn set_global_transition(&self, duration: Duration) -> Result<(), ControlError> {
        self.send(Command::SetGlobalTransition(duration))
    }

    pub fn set_strip_length(&self, strip: u8, length: u16) -> Result<(), ControlError> {
        self.send(Command::SetStripLength { strip, length })
    }

    pub fn recall_preset(&self, slot: u8) -> Result<(), ControlError> {
        self.send(Command::RecallPreset(slot))
    }

    pub fn save_preset(&self, slot: u8, name: Option<&str>) -> Result<(), ControlError> {
        let name = name.map(preset_name).transpose()?;
        self.send(Command::SavePreset { slot, name })
    }

    pub fn delete_preset(&self, slot: u8) -> Result<(), ControlError> {
        self.send(Command::DeletePreset(slot))
    }

    /// Longer names are cut to the preset name limit
    pub fn set_preset_save_name(&self, name: &str) -> Result<(), ControlError> {
        self.send(Command::SetPresetSaveName(truncated_name(name)))
    }

    pub fn recall_preset_by_name(&self, name: &str) -> Result<(), ControlError> {
        self.send(Command::RecallPresetByName(preset_name(name)?))
    }

    pub fn save_preset_by_name(&self, name: &str) -> Result<(), ControlError> {
        self.send(Command::SavePresetByName(preset_name(name)?))
    }

    pub fn delete_preset_by_name(&self, name: &str) -> Result<(), ControlError> {
        self.send(Command::DeletePresetByName(preset_name(name)?))
    }
}

fn preset_name(name: &str) -> Result<PresetName, ControlError> {
    check_name(name)?;
    PresetName::try_from(name).map_err(|()| ControlError::Preset(PresetError::NameTooLong))
}

/// Cut `name` to the longest prefix that fits, on a char boundary
pub(crate) fn truncated_name(name: &str) -> PresetName {
    let mut out = PresetName::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
