//! Segment composition
//!
//! Every frame the renderer reads each segment's interpolated channel values,
//! converts them to RGBW and paints them onto the physical strip buffers in
//! index order. Segment 0 is the base layer, segment 7 the topmost overlay.

use crate::bounds::{RenderingBounds, bounded};
use crate::color::{Rgbw, hsv_to_rgb, xy_to_rgb};
use crate::segment::{ColorMode, LEVEL_MAX, MAX_STRIPS, SegmentLightState, SegmentStore};
use crate::StripDriver;

#[allow(clippy::cast_possible_truncation)]
fn to_u8(value: u16) -> u8 {
    value.min(u16::from(u8::MAX)) as u8
}

#[allow(clippy::cast_possible_truncation)]
fn scale_level(channel: u8, level: u8) -> u8 {
    (u16::from(channel) * u16::from(level.min(LEVEL_MAX)) / u16::from(LEVEL_MAX)) as u8
}

/// Output color of one segment from its in-flight channel values
pub fn segment_color(state: &SegmentLightState) -> Rgbw {
    if !state.on {
        return Rgbw::OFF;
    }

    let sample = state.sample();
    let level = to_u8(sample.level);

    match state.color_mode {
        ColorMode::ColorTemperature => Rgbw::white(level),
        ColorMode::EnhancedHue => {
            Rgbw::from_rgb(hsv_to_rgb(sample.hue, to_u8(sample.saturation), level))
        }
        ColorMode::Xy => {
            let rgb = xy_to_rgb(state.color_x, state.color_y, u8::MAX);
            Rgbw::new(
                scale_level(rgb.r, level),
                scale_level(rgb.g, level),
                scale_level(rgb.b, level),
                0,
            )
        }
    }
}

/// Frame buffers of the physical strips
pub struct Renderer<const MAX_LEDS: usize> {
    frames: [[Rgbw; MAX_LEDS]; MAX_STRIPS],
    lengths: [u16; MAX_STRIPS],
}

impl<const MAX_LEDS: usize> Renderer<MAX_LEDS> {
    /// Create a renderer for strips of the given lengths
    ///
    /// Lengths above `MAX_LEDS` are cut down to it.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(strip_lengths: [u16; MAX_STRIPS]) -> Self {
        let max = MAX_LEDS.min(usize::from(u16::MAX)) as u16;
        Self {
            frames: [[Rgbw::OFF; MAX_LEDS]; MAX_STRIPS],
            lengths: strip_lengths.map(|len| len.min(max)),
        }
    }

    /// Pixel count of a strip, zero for unknown strips
    pub fn strip_len(&self, strip: usize) -> u16 {
        self.lengths.get(strip).copied().unwrap_or(0)
    }

    /// Composed pixels of a strip
    pub fn frame(&self, strip: usize) -> &[Rgbw] {
        match self.frames.get(strip) {
            Some(frame) => &frame[..usize::from(self.lengths[strip])],
            None => &[],
        }
    }

    /// Compose every segment onto cleared strip buffers
    pub fn compose(&mut self, segments: &SegmentStore) {
        for frame in &mut self.frames {
            frame.fill(Rgbw::OFF);
        }

        for (geometry, state) in segments.iter() {
            if !geometry.is_enabled() {
                continue;
            }
            let strip = usize::from(geometry.strip_id);
            let Some(frame) = self.frames.get_mut(strip) else {
                continue;
            };
            let bounds =
                RenderingBounds::clamped(geometry.start, geometry.count, self.lengths[strip]);
            bounded(frame, bounds).fill(segment_color(state));
        }
    }

    /// Hand both strip buffers to the driver and transmit once
    #[allow(clippy::cast_possible_truncation)]
    pub fn flush<D: StripDriver + ?Sized>(&self, driver: &mut D) {
        for strip in 0..MAX_STRIPS {
            let id = strip as u8;
            driver.clear(id);
            for (index, pixel) in self.frame(strip).iter().enumerate() {
                driver.write_pixel(id, index as u16, *pixel);
            }
        }
        driver.flush();
    }

    /// Compose and flush one frame
    pub fn render<D: StripDriver + ?Sized>(&mut self, segments: &SegmentStore, driver: &mut D) {
        self.compose(segments);
        self.flush(driver);
    }
}
