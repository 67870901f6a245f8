mod cie;
mod hsv;
mod hue;

pub use cie::{D65_WHITE_X, D65_WHITE_Y, rgb_to_xy, xy_to_rgb};
pub use hsv::hsv_to_rgb;
pub use hue::{
    degrees_to_enhanced_hue, enhanced_hue_to_degrees, normalize_hue, shortest_arc,
    start_hue_transition,
};
use smart_leds::RGB8;

pub type Rgb = RGB8;

/// Color of a single RGBW pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    /// All channels off
    pub const OFF: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Only the white channel lit
    pub const fn white(w: u8) -> Self {
        Self::new(0, 0, 0, w)
    }

    /// Color channels only, white off
    pub const fn from_rgb(rgb: Rgb) -> Self {
        Self::new(rgb.r, rgb.g, rgb.b, 0)
    }

    /// Drop the white channel
    pub const fn rgb(self) -> Rgb {
        Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    pub const fn is_off(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.w == 0
    }
}

impl From<Rgb> for Rgbw {
    fn from(rgb: Rgb) -> Self {
        Self::from_rgb(rgb)
    }
}
