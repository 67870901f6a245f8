//! CIE 1931 xy chromaticity conversion
//!
//! Chromaticity coordinates are carried as 16-bit fixed point where
//! `65535` represents `1.0`.

use super::Rgb;

/// D65 white point x, returned for black input.
pub const D65_WHITE_X: f32 = 0.312_71;
/// D65 white point y, returned for black input.
pub const D65_WHITE_Y: f32 = 0.329_02;

const FIXED_ONE: f32 = 65535.0;
const MIN_CHROMATICITY_Y: f32 = 0.000_01;

/// sRGB to linear light
fn gamma_expand(value: u8) -> f32 {
    let v = f32::from(value) / 255.0;
    if v <= 0.040_45 {
        v / 12.92
    } else {
        libm::powf((v + 0.055) / 1.055, 2.4)
    }
}

/// Linear light to sRGB
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn gamma_compress(value: f32) -> u8 {
    if value <= 0.0 {
        return 0;
    }
    if value >= 1.0 {
        return 255;
    }
    let v = if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * libm::powf(value, 1.0 / 2.4) - 0.055
    };
    (v * 255.0 + 0.5) as u8
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_fixed(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * FIXED_ONE + 0.5) as u16
}

/// Convert an sRGB color to CIE xy chromaticity
///
/// Black has no chromaticity and maps to the D65 white point.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rgb_to_xy(r: u8, g: u8, b: u8) -> (u16, u16) {
    let r = gamma_expand(r);
    let g = gamma_expand(g);
    let b = gamma_expand(b);

    // sRGB -> XYZ, D65
    let x = r * 0.412_456_4 + g * 0.357_576_1 + b * 0.180_437_5;
    let y = r * 0.212_672_9 + g * 0.715_152_2 + b * 0.072_175_0;
    let z = r * 0.019_333_9 + g * 0.119_192_0 + b * 0.950_304_1;

    let sum = x + y + z;
    if sum < 0.000_01 {
        return (
            (D65_WHITE_X * FIXED_ONE) as u16,
            (D65_WHITE_Y * FIXED_ONE) as u16,
        );
    }

    (to_fixed(x / sum), to_fixed(y / sum))
}

/// Convert CIE xy chromaticity to sRGB at the given brightness
///
/// `level` (0-255) is used as luminance. Components outside the sRGB gamut
/// are clipped at zero and the result is scaled down so that the largest
/// component fits, which keeps the hue of saturated colors.
pub fn xy_to_rgb(x: u16, y: u16, level: u8) -> Rgb {
    let cx = f32::from(x) / FIXED_ONE;
    let cy = (f32::from(y) / FIXED_ONE).max(MIN_CHROMATICITY_Y);
    let cz = 1.0 - cx - cy;

    let luminance = f32::from(level) / 255.0;
    let big_x = (luminance / cy) * cx;
    let big_z = (luminance / cy) * cz;

    // XYZ -> sRGB, D65
    let mut r = big_x * 3.240_454_2 + luminance * -1.537_138_5 + big_z * -0.498_531_4;
    let mut g = big_x * -0.969_266_0 + luminance * 1.876_010_8 + big_z * 0.041_556_0;
    let mut b = big_x * 0.055_643_4 + luminance * -0.204_025_9 + big_z * 1.057_225_2;

    r = r.max(0.0);
    g = g.max(0.0);
    b = b.max(0.0);

    let peak = r.max(g).max(b);
    if peak > 1.0 {
        r /= peak;
        g /= peak;
        b /= peak;
    }

    Rgb {
        r: gamma_compress(r.min(1.0)),
        g: gamma_compress(g.min(1.0)),
        b: gamma_compress(b.min(1.0)),
    }
}
