use super::{Rgb, normalize_hue};

/// Saturation at which a color is fully saturated.
const SATURATION_MAX: u32 = 254;

/// Convert HSV to RGB
///
/// # Arguments
/// * `hue` - Degrees, wrapped values are normalized first
/// * `saturation` - 0-254, values above 254 count as 254
/// * `value` - 0-255
#[allow(clippy::cast_possible_truncation)]
pub fn hsv_to_rgb(hue: u16, saturation: u8, value: u8) -> Rgb {
    if saturation == 0 {
        return Rgb {
            r: value,
            g: value,
            b: value,
        };
    }

    let hue = normalize_hue(hue);
    let s = u32::from(saturation).min(SATURATION_MAX);
    let v = u32::from(value);

    let region = hue / 60;
    // 0..=354 within the region
    let remainder = u32::from(hue - region * 60) * 6;

    let scale = |amount: u32| -> u8 { ((v * (SATURATION_MAX - amount)) / SATURATION_MAX) as u8 };
    let p = scale(s);
    let q = scale(s * remainder / 360);
    let t = scale(s * (360 - remainder) / 360);

    let (r, g, b) = match region {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    Rgb { r, g, b }
}
