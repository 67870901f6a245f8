/// Bounds of a segment on a physical strip
///
/// Always lies within the strip it was clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderingBounds {
    pub start: u16,
    pub end: u16,
}

impl RenderingBounds {
    /// Clamp `start..start + count` to a strip of `strip_len` pixels
    pub const fn clamped(start: u16, count: u16, strip_len: u16) -> Self {
        let end = start.saturating_add(count);
        let end = if end > strip_len { strip_len } else { end };
        let start = if start > end { end } else { start };
        Self { start, end }
    }

    /// Get the number of LEDs in the rendering area
    pub const fn count(self) -> u16 {
        self.end - self.start
    }

    /// Check if no pixel is covered
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// Get a slice of the LEDs within the bounds
///
/// Bounds past the end of `leds` are cut short.
pub(crate) fn bounded<T>(leds: &mut [T], bounds: RenderingBounds) -> &mut [T] {
    let end = (bounds.end as usize).min(leds.len());
    let start = (bounds.start as usize).min(end);
    &mut leds[start..end]
}
