use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Converts `0x00RRGGBB` raw values to RGB565 display colors.
///
/// One input color can be keyed out as transparent. The conversion itself
/// never changes, so only transparency edits mark the converter as changed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColorConverter {
    transparent_color: Option<u32>,
    needs_refresh: bool,
}

impl ColorConverter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            transparent_color: None,
            needs_refresh: false,
        }
    }

    /// Display color for `raw`, `None` when it matches the transparent key.
    #[must_use]
    pub fn convert(&self, raw: u32) -> Option<Color> {
        if self.transparent_color == Some(raw) {
            return None;
        }
        Some(Color::from_rgb888(raw))
    }

    /// Keys out `rgb888`. Replaces any previous key.
    pub const fn make_transparent(&mut self, rgb888: u32) {
        self.transparent_color = Some(rgb888);
        self.needs_refresh = true;
    }

    /// Removes the transparent key.
    pub const fn make_opaque(&mut self) {
        self.transparent_color = None;
        self.needs_refresh = true;
    }

    #[must_use]
    pub const fn transparent_color(&self) -> Option<u32> {
        self.transparent_color
    }

    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub const fn finish_refresh(&mut self) {
        self.needs_refresh = false;
    }
}
