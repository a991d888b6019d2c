use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette index {index} out of range for {len} colors")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PaletteEntry {
    /// Color as it was set, `0x00RRGGBB`.
    rgb888: u32,
    /// Cached display color.
    color: Color,
    transparent: bool,
}

/// Maps small indices to display colors.
///
/// Any edit marks the palette as changed so every sprite using it redraws on
/// the next refresh.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    needs_refresh: bool,
}

impl Palette {
    /// Creates a palette of `color_count` opaque black entries.
    #[must_use]
    pub fn new(color_count: usize) -> Self {
        Self {
            entries: vec![PaletteEntry::default(); color_count],
            needs_refresh: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `0x00RRGGBB` color stored at `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is outside the palette.
    pub fn color(&self, index: usize) -> Result<u32, PaletteError> {
        self.entry(index).map(|entry| entry.rgb888)
    }

    /// Stores `rgb888` (`0x00RRGGBB`) at `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is outside the palette.
    pub fn set_color(&mut self, index: usize, rgb888: u32) -> Result<(), PaletteError> {
        let entry = self.entry_mut(index)?;
        entry.rgb888 = rgb888;
        entry.color = Color::from_rgb888(rgb888);
        self.needs_refresh = true;
        Ok(())
    }

    /// Makes pixels using `index` disappear.
    ///
    /// # Errors
    ///
    /// Fails when `index` is outside the palette.
    pub fn make_transparent(&mut self, index: usize) -> Result<(), PaletteError> {
        self.entry_mut(index)?.transparent = true;
        self.needs_refresh = true;
        Ok(())
    }

    /// Undoes [`Palette::make_transparent`].
    ///
    /// # Errors
    ///
    /// Fails when `index` is outside the palette.
    pub fn make_opaque(&mut self, index: usize) -> Result<(), PaletteError> {
        self.entry_mut(index)?.transparent = false;
        self.needs_refresh = true;
        Ok(())
    }

    #[must_use]
    pub fn is_transparent(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|entry| entry.transparent)
    }

    /// Display color for a raw value, `None` when the value is outside the
    /// palette or its entry is transparent.
    #[must_use]
    pub fn get_color(&self, raw: u32) -> Option<Color> {
        let entry = self.entries.get(usize::try_from(raw).ok()?)?;
        (!entry.transparent).then_some(entry.color)
    }

    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub const fn finish_refresh(&mut self) {
        self.needs_refresh = false;
    }

    fn entry(&self, index: usize) -> Result<&PaletteEntry, PaletteError> {
        let len = self.entries.len();
        self.entries
            .get(index)
            .ok_or(PaletteError::IndexOutOfRange { index, len })
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut PaletteEntry, PaletteError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(PaletteError::IndexOutOfRange { index, len })
    }
}
