//! A positioned rectangle showing part of a [`PixelSource`].
//!
//! # Pixel pipeline
//!
//! ```text
//!  global (x, y)
//!       │  - position
//!       ▼
//!  local (x, y) ──► outside 0..width × 0..height ──► None
//!       │
//!       ▼
//!  PixelSource::sample ──► raw value
//!       │
//!       ├── no mapper ──────────► raw value as color
//!       └── ColorMapper::map ───► color, or None when transparent
//! ```
//!
//! Out-of-bounds and transparent pixels both come back as `None`: either way
//! there is nothing to draw.
//!
//! # Refresh state
//!
//! A sprite is dirty after construction and after every mutation, even one
//! that writes the same value back. [`Sprite::needs_refresh`] also reports
//! changes made to the attached mapper (for example a palette edit), and
//! [`Sprite::finish_refresh`] clears both. A mapper shared between sprites is
//! cleared by the first one that finishes, which hides the pending change from
//! the others: refresh every sprite sharing a mapper in the same pass.

use crate::color::Color;
use crate::point::Point;
use crate::shader::ColorMapper;
use crate::source::PixelSource;

#[derive(Clone, Debug)]
pub struct Sprite {
    source: PixelSource,
    mapper: Option<ColorMapper>,
    width: u16,
    height: u16,
    position: Point<i16>,
    needs_refresh: bool,
}

impl Sprite {
    /// Creates a sprite of `width × height` with its top-left corner at
    /// `(x, y)`. The first refresh always renders it.
    #[must_use]
    pub const fn new(
        source: PixelSource,
        mapper: Option<ColorMapper>,
        width: u16,
        height: u16,
        x: i16,
        y: i16,
    ) -> Self {
        Self {
            source,
            mapper,
            width,
            height,
            position: Point::new(x, y),
            needs_refresh: true,
        }
    }

    #[must_use]
    pub const fn position(&self) -> (i16, i16) {
        (self.position.x, self.position.y)
    }

    pub fn set_position(&mut self, x: i16, y: i16) {
        self.position = Point::new(x, y);
        self.needs_refresh = true;
        tracing::trace!(x, y, "sprite moved");
    }

    #[must_use]
    pub const fn mapper(&self) -> Option<&ColorMapper> {
        self.mapper.as_ref()
    }

    /// Replaces the mapper. No check is made that it suits the source's raw
    /// values: a mismatched one just yields odd or transparent pixels.
    pub fn set_mapper(&mut self, mapper: Option<ColorMapper>) {
        self.mapper = mapper;
        self.needs_refresh = true;
    }

    #[must_use]
    pub const fn source(&self) -> &PixelSource {
        &self.source
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Color at global `(x, y)`, `None` if it falls outside the sprite or is
    /// transparent.
    #[must_use]
    pub fn get_pixel(&self, x: i16, y: i16) -> Option<Color> {
        self.pixel_at(self.position, Point::new(x, y))
    }

    /// Like [`Sprite::get_pixel`], but relative to `origin` instead of the
    /// current position. Used to draw a whole pass from one position snapshot.
    pub(crate) fn pixel_at(&self, origin: Point<i16>, global: Point<i16>) -> Option<Color> {
        // Widen first: i16 - i16 can overflow and wrap back into range.
        let local = global.map(i32::from) - origin.map(i32::from);

        let x = u16::try_from(local.x).ok().filter(|x| *x < self.width)?;
        let y = u16::try_from(local.y).ok().filter(|y| *y < self.height)?;

        let raw = self.source.sample(x, y);
        match &self.mapper {
            // Colors are 16 bits wide, wider raw values keep their low half.
            None => Some(Color(raw as u16)),
            Some(mapper) => mapper.map(raw),
        }
    }

    /// Whether the sprite, or the mapper it draws through, changed since the
    /// last [`Sprite::finish_refresh`].
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh || self.mapper.as_ref().is_some_and(ColorMapper::needs_refresh)
    }

    /// Acknowledges that the current state has been presented. Also clears
    /// the attached mapper's change flag.
    pub fn finish_refresh(&mut self) {
        self.needs_refresh = false;
        if let Some(mapper) = &self.mapper {
            mapper.finish_refresh();
        }
    }

    /// Flags the sprite for redraw after its source content was edited.
    pub const fn mark_dirty(&mut self) {
        self.needs_refresh = true;
    }
}
