#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

//! Reference renderer: composites sprites into a framebuffer once per frame.
//!
//! A frame is only drawn when at least one sprite reports it needs a
//! refresh. Sprites are drawn in slice order, so later sprites cover earlier
//! ones; pixels a sprite returns as `None` leave whatever is below visible.
//! Once the frame is in the buffer every sprite is told it has been presented.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::point::Point;
use crate::sprite::Sprite;

/// Global coordinates are `i16`, nothing past this column or row is addressable.
const MAX_COORDINATE: i32 = i16::MAX as i32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u16,
    pub height: u16,
    pub background: Color,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            background: Color::BLACK,
        }
    }
}

#[derive(Debug)]
pub struct Display {
    config: DisplayConfig,
    buffer: Vec<Color>,
    frame_count: u64,
}

impl Display {
    #[must_use]
    pub fn new(config: DisplayConfig) -> Self {
        let len = usize::from(config.width) * usize::from(config.height);
        Self {
            config,
            buffer: vec![config.background; len],
            frame_count: 0,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.config.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.config.height
    }

    /// Number of frames drawn so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Row-major framebuffer, `width * height` colors.
    #[must_use]
    pub fn buffer(&self) -> &[Color] {
        &self.buffer
    }

    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<Color> {
        if x >= self.config.width || y >= self.config.height {
            return None;
        }
        Some(self.buffer[usize::from(y) * usize::from(self.config.width) + usize::from(x)])
    }

    /// Redraws the frame if any sprite changed, then acknowledges the refresh
    /// on every sprite. Returns whether a frame was drawn.
    pub fn refresh(&mut self, sprites: &mut [Sprite]) -> bool {
        if !sprites.iter().any(Sprite::needs_refresh) {
            tracing::trace!(frame = self.frame_count, "display is up to date");
            return false;
        }

        let span = tracing::debug_span!("refresh", frame = self.frame_count);
        let _enter = span.enter();

        self.buffer.fill(self.config.background);
        for sprite in sprites.iter() {
            self.draw(sprite);
        }

        for sprite in sprites.iter_mut() {
            sprite.finish_refresh();
        }
        self.frame_count += 1;

        tracing::debug!(sprites = sprites.len(), "frame committed");
        true
    }

    fn draw(&mut self, sprite: &Sprite) {
        // Read the position once so the whole sprite lands in one place.
        let origin = Point::from(sprite.position());
        let top_left = origin.map(i32::from);

        let left = top_left.x.max(0);
        let top = top_left.y.max(0);
        let right = (top_left.x + i32::from(sprite.width()))
            .min(i32::from(self.config.width))
            .min(MAX_COORDINATE + 1);
        let bottom = (top_left.y + i32::from(sprite.height()))
            .min(i32::from(self.config.height))
            .min(MAX_COORDINATE + 1);

        let width = usize::from(self.config.width);
        for y in top..bottom {
            for x in left..right {
                if let Some(color) = sprite.pixel_at(origin, Point::new(x as i16, y as i16)) {
                    self.buffer[y as usize * width + x as usize] = color;
                }
            }
        }
    }
}
