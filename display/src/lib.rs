//! Sprite compositing and incremental refresh tracking for tiled 2D displays.
//!
//! A [`Sprite`](sprite::Sprite) places a rectangle of a
//! [`PixelSource`](source::PixelSource) on the display and runs every sampled
//! raw value through an optional [`ColorMapper`](shader::ColorMapper):
//!
//! ```text
//!   Bitmap ────────┐                                           ┌── Palette
//!                  ├── PixelSource ──► Sprite ──► ColorMapper ─┤
//!   OnDiskBitmap ──┘                                           └── ColorConverter
//! ```
//!
//! Sources and mappers are shared through [`Shared`] handles, so the same
//! palette or bitmap can back several sprites and still be edited by its
//! owner. A renderer such as [`Display`](display::Display) asks each sprite
//! whether it needs a refresh, samples it if so, and acknowledges the frame
//! afterwards.

use std::cell::RefCell;
use std::rc::Rc;

#[allow(clippy::cast_possible_truncation)]
mod bitwise;

#[allow(clippy::cast_possible_truncation)]
pub mod color;
pub mod display;
pub mod point;
pub mod shader;
#[allow(clippy::cast_possible_truncation)]
pub mod source;
#[allow(clippy::cast_possible_truncation)]
pub mod sprite;

/// Single-threaded shared ownership used for sources and mappers.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `value` in a new [`Shared`] handle.
#[must_use]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
