//! Rasters a [`Sprite`](crate::sprite::Sprite) samples raw values from.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use thiserror::Error;

pub mod bitmap;
pub mod on_disk;

use self::bitmap::Bitmap;
use self::on_disk::OnDiskBitmap;
use crate::Shared;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitmapError {
    #[error("a bitmap needs at least one value, got {0}")]
    InvalidValueCount(u32),

    #[error("pixel ({x}, {y}) is outside a {width}x{height} bitmap")]
    OutOfBounds {
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },

    #[error("value {value} does not fit a bitmap of {value_count} values")]
    ValueTooLarge { value: u32, value_count: u32 },
}

#[derive(Debug, Error)]
pub enum OnDiskBitmapError {
    #[error("i/o error while reading bitmap: {0}")]
    Io(#[from] io::Error),

    #[error("missing BM signature")]
    NotBmp,

    #[error("unsupported DIB header of {0} bytes")]
    UnsupportedHeader(u32),

    #[error("unsupported bits per pixel: {0}")]
    UnsupportedDepth(u16),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u32),

    #[error("unsupported bitmap size {0}x{1}")]
    InvalidDimensions(i32, i32),
}

/// A raster that can answer "raw value at (x, y)".
///
/// Handles are shared: cloning a `PixelSource` clones the handle, not the
/// pixels, so the owner can keep editing a bitmap that sprites display.
#[derive(Clone, Debug)]
pub enum PixelSource {
    Bitmap(Shared<Bitmap>),
    OnDisk(Shared<OnDiskBitmap>),
}

impl PixelSource {
    /// Raw value at `(x, y)`; coordinates outside the raster read as 0.
    #[must_use]
    pub fn sample(&self, x: u16, y: u16) -> u32 {
        match self {
            Self::Bitmap(bitmap) => bitmap.borrow().get_pixel(x, y),
            Self::OnDisk(bitmap) => bitmap.borrow_mut().get_pixel(x, y),
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        match self {
            Self::Bitmap(bitmap) => bitmap.borrow().width(),
            Self::OnDisk(bitmap) => bitmap.borrow().width(),
        }
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        match self {
            Self::Bitmap(bitmap) => bitmap.borrow().height(),
            Self::OnDisk(bitmap) => bitmap.borrow().height(),
        }
    }
}

impl From<Shared<Bitmap>> for PixelSource {
    fn from(bitmap: Shared<Bitmap>) -> Self {
        Self::Bitmap(bitmap)
    }
}

impl From<Bitmap> for PixelSource {
    fn from(bitmap: Bitmap) -> Self {
        Self::Bitmap(Rc::new(RefCell::new(bitmap)))
    }
}

impl From<Shared<OnDiskBitmap>> for PixelSource {
    fn from(bitmap: Shared<OnDiskBitmap>) -> Self {
        Self::OnDisk(bitmap)
    }
}

impl From<OnDiskBitmap> for PixelSource {
    fn from(bitmap: OnDiskBitmap) -> Self {
        Self::OnDisk(Rc::new(RefCell::new(bitmap)))
    }
}
