//! Demo scene: a palette-mapped checkerboard bouncing over a background.

use std::error::Error;
use std::path::Path;
use std::rc::Rc;

use display::color::Color;
use display::shader::ColorMapper;
use display::shader::color_converter::ColorConverter;
use display::shader::palette::Palette;
use display::source::PixelSource;
use display::source::bitmap::Bitmap;
use display::source::on_disk::OnDiskBitmap;
use display::sprite::Sprite;
use display::{Shared, shared};

const CHECKER_SIZE: u16 = 8;

/// Colors the checkerboard's second palette entry cycles through.
const HIGHLIGHTS: [u32; 4] = [0x40_4040, 0xC0_C0C0, 0x80_8080, 0xFF_FFFF];

pub struct Scene {
    pub sprites: Vec<Sprite>,
    palette: Shared<Palette>,
    velocity: (i16, i16),
    width: u16,
    height: u16,
}

impl Scene {
    /// Builds the scene for a `width × height` display. The background is
    /// read from `background` when given, otherwise a gradient is generated.
    pub fn new(width: u16, height: u16, background: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let background = match background {
            Some(path) => {
                let bitmap = OnDiskBitmap::open(path)?;
                tracing::info!(
                    "loaded {} ({}x{}, {} bpp)",
                    path.display(),
                    bitmap.width(),
                    bitmap.height(),
                    bitmap.bits_per_pixel()
                );
                let (w, h) = (bitmap.width(), bitmap.height());
                Sprite::new(
                    PixelSource::from(bitmap),
                    Some(ColorMapper::from(ColorConverter::new())),
                    w,
                    h,
                    0,
                    0,
                )
            }
            None => Sprite::new(
                PixelSource::from(gradient(width, height)?),
                Some(ColorMapper::from(ColorConverter::new())),
                width,
                height,
                0,
                0,
            ),
        };

        let mut palette = Palette::new(3);
        palette.make_transparent(0)?;
        palette.set_color(1, 0xFF_FFFF)?;
        palette.set_color(2, HIGHLIGHTS[0])?;
        let palette = shared(palette);

        let checker = Sprite::new(
            PixelSource::from(checkerboard()?),
            Some(ColorMapper::from(Rc::clone(&palette))),
            CHECKER_SIZE,
            CHECKER_SIZE,
            0,
            0,
        );

        Ok(Self {
            sprites: vec![background, checker],
            palette,
            velocity: (2, 1),
            width,
            height,
        })
    }

    /// Moves the checkerboard one step, bouncing off the display edges, and
    /// changes its highlight color every eighth frame.
    pub fn step(&mut self, frame: u32) -> Result<(), Box<dyn Error>> {
        let checker = &mut self.sprites[1];
        let (mut x, mut y) = checker.position();
        let max_x = i16::try_from(self.width.saturating_sub(CHECKER_SIZE)).unwrap_or(i16::MAX);
        let max_y = i16::try_from(self.height.saturating_sub(CHECKER_SIZE)).unwrap_or(i16::MAX);

        x += self.velocity.0;
        y += self.velocity.1;
        if x <= 0 || x >= max_x {
            self.velocity.0 = -self.velocity.0;
            x = x.clamp(0, max_x);
        }
        if y <= 0 || y >= max_y {
            self.velocity.1 = -self.velocity.1;
            y = y.clamp(0, max_y);
        }
        checker.set_position(x, y);

        if frame % 8 == 7 {
            let highlight = HIGHLIGHTS[(frame / 8) as usize % HIGHLIGHTS.len()];
            self.palette.borrow_mut().set_color(2, highlight)?;
        }
        Ok(())
    }
}

/// Diagonal `0x00RRGGBB` gradient.
fn gradient(width: u16, height: u16) -> Result<Bitmap, Box<dyn Error>> {
    let mut bitmap = Bitmap::new(width, height, 1 << 24)?;
    for y in 0..height {
        for x in 0..width {
            let red = u32::from(x) * 255 / u32::from(width.max(2) - 1);
            let blue = u32::from(y) * 255 / u32::from(height.max(2) - 1);
            bitmap.set_pixel(x, y, (red << 16) | blue)?;
        }
    }
    Ok(bitmap)
}

/// 8×8 board of 2×2 cells alternating palette entries 1 and 2, with a
/// transparent border.
fn checkerboard() -> Result<Bitmap, Box<dyn Error>> {
    let mut bitmap = Bitmap::new(CHECKER_SIZE, CHECKER_SIZE, 3)?;
    for y in 1..CHECKER_SIZE - 1 {
        for x in 1..CHECKER_SIZE - 1 {
            let value = if (x / 2 + y / 2) % 2 == 0 { 1 } else { 2 };
            bitmap.set_pixel(x, y, value)?;
        }
    }
    Ok(bitmap)
}

/// Renders colors as ASCII shades, one character per pixel.
pub fn to_ascii(buffer: &[Color], width: u16) -> String {
    const SHADES: &[u8] = b" .:-=+*#%@";

    let mut out = String::with_capacity(buffer.len() + buffer.len() / usize::from(width.max(1)));
    for row in buffer.chunks(usize::from(width.max(1))) {
        for color in row {
            let shade = usize::from(color.luma()) * (SHADES.len() - 1) / 255;
            out.push(char::from(SHADES[shade]));
        }
        out.push('\n');
    }
    out
}
