//! File-backed raster that reads pixels straight from a Windows BMP.
//!
//! Only the headers and the color table are kept in memory. Every
//! [`OnDiskBitmap::get_pixel`] call seeks to the pixel and reads it, trading
//! speed for not holding the image in RAM.
//!
//! # Supported layouts
//!
//! | Bits per pixel | Compression       | Pixel value                      |
//! |----------------|-------------------|----------------------------------|
//! | 1, 2, 4, 8     | none              | color table entry                |
//! | 16             | none              | RGB555                           |
//! | 16             | bitfields         | channel masks from the header    |
//! | 24             | none              | BGR                              |
//! | 32             | none / bitfields  | BGRx                             |
//!
//! Sampled values are always returned as `0x00RRGGBB`.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::OnDiskBitmapError;

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;
/// `BITMAPV5HEADER`, the largest info header in use.
const MAX_INFO_HEADER_SIZE: u32 = 124;
const COMPRESSION_NONE: u32 = 0;
const COMPRESSION_BITFIELDS: u32 = 3;

/// Anything a bitmap can be streamed from.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChannelMasks {
    red: u32,
    green: u32,
    blue: u32,
}

impl ChannelMasks {
    const RGB555: Self = Self {
        red: 0x7C00,
        green: 0x03E0,
        blue: 0x001F,
    };

    const BGRX: Self = Self {
        red: 0x00FF_0000,
        green: 0x0000_FF00,
        blue: 0x0000_00FF,
    };

    /// Each mask must select one run of adjacent bits.
    const fn is_contiguous(self) -> bool {
        const fn contiguous(mask: u32) -> bool {
            mask == 0 || (mask >> mask.trailing_zeros()).count_ones() == mask.count_ones()
        }
        contiguous(self.red) && contiguous(self.green) && contiguous(self.blue)
    }

    fn to_rgb888(self, value: u32) -> u32 {
        (scale_channel(value, self.red) << 16)
            | (scale_channel(value, self.green) << 8)
            | scale_channel(value, self.blue)
    }
}

/// Extracts the channel selected by `mask` and stretches it to 8 bits.
fn scale_channel(value: u32, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let width = mask.count_ones();
    let max = (1_u64 << width) - 1;
    let channel = u64::from((value & mask) >> mask.trailing_zeros());

    // `channel <= max`, so the result is at most 255.
    (channel * 255 / max) as u32
}

pub struct OnDiskBitmap {
    reader: Box<dyn ReadSeek>,
    width: u16,
    height: u16,
    top_down: bool,
    bits_per_pixel: u16,
    data_offset: u64,
    stride: u64,
    color_table: Vec<u32>,
    masks: ChannelMasks,
    read_failed: bool,
}

impl fmt::Debug for OnDiskBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnDiskBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("top_down", &self.top_down)
            .field("bits_per_pixel", &self.bits_per_pixel)
            .field("data_offset", &self.data_offset)
            .field("stride", &self.stride)
            .field("color_table", &self.color_table.len())
            .field("masks", &self.masks)
            .field("read_failed", &self.read_failed)
            .finish_non_exhaustive()
    }
}

impl OnDiskBitmap {
    /// Opens the BMP at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a supported BMP.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OnDiskBitmapError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parses the headers from `reader`, keeping it for later pixel reads.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, a missing `BM` signature, or an unsupported
    /// depth, compression or size.
    pub fn from_reader(mut reader: impl ReadSeek + 'static) -> Result<Self, OnDiskBitmapError> {
        reader.seek(SeekFrom::Start(0))?;

        let mut file_header = [0_u8; FILE_HEADER_SIZE as usize];
        reader.read_exact(&mut file_header)?;
        if &file_header[0..2] != b"BM" {
            return Err(OnDiskBitmapError::NotBmp);
        }
        let data_offset = read_u32(&file_header, 10);

        let mut dib_size = [0_u8; 4];
        reader.read_exact(&mut dib_size)?;
        let dib_size = u32::from_le_bytes(dib_size);
        if !(INFO_HEADER_SIZE..=MAX_INFO_HEADER_SIZE).contains(&dib_size) {
            return Err(OnDiskBitmapError::UnsupportedHeader(dib_size));
        }

        // The rest of the info header, plus the three bitfield masks that may
        // follow it.
        let mut info = vec![0_u8; (dib_size - 4) as usize];
        reader.read_exact(&mut info)?;
        // Offsets below are relative to the start of the file.
        let field = |offset: usize| read_u32(&info, offset - 18);
        let signed_field = |offset: usize| read_i32(&info, offset - 18);

        let raw_width = signed_field(18);
        let raw_height = signed_field(22);
        let bits_per_pixel = read_u16(&info, 28 - 18);
        let compression = field(30);
        let colors_used = field(46);

        let width = u16::try_from(raw_width)
            .ok()
            .filter(|width| *width > 0)
            .ok_or(OnDiskBitmapError::InvalidDimensions(raw_width, raw_height))?;
        let height = u16::try_from(raw_height.unsigned_abs())
            .ok()
            .filter(|height| *height > 0)
            .ok_or(OnDiskBitmapError::InvalidDimensions(raw_width, raw_height))?;

        let masks = match (bits_per_pixel, compression) {
            (1 | 2 | 4 | 8 | 24 | 32, COMPRESSION_NONE) => ChannelMasks::BGRX,
            (16, COMPRESSION_NONE) => ChannelMasks::RGB555,
            (16 | 32, COMPRESSION_BITFIELDS) => {
                let masks = if dib_size >= INFO_HEADER_SIZE + 12 {
                    [field(54), field(58), field(62)]
                } else {
                    let mut raw = [0_u8; 12];
                    reader.read_exact(&mut raw)?;
                    [read_u32(&raw, 0), read_u32(&raw, 4), read_u32(&raw, 8)]
                };
                let masks = ChannelMasks {
                    red: masks[0],
                    green: masks[1],
                    blue: masks[2],
                };
                if !masks.is_contiguous() {
                    return Err(OnDiskBitmapError::UnsupportedCompression(compression));
                }
                masks
            }
            (1 | 2 | 4 | 8 | 16 | 24 | 32, _) => {
                return Err(OnDiskBitmapError::UnsupportedCompression(compression));
            }
            _ => return Err(OnDiskBitmapError::UnsupportedDepth(bits_per_pixel)),
        };

        let color_table = if bits_per_pixel <= 8 {
            let count = if colors_used == 0 {
                1_u32 << bits_per_pixel
            } else {
                colors_used.min(1 << bits_per_pixel)
            };
            reader.seek(SeekFrom::Start(u64::from(FILE_HEADER_SIZE + dib_size)))?;
            let mut raw = vec![0_u8; count as usize * 4];
            reader.read_exact(&mut raw)?;
            raw.chunks_exact(4)
                .map(|bgrx| u32::from_le_bytes([bgrx[0], bgrx[1], bgrx[2], 0]))
                .collect()
        } else {
            Vec::new()
        };

        let row_bits = u64::from(width) * u64::from(bits_per_pixel);
        let stride = row_bits.div_ceil(32) * 4;

        tracing::debug!(
            width,
            height,
            bits_per_pixel,
            compression,
            colors = color_table.len(),
            "opened on-disk bitmap"
        );

        Ok(Self {
            reader: Box::new(reader),
            width,
            height,
            top_down: raw_height < 0,
            bits_per_pixel,
            data_offset: u64::from(data_offset),
            stride,
            color_table,
            masks,
            read_failed: false,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub const fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Reads the `0x00RRGGBB` color at `(x, y)`.
    ///
    /// Coordinates outside the image and failed reads both yield 0. Only the
    /// first failed read is logged as a warning.
    pub fn get_pixel(&mut self, x: u16, y: u16) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }

        match self.read_pixel(x, y) {
            Ok(value) => value,
            Err(e) if self.read_failed => {
                tracing::trace!(x, y, "failed to read on-disk bitmap pixel: {e}");
                0
            }
            Err(e) => {
                tracing::warn!(x, y, "failed to read on-disk bitmap pixel: {e}");
                self.read_failed = true;
                0
            }
        }
    }

    fn read_pixel(&mut self, x: u16, y: u16) -> std::io::Result<u32> {
        let row = if self.top_down {
            y
        } else {
            self.height - 1 - y
        };
        let bit_offset = u64::from(x) * u64::from(self.bits_per_pixel);
        let offset = self.data_offset + u64::from(row) * self.stride + bit_offset / 8;

        let mut bytes = [0_u8; 4];
        let len = usize::from(self.bits_per_pixel.div_ceil(8));
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_exact(&mut bytes[..len])?;
        let raw = u32::from_le_bytes(bytes);

        let value = match self.bits_per_pixel {
            1 | 2 | 4 => {
                // Pixels are packed from the most significant bit of each byte.
                let bpp = u32::from(self.bits_per_pixel);
                let shift = 8 - bpp - (bit_offset % 8) as u32;
                let index = (raw >> shift) & ((1 << bpp) - 1);
                self.lookup(index)
            }
            8 => self.lookup(raw),
            _ => self.masks.to_rgb888(raw),
        };

        Ok(value)
    }

    fn lookup(&self, index: u32) -> u32 {
        self.color_table.get(index as usize).copied().unwrap_or(0)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Builds BMP files in memory for tests.
#[cfg(test)]
pub(crate) mod test_bmp {
    /// Encodes a BMP with a 40-byte info header.
    ///
    /// `rows` are given top to bottom and already packed; they are padded to
    /// 4 bytes and written bottom-up unless `top_down` is set.
    pub(crate) fn encode(
        width: i32,
        rows: &[Vec<u8>],
        bits_per_pixel: u16,
        compression: u32,
        color_table: &[u32],
        masks: Option<[u32; 3]>,
        top_down: bool,
    ) -> Vec<u8> {
        let mut header_extra = Vec::new();
        if let Some(masks) = masks {
            for mask in masks {
                header_extra.extend_from_slice(&mask.to_le_bytes());
            }
        }
        let dib_size = 40 + header_extra.len() as u32;
        let table_size = color_table.len() as u32 * 4;
        let data_offset = 14 + dib_size + table_size;

        let height = rows.len() as i32;
        let mut bmp = Vec::new();
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&0_u32.to_le_bytes()); // file size, unused
        bmp.extend_from_slice(&0_u32.to_le_bytes()); // reserved
        bmp.extend_from_slice(&data_offset.to_le_bytes());

        bmp.extend_from_slice(&dib_size.to_le_bytes());
        bmp.extend_from_slice(&width.to_le_bytes());
        let stored_height = if top_down { -height } else { height };
        bmp.extend_from_slice(&stored_height.to_le_bytes());
        bmp.extend_from_slice(&1_u16.to_le_bytes()); // planes
        bmp.extend_from_slice(&bits_per_pixel.to_le_bytes());
        bmp.extend_from_slice(&compression.to_le_bytes());
        bmp.extend_from_slice(&0_u32.to_le_bytes()); // image size
        bmp.extend_from_slice(&2835_u32.to_le_bytes()); // x pixels per meter
        bmp.extend_from_slice(&2835_u32.to_le_bytes()); // y pixels per meter
        bmp.extend_from_slice(&(color_table.len() as u32).to_le_bytes());
        bmp.extend_from_slice(&0_u32.to_le_bytes()); // important colors
        bmp.extend_from_slice(&header_extra);

        for color in color_table {
            bmp.extend_from_slice(&color.to_le_bytes());
        }

        let mut stored_rows: Vec<&Vec<u8>> = rows.iter().collect();
        if !top_down {
            stored_rows.reverse();
        }
        for row in stored_rows {
            let mut row = row.clone();
            row.resize(row.len().div_ceil(4) * 4, 0);
            bmp.extend_from_slice(&row);
        }

        bmp
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::test_bmp::encode;
    use super::*;
    use pretty_assertions::assert_eq;

    fn open(bytes: Vec<u8>) -> OnDiskBitmap {
        OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn reads_24bpp_bottom_up() {
        // 2x2: red, green / blue, white
        let rows = vec![
            vec![0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00],
            vec![0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF],
        ];
        let mut bitmap = open(encode(2, &rows, 24, 0, &[], None, false));

        assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
        assert_eq!(bitmap.get_pixel(0, 0), 0xFF_0000);
        assert_eq!(bitmap.get_pixel(1, 0), 0x00_FF00);
        assert_eq!(bitmap.get_pixel(0, 1), 0x00_00FF);
        assert_eq!(bitmap.get_pixel(1, 1), 0xFF_FFFF);
    }

    #[test]
    fn reads_top_down_rows() {
        let rows = vec![vec![0x11, 0x22, 0x33], vec![0x44, 0x55, 0x66]];
        let mut bitmap = open(encode(1, &rows, 24, 0, &[], None, true));

        assert_eq!(bitmap.get_pixel(0, 0), 0x33_2211);
        assert_eq!(bitmap.get_pixel(0, 1), 0x66_5544);
    }

    #[test]
    fn reads_32bpp() {
        let rows = vec![vec![0x10, 0x20, 0x30, 0xFF]];
        let mut bitmap = open(encode(1, &rows, 32, 0, &[], None, false));

        assert_eq!(bitmap.get_pixel(0, 0), 0x30_2010);
    }

    #[test]
    fn reads_palettized_depths() {
        let table = [0x00_0000, 0xFF_0000, 0x00_FF00, 0x00_00FF];

        // 1bpp, 10 pixels: 1010000011 -> bytes 0b1010_0000, 0b11_000000
        let mut bitmap = open(encode(
            10,
            &[vec![0b1010_0000, 0b1100_0000]],
            1,
            0,
            &table[..2],
            None,
            false,
        ));
        let values: Vec<u32> = (0..10).map(|x| bitmap.get_pixel(x, 0)).collect();
        assert_eq!(
            values,
            vec![
                0xFF_0000, 0, 0xFF_0000, 0, 0, 0, 0, 0, 0xFF_0000, 0xFF_0000
            ]
        );

        // 4bpp, 3 pixels: 3, 1, 2
        let mut bitmap = open(encode(3, &[vec![0x31, 0x20]], 4, 0, &table, None, false));
        assert_eq!(bitmap.get_pixel(0, 0), 0x00_00FF);
        assert_eq!(bitmap.get_pixel(1, 0), 0xFF_0000);
        assert_eq!(bitmap.get_pixel(2, 0), 0x00_FF00);

        // 8bpp, index beyond the table reads as black
        let mut bitmap = open(encode(2, &[vec![2, 9]], 8, 0, &table, None, false));
        assert_eq!(bitmap.get_pixel(0, 0), 0x00_FF00);
        assert_eq!(bitmap.get_pixel(1, 0), 0);
    }

    #[test]
    fn reads_16bpp_rgb555_and_bitfields() {
        // RGB555 pure red: 0b0_11111_00000_00000
        let mut bitmap = open(encode(1, &[vec![0x00, 0x7C]], 16, 0, &[], None, false));
        assert_eq!(bitmap.get_pixel(0, 0), 0xFF_0000);

        // RGB565 pure green through bitfields: 0b00000_111111_00000
        let mut bitmap = open(encode(
            1,
            &[vec![0xE0, 0x07]],
            16,
            3,
            &[],
            Some([0xF800, 0x07E0, 0x001F]),
            false,
        ));
        assert_eq!(bitmap.get_pixel(0, 0), 0x00_FF00);
    }

    #[test]
    fn out_of_range_reads_are_zero() {
        let mut bitmap = open(encode(1, &[vec![0xFF, 0xFF, 0xFF]], 24, 0, &[], None, false));

        assert_eq!(bitmap.get_pixel(0, 0), 0xFF_FFFF);
        assert_eq!(bitmap.get_pixel(1, 0), 0);
        assert_eq!(bitmap.get_pixel(0, 1), 0);
    }

    #[test]
    fn truncated_pixel_data_reads_as_zero() {
        let mut bytes = encode(2, &[vec![0xFF; 6]], 24, 0, &[], None, false);
        bytes.truncate(bytes.len() - 4);
        let mut bitmap = open(bytes);

        assert_eq!(bitmap.get_pixel(0, 0), 0xFF_FFFF);
        assert!(!bitmap.read_failed);
        assert_eq!(bitmap.get_pixel(1, 0), 0);
        assert!(bitmap.read_failed);
        assert_eq!(bitmap.get_pixel(1, 0), 0);
        assert!(bitmap.read_failed);
    }

    #[test]
    fn rejects_masks_with_gaps() {
        let bytes = encode(
            1,
            &[vec![0xFF, 0xFF]],
            16,
            3,
            &[],
            Some([0x0101, 0x07E0, 0x001F]),
            false,
        );
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::UnsupportedCompression(3)));

        // A missing channel is fine and reads as 0.
        let mut bitmap = open(encode(
            1,
            &[vec![0xFF, 0xFF]],
            16,
            3,
            &[],
            Some([0xF800, 0x07E0, 0]),
            false,
        ));
        assert_eq!(bitmap.get_pixel(0, 0), 0xFF_FF00);
    }

    #[test]
    fn rejects_invalid_files() {
        let err = OnDiskBitmap::from_reader(Cursor::new(b"PNG not a bitmap".to_vec()))
            .unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::NotBmp));

        let err = OnDiskBitmap::from_reader(Cursor::new(b"BM".to_vec())).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::Io(_)));

        let bytes = encode(1, &[vec![0; 2]], 12, 0, &[], None, false);
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::UnsupportedDepth(12)));

        // RLE8
        let bytes = encode(1, &[vec![0]], 8, 1, &[0], None, false);
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::UnsupportedCompression(1)));

        let bytes = encode(0, &[vec![0]], 24, 0, &[], None, false);
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::InvalidDimensions(0, 1)));

        // Header size far beyond any known info header.
        let mut bytes = b"BM".to_vec();
        bytes.extend_from_slice(&[0; 8]);
        bytes.extend_from_slice(&54_u32.to_le_bytes());
        bytes.extend_from_slice(&0xFFFF_FFF0_u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 36]);
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::UnsupportedHeader(0xFFFF_FFF0)));

        let mut bytes = encode(1, &[vec![0; 3]], 24, 0, &[], None, false);
        bytes[14..18].copy_from_slice(&12_u32.to_le_bytes());
        let err = OnDiskBitmap::from_reader(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, OnDiskBitmapError::UnsupportedHeader(12)));
    }
}
