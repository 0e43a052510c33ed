//! Image metrics: pixel size plus whatever density metadata the file
//! carries.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::units::CM_PER_INCH;

/// Density metadata lives in the first chunks/segments; no need to read
/// the whole image.
const HEADER_READ_LIMIT: u64 = 64 * 1024;

#[derive(Error, Debug)]
pub enum ImageInfoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] image::ImageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityUnit {
    /// Only the aspect ratio is meaningful.
    None,
    Inch,
    Centimetre,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JfifDensity {
    pub x: u16,
    pub y: u16,
    pub unit: DensityUnit,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageInfo {
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Explicit resolution, horizontal and vertical.
    pub dpi: Option<(f64, f64)>,
    pub jfif_density: Option<JfifDensity>,
}

impl ImageInfo {
    /// Resolution in dots per inch, horizontal and vertical: explicit DPI
    /// first, then JFIF density. `None` when neither gives a usable value.
    pub fn density(&self) -> Option<(f64, f64)> {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if let Some(dpi) = self.dpi.filter(|&(x, y)| usable(x) && usable(y)) {
            return Some(dpi);
        }
        let jfif = self.jfif_density.filter(|d| d.x > 0 && d.y > 0)?;
        let per_inch = match jfif.unit {
            DensityUnit::Inch => 1.0,
            DensityUnit::Centimetre => CM_PER_INCH,
            DensityUnit::None => return None,
        };
        Some((jfif.x as f64 * per_inch, jfif.y as f64 * per_inch))
    }
}

/// Something that can measure an image on disk.
pub trait ImageProbe {
    fn probe(&self, path: &Path) -> Result<ImageInfo, ImageInfoError>;
}

/// Reads pixel dimensions through the `image` crate and density from PNG
/// `pHYs` chunks and JPEG JFIF headers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderProbe;

impl ImageProbe for HeaderProbe {
    fn probe(&self, path: &Path) -> Result<ImageInfo, ImageInfoError> {
        let (pixel_width, pixel_height) = image::ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()?;

        let mut head = Vec::new();
        File::open(path)?
            .take(HEADER_READ_LIMIT)
            .read_to_end(&mut head)?;

        Ok(ImageInfo {
            pixel_width,
            pixel_height,
            dpi: png_dpi(&head),
            jfif_density: jfif_density(&head),
        })
    }
}

/// Resolution from a PNG `pHYs` chunk when its unit is the metre.
pub fn png_dpi(data: &[u8]) -> Option<(f64, f64)> {
    if data.len() < 8 || data[..8] != [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return None;
    }
    let mut i = 8;
    while i + 8 <= data.len() {
        let len = u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]) as usize;
        let kind = &data[i + 4..i + 8];
        let body = i + 8;
        if kind == b"IDAT" || kind == b"IEND" {
            break;
        }
        if kind == b"pHYs" && len >= 9 && body + 9 <= data.len() {
            let x = u32::from_be_bytes([data[body], data[body + 1], data[body + 2], data[body + 3]]);
            let y = u32::from_be_bytes([
                data[body + 4],
                data[body + 5],
                data[body + 6],
                data[body + 7],
            ]);
            if data[body + 8] != 1 || x == 0 || y == 0 {
                return None;
            }
            return Some((x as f64 * 0.0254, y as f64 * 0.0254));
        }
        // length + type + data + crc
        i = body + len + 4;
    }
    None
}

/// Density fields of a JPEG JFIF APP0 segment.
pub fn jfif_density(data: &[u8]) -> Option<JfifDensity> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut i = 2;
    while i + 4 <= data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        // start of scan / end of image: no more headers
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if marker == 0xE0 && i + 16 <= data.len() && &data[i + 4..i + 9] == b"JFIF\0" {
            let unit = match data[i + 11] {
                1 => DensityUnit::Inch,
                2 => DensityUnit::Centimetre,
                _ => DensityUnit::None,
            };
            let x = u16::from_be_bytes([data[i + 12], data[i + 13]]);
            let y = u16::from_be_bytes([data[i + 14], data[i + 15]]);
            return Some(JfifDensity { x, y, unit });
        }
        i += 2 + len;
    }
    None
}
