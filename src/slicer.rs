//! Cutting base sprites out of sheets

use image::RgbaImage;

use crate::geometry::Rect;
use crate::sheets::Sheet;

/// A cut rectangle plus where it came from, so it can be re-cut when the
/// rectangle is edited.
#[derive(Debug, Clone)]
pub struct BaseSpriteInfo {
    pub img: RgbaImage,
    pub rect: Rect,
    /// Content-file key of the owning sheet
    pub file: String,
}

impl BaseSpriteInfo {
    pub fn cut(sheet: &Sheet, rect: Rect, file: impl Into<String>) -> Self {
        Self {
            img: slice(sheet, rect),
            rect,
            file: file.into(),
        }
    }
}

/// Cut `rect` out of a sheet.
///
/// The output always has the rectangle's dimensions. Pixels outside the
/// sheet stay transparent, so an oversized rectangle never fails. Pixels
/// whose RGB exactly matches the sheet's color key become fully
/// transparent; near-matches are copied as-is.
pub fn slice(sheet: &Sheet, rect: Rect) -> RgbaImage {
    let mut out = RgbaImage::new(rect.w, rect.h);
    let (sw, sh) = sheet.img.dimensions();
    for dy in 0..rect.h {
        let sy = rect.y as u64 + dy as u64;
        if sy >= sh as u64 {
            break;
        }
        for dx in 0..rect.w {
            let sx = rect.x as u64 + dx as u64;
            if sx >= sw as u64 {
                break;
            }
            let p = sheet.img.get_pixel(sx as u32, sy as u32);
            if [p[0], p[1], p[2]] == sheet.color_key {
                continue;
            }
            out.put_pixel(dx, dy, *p);
        }
    }
    out
}
