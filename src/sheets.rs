//! Sheet image access and the keyed sheet store
//!
//! Sheets arrive through a [`SheetSource`]; the shipped implementation
//! reads them from a directory by tilesheet name. Loaded sheets live in a
//! [`SheetStore`] keyed by the content file whose base sprites they back,
//! matching the `_filename` tag on base-sprite rows.

use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot load tilesheet '{name}': {message}")]
    Load { name: String, message: String },
}

/// Where sheet images come from.
pub trait SheetSource {
    fn fetch(&self, tilesheet: &str) -> Result<RgbaImage, SheetError>;
}

/// Sheets stored as image files under one directory.
#[derive(Debug, Clone)]
pub struct DirSheetSource {
    root: PathBuf,
}

impl DirSheetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SheetSource for DirSheetSource {
    fn fetch(&self, tilesheet: &str) -> Result<RgbaImage, SheetError> {
        let path = self.root.join(tilesheet);
        image::open(&path)
            .map(|img| img.to_rgba8())
            .map_err(|e| SheetError::Load {
                name: tilesheet.to_string(),
                message: e.to_string(),
            })
    }
}

/// A loaded sheet with its transparency key.
///
/// The key is sampled once from the top-left pixel; every exactly-matching
/// pixel becomes fully transparent when rectangles are cut from the sheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub img: RgbaImage,
    pub color_key: [u8; 3],
}

impl Sheet {
    pub fn new(img: RgbaImage) -> Self {
        let color_key = if img.width() > 0 && img.height() > 0 {
            let p = img.get_pixel(0, 0);
            [p[0], p[1], p[2]]
        } else {
            [0, 0, 0]
        };
        Self { img, color_key }
    }
}

/// Loaded sheets by content-file key.
#[derive(Debug, Clone, Default)]
pub struct SheetStore {
    sheets: HashMap<String, Sheet>,
}

impl SheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: impl Into<String>, img: RgbaImage) {
        self.sheets.insert(file.into(), Sheet::new(img));
    }

    pub fn get(&self, file: &str) -> Option<&Sheet> {
        self.sheets.get(file)
    }

    /// Sorted list of sheet keys.
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.sheets.keys().map(String::as_str).collect();
        files.sort_unstable();
        files
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
