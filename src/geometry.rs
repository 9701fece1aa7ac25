//! Rectangle and offset primitives with their space-separated wire encoding
//!
//! Content files store source rectangles as `"x y w h"` and layer offsets
//! as `"x y"`, fields separated by runs of whitespace.

use std::fmt;
use thiserror::Error;

/// Error type for rectangle/offset parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Input string was empty
    #[error("empty geometry string")]
    Empty,
    /// Wrong number of space-separated fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    /// A field was not a valid integer
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// A source rectangle on a tilesheet, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Parse the `"x y w h"` wire form.
    pub fn parse(s: &str) -> Result<Self, GeometryError> {
        let fields = split_fields(s, 4)?;
        Ok(Self {
            x: parse_u32(fields[0])?,
            y: parse_u32(fields[1])?,
            w: parse_u32(fields[2])?,
            h: parse_u32(fields[3])?,
        })
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.w, self.h)
    }
}

/// A signed pixel offset applied when compositing a layer onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Parse the `"x y"` wire form. Coordinates may be negative.
    pub fn parse(s: &str) -> Result<Self, GeometryError> {
        let fields = split_fields(s, 2)?;
        Ok(Self {
            x: parse_i32(fields[0])?,
            y: parse_i32(fields[1])?,
        })
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

fn split_fields(s: &str, expected: usize) -> Result<Vec<&str>, GeometryError> {
    if s.trim().is_empty() {
        return Err(GeometryError::Empty);
    }
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != expected {
        return Err(GeometryError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn parse_u32(s: &str) -> Result<u32, GeometryError> {
    s.parse::<u32>()
        .map_err(|_| GeometryError::InvalidNumber(s.to_string()))
}

fn parse_i32(s: &str) -> Result<i32, GeometryError> {
    s.parse::<i32>()
        .map_err(|_| GeometryError::InvalidNumber(s.to_string()))
}
