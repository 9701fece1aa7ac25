//! PNG output and file path generation

use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations. Each variant names the path it was
/// trying to produce.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot create {dir}: {source}")]
    Dir { dir: String, source: io::Error },
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: image::ImageError,
    },
}

/// Save an RGBA image to a PNG file, creating missing parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::Dir {
            dir: parent.display().to_string(),
            source: e,
        })?;
    }
    image.save(path).map_err(|e| OutputError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

/// Scale an image by an integer factor, each source pixel becoming a
/// `factor` by `factor` block. Pixel art stays crisp this way; factors
/// of 0 and 1 return the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u8) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let f = u32::from(factor);
    let (w, h) = image.dimensions();
    let mut out = RgbaImage::new(w * f, h * f);
    for (x, y, pixel) in image.enumerate_pixels() {
        for dy in 0..f {
            for dx in 0..f {
                out.put_pixel(x * f + dx, y * f + dy, *pixel);
            }
        }
    }
    out
}

/// Generate the output path for one composed sprite.
///
/// # Output Naming Rules
///
/// | Scenario | Output |
/// |----------|--------|
/// | No `-o` argument | `{id}.png` in the working directory |
/// | With `-o dir/` | `dir/{id}.png` |
/// | With `-o out.png` (one sprite) | `out.png` |
/// | With `-o out.png` (several) | `out_{id}.png` |
///
/// `is_single` says whether this invocation writes exactly one sprite;
/// only then may an explicit file path be used verbatim.
pub fn generate_output_path(output_arg: Option<&Path>, id: &str, is_single: bool) -> PathBuf {
    match output_arg {
        Some(output) => {
            let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();

            if is_dir {
                output.join(format!("{}.png", id))
            } else if is_single {
                output.to_path_buf()
            } else {
                let stem = output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("output");
                let parent = output.parent().unwrap_or(Path::new(""));
                if parent.as_os_str().is_empty() {
                    PathBuf::from(format!("{}_{}.png", stem, id))
                } else {
                    parent.join(format!("{}_{}.png", stem, id))
                }
            }
        }
        None => PathBuf::from(format!("{}.png", id)),
    }
}
