// Image persistence for extracted document images
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

/// Raw sample layout of an unfiltered (or Flate-decoded) PDF image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RawColor {
    Rgb,
    Gray,
}

/// What we know about the bytes handed to [`ImageSink::persist`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageData<'a> {
    /// A self-describing encoded image (PNG, JPEG, GIF, ...).
    Encoded(&'a [u8]),
    /// 8-bit samples without any container.
    Raw {
        bytes: &'a [u8],
        width: u32,
        height: u32,
        color: RawColor,
    },
    /// Bytes we cannot interpret; written verbatim.
    Opaque(&'a [u8]),
}

/// Writes images into the shared output directory.
///
/// Names are derived from the source file name plus page and image index,
/// so concurrent extractions never write to the same file.
#[derive(Debug, Clone)]
pub struct ImageSink {
    dir: PathBuf,
}

impl ImageSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn pdf_image_name(source: &Path, page: u32, index: u32) -> String {
        format!("{}_page{}_img{}.png", base_name(source), page, index)
    }

    pub fn docx_image_name(source: &Path, index: u32) -> String {
        format!("{}_img{}.png", base_name(source), index)
    }

    /// Store `data` as `name` in the output directory and return its path.
    pub fn persist(&self, name: &str, data: ImageData<'_>) -> Result<String> {
        let path = self.dir.join(name);

        match data {
            ImageData::Encoded(bytes) => match image::guess_format(bytes) {
                Ok(ImageFormat::Png) => write_verbatim(&path, bytes)?,
                Ok(format) => match image::load_from_memory_with_format(bytes, format) {
                    Ok(img) => save_png(&img, &path)?,
                    Err(e) => {
                        tracing::warn!(name, error = %e, "cannot decode image, writing original bytes");
                        write_verbatim(&path, bytes)?;
                    }
                },
                Err(_) => {
                    tracing::warn!(name, "unknown image format, writing original bytes");
                    write_verbatim(&path, bytes)?;
                }
            },
            ImageData::Raw {
                bytes,
                width,
                height,
                color,
            } => match raw_to_image(bytes, width, height, color) {
                Some(img) => save_png(&img, &path)?,
                None => {
                    tracing::warn!(name, width, height, "raw samples do not match dimensions, writing original bytes");
                    write_verbatim(&path, bytes)?;
                }
            },
            ImageData::Opaque(bytes) => {
                tracing::debug!(name, "writing image without transcoding");
                write_verbatim(&path, bytes)?;
            }
        }

        Ok(path.to_string_lossy().into_owned())
    }
}

fn base_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn raw_to_image(bytes: &[u8], width: u32, height: u32, color: RawColor) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    match color {
        RawColor::Rgb => {
            let len = pixels.checked_mul(3)?;
            let buf = bytes.get(..len)?.to_vec();
            RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        RawColor::Gray => {
            let buf = bytes.get(..pixels)?.to_vec();
            GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
    }
}

fn save_png(img: &DynamicImage, path: &Path) -> Result<()> {
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write image {}", path.display()))
}

fn write_verbatim(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write image {}", path.display()))
}
