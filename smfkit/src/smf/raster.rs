//! Raster payloads: image conversion and write-time sourcing.

use super::error::SmfError;
use super::section::{RasterFormat, RasterSpec, Section};
use crate::dxt::{decode_minimap, encode_minimap};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 16-bit grayscale image, the in-memory form of a height map.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Map a world height to the stored 16-bit value.
///
/// `round((h - min) / (max - min) × 65535)`, clamped to the range.
pub fn quantize_height(h: f32, min: f32, max: f32) -> u16 {
    if max <= min || !h.is_finite() {
        return 0;
    }
    let t = ((h - min) / (max - min)).clamp(0.0, 1.0);
    (t * 65535.0).round() as u16
}

/// Inverse of [`quantize_height`].
pub fn dequantize_height(v: u16, min: f32, max: f32) -> f32 {
    min + (v as f32 / 65535.0) * (max - min)
}

/// Everything a raster source needs to produce one section.
#[derive(Debug, Clone, Copy)]
pub struct RasterRequest {
    pub section: Section,
    pub spec: RasterSpec,
    pub min_height: f32,
    pub max_height: f32,
}

/// Supplies raster bytes at write time for sections with no in-memory payload.
pub trait RasterIo: Send {
    fn supply(&self, request: &RasterRequest) -> Result<Vec<u8>, SmfError>;
}

/// Zero-filled rasters.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankIo;

impl RasterIo for BlankIo {
    fn supply(&self, request: &RasterRequest) -> Result<Vec<u8>, SmfError> {
        warn!(section = %request.section, "No source for section, wrote blank");
        Ok(vec![0u8; request.spec.byte_len() as usize])
    }
}

/// Loads one image file per section, falling back to blank.
#[derive(Debug, Clone, Default)]
pub struct ImageIo {
    sources: BTreeMap<Section, PathBuf>,
}

impl ImageIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, section: Section, path: impl Into<PathBuf>) -> Self {
        self.set(section, path);
        self
    }

    pub fn set(&mut self, section: Section, path: impl Into<PathBuf>) {
        self.sources.insert(section, path.into());
    }

    pub fn source(&self, section: Section) -> Option<&Path> {
        self.sources.get(&section).map(PathBuf::as_path)
    }
}

impl RasterIo for ImageIo {
    fn supply(&self, request: &RasterRequest) -> Result<Vec<u8>, SmfError> {
        let Some(path) = self.sources.get(&request.section) else {
            return BlankIo.supply(request);
        };
        debug!(section = %request.section, path = %path.display(), "Loading raster image");
        let image = image::open(path)?;
        raster_from_image(&image, request)
    }
}

/// Convert an image to the stored bytes of a raster section, resizing to the
/// section's dimensions when they differ.
///
/// Float images are treated as world heights and quantised against the
/// request's height range; integer images are taken as already-scaled values.
pub fn raster_from_image(image: &DynamicImage, request: &RasterRequest) -> Result<Vec<u8>, SmfError> {
    let spec = &request.spec;
    match spec.format {
        RasterFormat::Gray16 => {
            let gray = match image {
                DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                    let float = image.to_rgb32f();
                    Gray16Image::from_fn(float.width(), float.height(), |x, y| {
                        let h = float.get_pixel(x, y).0[0];
                        Luma([quantize_height(h, request.min_height, request.max_height)])
                    })
                }
                _ => image.to_luma16(),
            };
            let gray = fit(gray, spec);
            Ok(gray.as_raw().iter().flat_map(|v| v.to_le_bytes()).collect())
        }
        RasterFormat::Gray8 => Ok(fit(image.to_luma8(), spec).into_raw()),
        RasterFormat::Dxt1 { .. } => Ok(encode_minimap(&image.to_rgba8())?),
    }
}

fn fit<P>(image: ImageBuffer<P, Vec<P::Subpixel>>, spec: &RasterSpec) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: image::Pixel + 'static,
    P::Subpixel: 'static,
{
    if image.dimensions() == (spec.width, spec.height) {
        image
    } else {
        debug!(
            from = ?image.dimensions(),
            to = ?(spec.width, spec.height),
            "Resizing raster"
        );
        imageops::resize(&image, spec.width, spec.height, FilterType::Triangle)
    }
}

/// Convert stored raster bytes back into an image.
pub fn raster_to_image(
    section: Section,
    data: &[u8],
    spec: &RasterSpec,
) -> Result<DynamicImage, SmfError> {
    let expected = spec.byte_len();
    let length_error = || SmfError::RasterLength {
        section,
        expected,
        actual: data.len() as u64,
    };
    if data.len() as u64 != expected {
        return Err(length_error());
    }

    match spec.format {
        RasterFormat::Gray16 => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            let image = Gray16Image::from_raw(spec.width, spec.height, samples).ok_or_else(length_error)?;
            Ok(DynamicImage::ImageLuma16(image))
        }
        RasterFormat::Gray8 => {
            let image = GrayImage::from_raw(spec.width, spec.height, data.to_vec()).ok_or_else(length_error)?;
            Ok(DynamicImage::ImageLuma8(image))
        }
        RasterFormat::Dxt1 { .. } => Ok(DynamicImage::ImageRgba8(decode_minimap(data)?)),
    }
}
