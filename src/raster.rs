//! Single-band GeoTIFF rasters.
//!
//! Uses the pure Rust `tiff` decoder; georeferencing comes from the
//! ModelTransformation tag (34264) or from ModelTiepoint (33922) combined with
//! ModelPixelScale (33550). Only north-up rasters are supported.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::errors::{ExtractError, Result};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;

/// Affine pixel-to-map transform of a north-up raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width
    pub pixel_width: f64,
    /// Pixel height (positive, rows grow southwards)
    pub pixel_height: f64,
}

/// Map extent of a raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    /// Inclusive containment test on all four edges.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.left <= lon && lon <= self.right && self.bottom <= lat && lat <= self.top
    }
}

impl GeoTransform {
    /// Builds a transform from raw GeoTIFF tag values.
    pub fn from_tags(
        transformation: Option<&[f64]>,
        tiepoint: Option<&[f64]>,
        scale: Option<&[f64]>,
    ) -> Option<Self> {
        if let Some(m) = transformation.filter(|m| m.len() >= 8) {
            // row-major 4x4: [a b 0 d; e f 0 h; ...]; rotation terms must be zero
            if m[1] == 0.0 && m[4] == 0.0 && m[0] > 0.0 && m[5] < 0.0 {
                return Some(Self {
                    origin_x: m[3],
                    origin_y: m[7],
                    pixel_width: m[0],
                    pixel_height: -m[5],
                });
            }
            return None;
        }

        let (tie, scale) = (tiepoint?, scale?);
        if tie.len() < 6 || scale.len() < 2 || scale[0] <= 0.0 || scale[1] <= 0.0 {
            return None;
        }
        // ModelTiepoint: [I, J, K, X, Y, Z] ties raster (I, J) to model (X, Y)
        Some(Self {
            origin_x: tie[3] - tie[0] * scale[0],
            origin_y: tie[4] + tie[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        })
    }

    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        Bounds {
            left: self.origin_x,
            top: self.origin_y,
            right: self.origin_x + width as f64 * self.pixel_width,
            bottom: self.origin_y - height as f64 * self.pixel_height,
        }
    }

    /// Row/column of the pixel containing a map coordinate (may be out of range).
    pub fn index(&self, lon: f64, lat: f64) -> (i64, i64) {
        let row = ((self.origin_y - lat) / self.pixel_height).floor() as i64;
        let col = ((lon - self.origin_x) / self.pixel_width).floor() as i64;
        (row, col)
    }
}

/// First band of a GeoTIFF with its georeferencing
#[derive(Debug, Clone)]
pub struct GeoRaster {
    pub band: Array2<f32>,
    pub transform: GeoTransform,
}

fn decode_band(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
    }
}

impl GeoRaster {
    /// Reads the first band and the geotransform of a GeoTIFF.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);

        let transformation = decoder
            .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION))
            .ok();
        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok();
        let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE)).ok();

        let transform = GeoTransform::from_tags(
            transformation.as_deref(),
            tiepoint.as_deref(),
            scale.as_deref(),
        )
        .ok_or_else(|| ExtractError::MissingGeotransform {
            path: path.to_path_buf(),
            message: "no usable ModelTransformation or ModelTiepoint/ModelPixelScale tags"
                .to_string(),
        })?;

        let samples = decode_band(decoder.read_image()?);
        let per_pixel = samples.len() / (width * height).max(1);
        let band = if per_pixel > 1 {
            // interleaved multi-sample image; keep the first sample of each pixel
            samples.into_iter().step_by(per_pixel).collect()
        } else {
            samples
        };
        let band = Array2::from_shape_vec((height, width), band)?;

        Ok(Self { band, transform })
    }

    pub fn width(&self) -> usize {
        self.band.ncols()
    }

    pub fn height(&self) -> usize {
        self.band.nrows()
    }

    pub fn bounds(&self) -> Bounds {
        self.transform.bounds(self.width(), self.height())
    }

    /// Pixel value at a map coordinate, `None` outside the raster.
    pub fn sample(&self, lon: f64, lat: f64) -> Option<f32> {
        if !self.bounds().contains(lon, lat) {
            return None;
        }
        let (row, col) = self.transform.index(lon, lat);
        if row < 0 || col < 0 {
            return None;
        }
        self.band.get((row as usize, col as usize)).copied()
    }
}
