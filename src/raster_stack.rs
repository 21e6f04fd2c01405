//! Directories of dated GeoTIFF rasters
//!
//! Each file contributes one date label; the pixel under every in-bounds
//! coordinate is collected per Arc_ID. Files are decoded in parallel and only
//! the collected samples outlive the worker.

use crate::coordinates::{ArcId, CoordinateRecord};
use crate::errors::Result;
use crate::raster::GeoRaster;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// How a date label is read from a raster file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    /// Everything before the first `-`, e.g. `2020-01_tile.tif` -> `2020`
    PrefixBeforeDash,
    /// First dot-separated 8-digit token read as `YYYYMMDD`, rendered `YYYY-MM-DD`
    CompactDate,
}

impl DatePattern {
    /// Date label for a file name, `None` when the pattern does not match.
    pub fn label(&self, file_name: &str) -> Option<String> {
        match self {
            DatePattern::PrefixBeforeDash => file_name
                .split('-')
                .next()
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            DatePattern::CompactDate => file_name
                .split('.')
                .find(|part| part.len() == 8 && part.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|part| NaiveDate::parse_from_str(part, "%Y%m%d").ok())
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// Samples of one raster file
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSamples {
    pub label: String,
    pub values: HashMap<ArcId, Vec<f64>>,
}

/// Lists GeoTIFF files of a directory, sorted by name.
pub fn list_rasters(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Collects the pixel under each coordinate; out-of-bounds points are skipped.
pub fn sample_raster(raster: &GeoRaster, coordinates: &[CoordinateRecord]) -> HashMap<ArcId, Vec<f64>> {
    let mut values: HashMap<ArcId, Vec<f64>> = HashMap::new();
    for point in coordinates {
        if let Some(v) = raster.sample(point.longitude, point.latitude) {
            values.entry(point.arc_id).or_default().push(f64::from(v));
        }
    }
    values
}

fn process_file(path: &Path, pattern: DatePattern, coordinates: &[CoordinateRecord]) -> Option<RasterSamples> {
    let name = path.file_name()?.to_string_lossy().into_owned();
    let Some(label) = pattern.label(&name) else {
        warn!("Skipping {name}: no date found in file name");
        return None;
    };

    match GeoRaster::open(path) {
        Ok(raster) => {
            let values = sample_raster(&raster, coordinates);
            debug!(
                "{name}: {}x{} pixels, {} Arc_IDs sampled",
                raster.width(),
                raster.height(),
                values.len()
            );
            Some(RasterSamples { label, values })
        }
        Err(e) => {
            warn!("Error processing {name}: {e}");
            None
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style.progress_chars("=> "));
    bar.set_message("Processing TIFF files");
    bar
}

/// Samples every file of a stack. Failed files are logged and left out;
/// results keep the order of `files`.
pub fn extract_stack(
    files: &[PathBuf],
    pattern: DatePattern,
    coordinates: &[CoordinateRecord],
) -> Vec<RasterSamples> {
    let bar = progress_bar(files.len());
    let results: Vec<Option<RasterSamples>> = files
        .par_iter()
        .map(|path| {
            let samples = process_file(path, pattern, coordinates);
            bar.inc(1);
            samples
        })
        .collect();
    bar.finish_and_clear();
    results.into_iter().flatten().collect()
}

/// Pools samples of files sharing a date label.
pub fn pool_by_label(samples: Vec<RasterSamples>) -> BTreeMap<String, HashMap<ArcId, Vec<f64>>> {
    let mut pooled: BTreeMap<String, HashMap<ArcId, Vec<f64>>> = BTreeMap::new();
    for file in samples {
        let slot = pooled.entry(file.label).or_default();
        for (arc, values) in file.values {
            slot.entry(arc).or_default().extend(values);
        }
    }
    pooled
}
