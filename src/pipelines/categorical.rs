//! Categorical raster stacks
//!
//! Pixel values of every Arc_ID are pooled per date label and reduced with
//! one [`CategoricalRule`] per output table.

use crate::aggregation::{Cell, RuleOutput};
use crate::coordinates::{arc_order, load_coordinates, ArcId};
use crate::errors::{ExtractError, Result};
use crate::raster_stack::{extract_stack, list_rasters, pool_by_label, DatePattern};
use crate::table::WideTable;
use log::info;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// Extraction of a GeoTIFF directory into one or more rule tables
#[derive(Debug, Clone, PartialEq)]
pub struct RasterJob {
    pub tif_dir: PathBuf,
    pub coordinates: PathBuf,
    pub pattern: DatePattern,
    pub outputs: Vec<(RuleOutput, PathBuf)>,
}

/// Applies a rule to pooled samples.
///
/// Columns are the Arc_IDs sampled on at least one date, in `order`. Every
/// date label gets a row, even when nothing was sampled on it.
pub fn categorical_table(
    pooled: &BTreeMap<String, HashMap<ArcId, Vec<f64>>>,
    output: &RuleOutput,
    order: &[ArcId],
) -> WideTable<String> {
    let seen: HashSet<ArcId> = pooled.values().flat_map(|m| m.keys().copied()).collect();
    // coordinate-table order, not sorted by id text
    let columns: Vec<ArcId> = order.iter().copied().filter(|a| seen.contains(a)).collect();

    let mut table = WideTable::with_columns(columns.clone());
    for (label, samples) in pooled {
        table.ensure_row(label.clone());
        for &arc in &columns {
            let cell = match samples.get(&arc) {
                Some(values) => output.rule.apply(values),
                None if output.fill_absent => output.rule.apply(&[]),
                None => Cell::Missing,
            };
            if !cell.is_missing() {
                table.insert(label.clone(), arc, cell);
            }
        }
    }
    table
}

impl RasterJob {
    /// Runs the job and returns the written files.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let records = load_coordinates(&self.coordinates)?;
        let order = arc_order(&records);

        let files = list_rasters(&self.tif_dir)?;
        if files.is_empty() {
            return Err(ExtractError::Generic(format!(
                "No GeoTIFF files found in {}",
                self.tif_dir.display()
            )));
        }
        info!("Found {} TIFF files in {}", files.len(), self.tif_dir.display());

        let samples = extract_stack(&files, self.pattern, &records);
        info!("Sampled {} of {} files", samples.len(), files.len());
        let pooled = pool_by_label(samples);

        let mut written = Vec::new();
        for (output, path) in &self.outputs {
            let table = categorical_table(&pooled, output, &order);
            table.write_csv_file(path, String::clone)?;
            info!("Results saved to {} ({} dates).", path.display(), table.row_count());
            written.push(path.clone());
        }
        Ok(written)
    }
}
