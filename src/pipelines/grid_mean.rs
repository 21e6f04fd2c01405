//! NetCDF cube extraction with a per-unit mean
//!
//! For every Arc_ID the nearest-cell series of all its points are averaged
//! per time step (NaN-skipping). Units without a single valid value are
//! dropped. The per-unit series are outer-joined into one table per variable.

use crate::aggregation::{nanmean_series, round_to, Cell};
use crate::coordinates::{group_by_arc, load_coordinates, ArcGroup, ArcId};
use crate::errors::{ExtractError, Result};
use crate::grid::{GridCube, GridNames};
use crate::table::WideTable;
use crate::time_axis::{label_format, DateWindow, TimeAxisSpec};
use chrono::NaiveDateTime;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Where the tables of a grid job are written
#[derive(Debug, Clone, PartialEq)]
pub enum GridOutput {
    /// One file; only valid for a single variable
    File(PathBuf),
    /// One file per variable, `<dir>/<variable><suffix>`
    PerVariable { dir: PathBuf, suffix: String },
}

impl GridOutput {
    pub fn path_for(&self, variable: &str) -> PathBuf {
        match self {
            GridOutput::File(path) => path.clone(),
            GridOutput::PerVariable { dir, suffix } => dir.join(format!("{variable}{suffix}")),
        }
    }
}

/// Mean extraction of one or more variables from a NetCDF file
#[derive(Debug, Clone, PartialEq)]
pub struct GridMeanJob {
    pub file: PathBuf,
    pub coordinates: PathBuf,
    pub output: GridOutput,
    pub variables: Vec<String>,
    pub names: GridNames,
    pub time_axis: TimeAxisSpec,
    pub window: DateWindow,
    /// Decimal places kept in the output, `None` keeps full precision
    pub round: Option<u32>,
}

/// Builds the merged table of one variable.
pub fn extract_mean_table(
    cube: &GridCube,
    groups: &[ArcGroup],
    round: Option<u32>,
) -> WideTable<NaiveDateTime> {
    let mut processed: Vec<ArcId> = Vec::new();
    let mut valid: Vec<ArcId> = Vec::new();
    let mut table = WideTable::new();

    for group in groups {
        let series: Vec<_> = group
            .points
            .iter()
            .filter_map(|p| match cube.sample(p.latitude, p.longitude) {
                Ok(series) => Some(series),
                Err(e) => {
                    warn!("Error with coordinates Arc_ID {} ({}, {}): {e}", group.arc_id, p.latitude, p.longitude);
                    None
                }
            })
            .collect();
        if series.is_empty() {
            continue;
        }
        processed.push(group.arc_id);

        let means = nanmean_series(&series);
        if means.iter().all(|m| m.is_nan()) {
            info!("All values for Arc_ID {} are NaN - skipping.", group.arc_id);
            continue;
        }
        valid.push(group.arc_id);

        let cells = cube.times.iter().zip(means.iter()).map(|(&time, &mean)| {
            let mean = round.map_or(mean, |d| round_to(mean, d));
            (time, Cell::Value(mean as f32))
        });
        table = table.merge_outer(WideTable::from_series(group.arc_id, cells));
    }

    info!("Processed Arc_IDs: {}", join_ids(&processed));
    info!("Arc_IDs with valid data: {}", join_ids(&valid));

    if table.is_empty() {
        warn!("No valid time series found for '{}' - writing an empty table.", cube.variable);
        return WideTable::with_columns(processed);
    }
    table
}

fn join_ids(ids: &[ArcId]) -> String {
    ids.iter().map(ArcId::to_string).collect::<Vec<_>>().join(", ")
}

/// Writes a time-keyed table with date-only labels when possible.
pub fn write_time_table(table: &WideTable<NaiveDateTime>, path: &Path) -> Result<()> {
    let keys: Vec<NaiveDateTime> = table.keys().copied().collect();
    let format = label_format(&keys);
    table.write_csv_file(path, |t| t.format(format).to_string())
}

impl GridMeanJob {
    /// Runs the job and returns the written files.
    ///
    /// A variable that cannot be loaded is logged and skipped; the job fails
    /// only when nothing could be written.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        if self.variables.len() > 1 && matches!(self.output, GridOutput::File(_)) {
            return Err(ExtractError::Generic(
                "Several variables need an output directory".to_string(),
            ));
        }

        let records = load_coordinates(&self.coordinates)?;
        let groups = group_by_arc(&records);
        info!(
            "Loaded {} coordinates in {} Arc_IDs from {}",
            records.len(),
            groups.len(),
            self.coordinates.display()
        );

        let file = netcdf::open(&self.file)?;
        info!("Successfully opened NetCDF file: {}", self.file.display());

        let mut written = Vec::new();
        let mut last_error = None;
        for variable in &self.variables {
            info!("🔹 Extracting {variable} ...");
            let cube = match GridCube::load(&file, variable, &self.names, self.time_axis, self.window) {
                Ok(cube) => cube,
                Err(e) => {
                    warn!("Skipping variable '{variable}': {e}");
                    last_error = Some(e);
                    continue;
                }
            };
            let table = extract_mean_table(&cube, &groups, self.round);
            let path = self.output.path_for(variable);
            write_time_table(&table, &path)?;
            info!("✅ {variable} saved to: {}", path.display());
            written.push(path);
        }

        match (written.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(written),
        }
    }
}
