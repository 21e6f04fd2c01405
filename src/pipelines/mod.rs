//! Dataset pipelines
//!
//! Two job shapes cover every supported product:
//! - [`grid_mean`]: NetCDF cubes reduced to a per-unit mean (GIEMS-2, WAD2M, WaterGAP)
//! - [`categorical`]: GeoTIFF stacks reduced with categorical rules (GSW, GWP)
//!
//! [`Dataset`] holds the per-product defaults.

pub mod categorical;
pub mod grid_mean;

pub use categorical::{categorical_table, RasterJob};
pub use grid_mean::{extract_mean_table, write_time_table, GridMeanJob, GridOutput};

use crate::aggregation::{CategoricalRule, RuleOutput};
use crate::errors::Result;
use crate::grid::GridNames;
use crate::raster_stack::DatePattern;
use crate::time_axis::{DateWindow, TimeAxisSpec};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Supported products
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    /// GIEMS-2 inundation fraction
    Giems2,
    /// WAD2M wetland area
    Wad2m,
    /// WaterGAP local and global wetland extent
    WaterGap,
    /// JRC Global Surface Water monthly history
    Gsw,
    /// Global Water Pack daily water maps
    Gwp,
}

/// Categorical codes of GSW rasters
pub mod gsw_codes {
    pub const NO_OBSERVATION: f64 = 0.0;
    pub const NOT_WATER: f64 = 1.0;
    pub const WATER: f64 = 2.0;
}

/// Categorical codes of GWP rasters
pub mod gwp_codes {
    pub const NO_WATER: f64 = 0.0;
    pub const WATER: f64 = 1.0;
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Giems2 => "GIEMS2",
            Dataset::Wad2m => "WAD2M",
            Dataset::WaterGap => "WaterGAP",
            Dataset::Gsw => "GSW",
            Dataset::Gwp => "GWP",
        }
    }

    /// Variables extracted by default
    pub fn default_variables(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Dataset::Giems2 | Dataset::Wad2m => &["Fw"],
            Dataset::WaterGap => &["locwet_extent", "glowet_extent"],
            Dataset::Gsw | Dataset::Gwp => &[],
        };
        names.iter().map(|s| s.to_string()).collect()
    }

    pub fn default_names(&self) -> GridNames {
        match self {
            Dataset::Giems2 => GridNames::new("time", "latitude", "longitude"),
            _ => GridNames::default(),
        }
    }

    pub fn default_time_axis(&self) -> TimeAxisSpec {
        match self {
            // stored time values are not decodable; the product is monthly from 1901
            Dataset::WaterGap => TimeAxisSpec::MonthlyFrom { year: 1901, month: 1 },
            _ => TimeAxisSpec::Cf,
        }
    }

    pub fn default_window(&self) -> DateWindow {
        match self {
            Dataset::WaterGap => DateWindow::new(
                NaiveDate::from_ymd_opt(2003, 1, 1),
                NaiveDate::from_ymd_opt(2019, 12, 31),
            ),
            _ => DateWindow::default(),
        }
    }

    pub fn default_round(&self) -> Option<u32> {
        match self {
            Dataset::Giems2 => Some(4),
            _ => None,
        }
    }

    /// Whether `--output` names a directory receiving one file per variable
    pub fn per_variable_output(&self) -> bool {
        matches!(self, Dataset::WaterGap)
    }

    pub fn date_pattern(&self) -> DatePattern {
        match self {
            Dataset::Gwp => DatePattern::CompactDate,
            _ => DatePattern::PrefixBeforeDash,
        }
    }

    /// Flagged water count, `0` for observed dry pixels
    pub fn gsw_water_rule() -> RuleOutput {
        RuleOutput {
            rule: CategoricalRule::FlagCount {
                flag: gsw_codes::WATER,
                background: vec![gsw_codes::NO_OBSERVATION, gsw_codes::NOT_WATER],
            },
            fill_absent: false,
        }
    }

    /// Share of unobserved pixels among all classified pixels
    pub fn gsw_no_observation_rule() -> RuleOutput {
        RuleOutput {
            rule: CategoricalRule::Percentage {
                target: gsw_codes::NO_OBSERVATION,
                valid: vec![gsw_codes::NO_OBSERVATION, gsw_codes::NOT_WATER, gsw_codes::WATER],
                decimals: 1,
            },
            fill_absent: true,
        }
    }

    pub fn gwp_water_rule() -> RuleOutput {
        RuleOutput {
            rule: CategoricalRule::ValidSum {
                valid: vec![gwp_codes::NO_WATER, gwp_codes::WATER],
            },
            fill_absent: false,
        }
    }

    pub fn gwp_no_water_rule() -> RuleOutput {
        RuleOutput {
            rule: CategoricalRule::ValidCount {
                target: gwp_codes::NO_WATER,
                valid: vec![gwp_codes::NO_WATER, gwp_codes::WATER],
            },
            fill_absent: false,
        }
    }

    /// Per-variable file suffix for a windowed multi-variable product
    pub fn window_suffix(window: &DateWindow) -> String {
        use chrono::Datelike;
        match (window.start, window.end) {
            (Some(s), Some(e)) => format!("_{}-{}.csv", s.year(), e.year()),
            _ => ".csv".to_string(),
        }
    }

    /// GSW raster job writing the water-count and no-observation tables
    pub fn gsw_job(tif_dir: &Path, coordinates: &Path, output: &Path, no_observation: &Path) -> RasterJob {
        RasterJob {
            tif_dir: tif_dir.to_path_buf(),
            coordinates: coordinates.to_path_buf(),
            pattern: Dataset::Gsw.date_pattern(),
            outputs: vec![
                (Self::gsw_water_rule(), output.to_path_buf()),
                (Self::gsw_no_observation_rule(), no_observation.to_path_buf()),
            ],
        }
    }

    /// GWP raster job writing the water-sum and no-water tables into `output_dir`
    pub fn gwp_job(tif_dir: &Path, coordinates: &Path, output_dir: &Path) -> RasterJob {
        RasterJob {
            tif_dir: tif_dir.to_path_buf(),
            coordinates: coordinates.to_path_buf(),
            pattern: Dataset::Gwp.date_pattern(),
            outputs: vec![
                (Self::gwp_water_rule(), output_dir.join("GWP_water_values.csv")),
                (Self::gwp_no_water_rule(), output_dir.join("GWP_no_water_values.csv")),
            ],
        }
    }
}

/// A runnable job
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Grid(GridMeanJob),
    Raster(RasterJob),
}

impl Job {
    /// Runs the job and returns the written files.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        match self {
            Job::Grid(job) => job.run(),
            Job::Raster(job) => job.run(),
        }
    }
}
