//! Job arguments shared by the command line and JSON run files
//!
//! Each dataset subcommand takes one of the argument structs below; a run
//! file lists the same structs tagged with their `dataset`:
//!
//! ```json
//! {
//!   "threads": 4,
//!   "jobs": [
//!     { "dataset": "giems2", "file": "giems2.nc", "coordinates": "arcs.csv", "output": "giems2.csv" },
//!     { "dataset": "gsw", "tif_dir": "gsw/", "coordinates": "arcs.csv" }
//!   ]
//! }
//! ```

use crate::errors::Result;
use crate::grid::GridNames;
use crate::pipelines::{Dataset, GridMeanJob, GridOutput, Job};
use crate::time_axis::DateWindow;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments of the NetCDF datasets
#[derive(clap::Args, Debug, Clone, PartialEq, Deserialize)]
pub struct GridArgs {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Semicolon-delimited table with Arc_ID;longitude;latitude
    #[arg(short, long)]
    pub coordinates: PathBuf,

    /// Output CSV (a directory for WaterGAP or when several variables are given)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Variable to extract, repeatable. Defaults to the dataset's variables
    #[arg(long = "variable")]
    #[serde(default)]
    pub variables: Vec<String>,

    /// Name of the latitude dimension and coordinate variable
    #[arg(long)]
    #[serde(default)]
    pub lat_name: Option<String>,

    /// Name of the longitude dimension and coordinate variable
    #[arg(long)]
    #[serde(default)]
    pub lon_name: Option<String>,

    /// Name of the time dimension and coordinate variable
    #[arg(long)]
    #[serde(default)]
    pub time_name: Option<String>,

    /// Round values to this many decimals
    #[arg(long)]
    #[serde(default)]
    pub round: Option<u32>,

    /// First date to keep (YYYY-MM-DD)
    #[arg(long)]
    #[serde(default)]
    pub start: Option<NaiveDate>,

    /// Last date to keep (YYYY-MM-DD)
    #[arg(long)]
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

fn default_gsw_output() -> PathBuf {
    PathBuf::from("GSW_water_values.csv")
}

fn default_gsw_no_observation() -> PathBuf {
    PathBuf::from("GSW_no_observation.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Arguments of the GSW raster stack
#[derive(clap::Args, Debug, Clone, PartialEq, Deserialize)]
pub struct GswArgs {
    /// Directory of GeoTIFF files named `<date>-....tif`
    #[arg(long)]
    pub tif_dir: PathBuf,

    /// Semicolon-delimited table with Arc_ID;longitude;latitude
    #[arg(short, long)]
    pub coordinates: PathBuf,

    /// Water pixel counts per Arc_ID and date
    #[arg(short, long, default_value = "GSW_water_values.csv")]
    #[serde(default = "default_gsw_output")]
    pub output: PathBuf,

    /// Percentage of unobserved pixels per Arc_ID and date
    #[arg(long, default_value = "GSW_no_observation.csv")]
    #[serde(default = "default_gsw_no_observation")]
    pub no_observation_output: PathBuf,
}

/// Arguments of the GWP raster stack
#[derive(clap::Args, Debug, Clone, PartialEq, Deserialize)]
pub struct GwpArgs {
    /// Directory of GeoTIFF files with a `YYYYMMDD` token in their names
    #[arg(long)]
    pub tif_dir: PathBuf,

    /// Semicolon-delimited table with Arc_ID;longitude;latitude
    #[arg(short, long)]
    pub coordinates: PathBuf,

    /// Directory receiving GWP_water_values.csv and GWP_no_water_values.csv
    #[arg(long, default_value = ".")]
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// One job of a run file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "dataset", rename_all = "lowercase")]
pub enum JobSpec {
    Giems2(GridArgs),
    Wad2m(GridArgs),
    Watergap(GridArgs),
    Gsw(GswArgs),
    Gwp(GwpArgs),
}

/// Contents of a JSON run file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub threads: Option<usize>,
    pub jobs: Vec<JobSpec>,
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl GridArgs {
    /// Fills unset arguments from the dataset defaults.
    pub fn into_job(self, dataset: Dataset) -> GridMeanJob {
        let defaults = dataset.default_names();
        let names = GridNames {
            time: self.time_name.unwrap_or(defaults.time),
            lat: self.lat_name.unwrap_or(defaults.lat),
            lon: self.lon_name.unwrap_or(defaults.lon),
        };

        let default_window = dataset.default_window();
        let window = DateWindow::new(
            self.start.or(default_window.start),
            self.end.or(default_window.end),
        );

        let variables = if self.variables.is_empty() {
            dataset.default_variables()
        } else {
            self.variables
        };

        let output = if dataset.per_variable_output() || variables.len() > 1 {
            GridOutput::PerVariable {
                dir: self.output,
                suffix: Dataset::window_suffix(&window),
            }
        } else {
            GridOutput::File(self.output)
        };

        GridMeanJob {
            file: self.file,
            coordinates: self.coordinates,
            output,
            variables,
            names,
            time_axis: dataset.default_time_axis(),
            window,
            round: self.round.or(dataset.default_round()),
        }
    }
}

impl JobSpec {
    pub fn dataset(&self) -> Dataset {
        match self {
            JobSpec::Giems2(_) => Dataset::Giems2,
            JobSpec::Wad2m(_) => Dataset::Wad2m,
            JobSpec::Watergap(_) => Dataset::WaterGap,
            JobSpec::Gsw(_) => Dataset::Gsw,
            JobSpec::Gwp(_) => Dataset::Gwp,
        }
    }

    pub fn into_job(self) -> Job {
        let dataset = self.dataset();
        match self {
            JobSpec::Giems2(args) | JobSpec::Wad2m(args) | JobSpec::Watergap(args) => {
                Job::Grid(args.into_job(dataset))
            }
            JobSpec::Gsw(args) => Job::Raster(Dataset::gsw_job(
                &args.tif_dir,
                &args.coordinates,
                &args.output,
                &args.no_observation_output,
            )),
            JobSpec::Gwp(args) => Job::Raster(Dataset::gwp_job(
                &args.tif_dir,
                &args.coordinates,
                &args.output_dir,
            )),
        }
    }
}
