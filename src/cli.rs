//! Defines command-line interface options using `clap` for the arc-extract application.

use arc_extract::config::{GridArgs, GswArgs, GwpArgs, JobSpec};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for extracting Arc_ID time series from gridded datasets
#[derive(Parser, Debug)]
#[command(
    version,
    name = "arc-extract",
    about = "Extract Arc_ID point time series from NetCDF cubes and GeoTIFF stacks"
)]
pub struct Args {
    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads for raster decoding. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// GIEMS-2 `Fw`: mean per Arc_ID, rounded to 4 decimals
    Giems2(GridArgs),
    /// WAD2M `Fw`: mean per Arc_ID
    Wad2m(GridArgs),
    /// WaterGAP wetland extents, monthly from 1901, windowed to 2003-2019
    Watergap(GridArgs),
    /// Global Surface Water rasters: water counts and no-observation share
    Gsw(GswArgs),
    /// Global Water Pack rasters: water sums and dry counts
    Gwp(GwpArgs),
    /// Run every job listed in a JSON run file
    Run {
        /// Path to the run file
        #[arg(short, long)]
        config: PathBuf,
    },
}

impl Command {
    /// The single job of a dataset subcommand, `None` for `run`.
    pub fn into_job_spec(self) -> Option<JobSpec> {
        match self {
            Command::Giems2(args) => Some(JobSpec::Giems2(args)),
            Command::Wad2m(args) => Some(JobSpec::Wad2m(args)),
            Command::Watergap(args) => Some(JobSpec::Watergap(args)),
            Command::Gsw(args) => Some(JobSpec::Gsw(args)),
            Command::Gwp(args) => Some(JobSpec::Gwp(args)),
            Command::Run { .. } => None,
        }
    }
}
