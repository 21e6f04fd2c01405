//! arc_extract: point time series from gridded geophysical datasets
//!
//! Samples NetCDF cubes and GeoTIFF raster stacks at fixed Arc_ID locations,
//! aggregates the samples of each Arc_ID per time step and writes wide,
//! semicolon-delimited CSV tables (one row per time step, one column per Arc_ID).
//!
//! ## Module Organization
//!
//! - [`coordinates`]: Arc_ID coordinate tables
//! - [`grid`]: NetCDF cubes and nearest-cell lookup
//! - [`time_axis`]: CF time decoding and synthesized monthly axes
//! - [`raster`]: single-band GeoTIFF reading and pixel lookup
//! - [`raster_stack`]: dated raster directories sampled in parallel
//! - [`aggregation`]: per-unit means and categorical rules
//! - [`table`]: outer-joined wide tables and CSV output
//! - [`pipelines`]: dataset presets (GIEMS-2, WAD2M, WaterGAP, GSW, GWP)
//! - [`config`]: job arguments and JSON run files
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//! ```rust,no_run
//! use arc_extract::prelude::*;
//! use std::path::Path;
//!
//! let records = load_coordinates(Path::new("arcs.csv")).unwrap();
//! let groups = group_by_arc(&records);
//!
//! let file = netcdf::open("giems2.nc").unwrap();
//! let names = GridNames::new("time", "latitude", "longitude");
//! let cube = GridCube::load(&file, "Fw", &names, TimeAxisSpec::Cf, DateWindow::default()).unwrap();
//!
//! let table = extract_mean_table(&cube, &groups, Some(4));
//! write_time_table(&table, Path::new("giems2_arcs.csv")).unwrap();
//! ```

pub mod aggregation;
pub mod config;
pub mod coordinates;
pub mod errors;
pub mod grid;
pub mod parallel;
pub mod pipelines;
pub mod raster;
pub mod raster_stack;
pub mod table;
pub mod time_axis;

pub use errors::{ExtractError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::aggregation::{CategoricalRule, Cell, RuleOutput};
    pub use crate::coordinates::{group_by_arc, load_coordinates, ArcGroup, ArcId, CoordinateRecord};
    pub use crate::errors::{ExtractError, Result};
    pub use crate::grid::{GridCube, GridNames};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipelines::{extract_mean_table, write_time_table, Dataset, Job};
    pub use crate::raster::GeoRaster;
    pub use crate::raster_stack::DatePattern;
    pub use crate::table::WideTable;
    pub use crate::time_axis::{DateWindow, TimeAxisSpec};
}
