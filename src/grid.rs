//! NetCDF grid cubes and nearest-cell lookup
//!
//! A [`GridCube`] holds one variable as a `(time, latitude, longitude)` array
//! together with its decoded coordinate axes. Values flagged by `_FillValue`
//! or `missing_value` are stored as NaN and packed values are unpacked with
//! `scale_factor`/`add_offset`.

use crate::errors::{ExtractError, Result};
use crate::time_axis::{decode_cf_times, monthly_axis, DateWindow, TimeAxisSpec};
use chrono::NaiveDateTime;
use log::{debug, warn};
use ndarray::{s, Array3, ArrayD, ArrayView1, Axis, Ix3};
use netcdf::{AttributeValue, File, Variable};

/// Names of the coordinate dimensions/variables of a cube
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridNames {
    pub time: String,
    pub lat: String,
    pub lon: String,
}

impl GridNames {
    pub fn new(time: &str, lat: &str, lon: &str) -> Self {
        Self {
            time: time.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
        }
    }
}

impl Default for GridNames {
    fn default() -> Self {
        Self::new("time", "lat", "lon")
    }
}

/// One variable loaded as a `(time, lat, lon)` cube
#[derive(Debug, Clone)]
pub struct GridCube {
    pub variable: String,
    pub times: Vec<NaiveDateTime>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub data: Array3<f32>,
}

/// Cell indices of a located point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellIndex {
    pub lat: usize,
    pub lon: usize,
}

/// Index of the axis entry closest to `value`.
///
/// NaN entries are ignored and ties resolve to the lowest index.
pub fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    axis.iter()
        .enumerate()
        .filter(|(_, c)| !c.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, &c)| {
            let distance = (c - value).abs();
            match best {
                Some((_, d)) if d <= distance => best,
                _ => Some((i, distance)),
            }
        })
        .map(|(i, _)| i)
}

/// Shifts a negative longitude onto a 0..360 axis.
pub fn normalize_longitude(axis: &[f64], lon: f64) -> f64 {
    let max = axis.iter().cloned().filter(|v| !v.is_nan()).fold(f64::NEG_INFINITY, f64::max);
    if max > 180.0 && lon < 0.0 {
        lon + 360.0
    } else {
        lon
    }
}

pub(crate) fn attr_f64(var: &Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            AttributeValue::Double(d) => Some(d),
            AttributeValue::Float(f) => Some(f64::from(f)),
            AttributeValue::Int(i) => Some(f64::from(i)),
            AttributeValue::Short(s) => Some(f64::from(s)),
            AttributeValue::Schar(b) => Some(f64::from(b)),
            AttributeValue::Uchar(b) => Some(f64::from(b)),
            AttributeValue::Ushort(u) => Some(f64::from(u)),
            AttributeValue::Uint(u) => Some(f64::from(u)),
            AttributeValue::Doubles(ds) => ds.first().copied(),
            AttributeValue::Floats(fs) => fs.first().map(|&f| f64::from(f)),
            _ => None,
        })
}

fn attr_string(var: &Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            AttributeValue::Str(s) => Some(s),
            AttributeValue::Strs(ss) => ss.into_iter().next(),
            _ => None,
        })
}

fn read_axis(file: &File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| ExtractError::VariableNotFound {
            var: name.to_string(),
        })?;
    Ok(var.get_values::<f64, _>(..)?)
}

fn read_times(file: &File, name: &str, len: usize, spec: TimeAxisSpec) -> Result<Vec<NaiveDateTime>> {
    match spec {
        TimeAxisSpec::MonthlyFrom { year, month } => monthly_axis(year, month, len),
        TimeAxisSpec::Cf => {
            let var = file
                .variable(name)
                .ok_or_else(|| ExtractError::VariableNotFound {
                    var: name.to_string(),
                })?;
            let units = attr_string(&var, "units").ok_or_else(|| ExtractError::InvalidTimeUnits {
                units: String::new(),
                message: format!("time variable '{name}' has no units attribute"),
            })?;
            if let Some(calendar) = attr_string(&var, "calendar") {
                if !matches!(calendar.as_str(), "standard" | "gregorian" | "proleptic_gregorian") {
                    warn!("Calendar '{calendar}' decoded as proleptic Gregorian");
                }
            }
            let values = var.get_values::<f64, _>(..)?;
            decode_cf_times(&values, &units)
        }
    }
}

/// Masks fill values and unpacks scaled data in place.
fn unpack_values(var: &Variable, values: &mut [f32]) {
    let fills: Vec<f64> = ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| attr_f64(var, name))
        .collect();
    let scale = attr_f64(var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(var, "add_offset").unwrap_or(0.0);
    let packed = scale != 1.0 || offset != 0.0;

    for v in values.iter_mut() {
        let raw = f64::from(*v);
        if fills.iter().any(|&f| raw == f || (raw - f).abs() <= f.abs() * 1e-6) {
            *v = f32::NAN;
        } else if packed {
            *v = (raw * scale + offset) as f32;
        }
    }
}

impl GridCube {
    /// Loads `var_name` from an open NetCDF file.
    ///
    /// The variable must have exactly the three dimensions named in `names`,
    /// in any order. Time steps outside `window` are dropped.
    pub fn load(
        file: &File,
        var_name: &str,
        names: &GridNames,
        time_spec: TimeAxisSpec,
        window: DateWindow,
    ) -> Result<Self> {
        let var = file
            .variable(var_name)
            .ok_or_else(|| ExtractError::VariableNotFound {
                var: var_name.to_string(),
            })?;

        let dim_names: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let axis_of = |dim: &str| {
            dim_names
                .iter()
                .position(|d| d == dim)
                .ok_or_else(|| ExtractError::DimensionNotFound {
                    var: var_name.to_string(),
                    dim: dim.to_string(),
                })
        };
        let time_axis = axis_of(&names.time)?;
        let lat_axis = axis_of(&names.lat)?;
        let lon_axis = axis_of(&names.lon)?;
        if dim_names.len() != 3 {
            return Err(ExtractError::Generic(format!(
                "Variable '{var_name}' has dimensions [{}], expected exactly ({}, {}, {})",
                dim_names.join(", "),
                names.time,
                names.lat,
                names.lon
            )));
        }

        let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
        debug!("Loading '{var_name}' with shape {shape:?} and dimensions {dim_names:?}");

        let mut values = var.get_values::<f32, _>(..)?;
        unpack_values(&var, &mut values);

        let data = ArrayD::from_shape_vec(shape, values)?
            .into_dimensionality::<Ix3>()?
            .permuted_axes([time_axis, lat_axis, lon_axis]);

        let lats = read_axis(file, &names.lat)?;
        let lons = read_axis(file, &names.lon)?;
        let times = read_times(file, &names.time, data.len_of(Axis(0)), time_spec)?;

        if lats.len() != data.len_of(Axis(1)) || lons.len() != data.len_of(Axis(2)) {
            return Err(ExtractError::Generic(format!(
                "Coordinate lengths ({}, {}) do not match grid ({}, {})",
                lats.len(),
                lons.len(),
                data.len_of(Axis(1)),
                data.len_of(Axis(2))
            )));
        }
        if times.len() != data.len_of(Axis(0)) {
            return Err(ExtractError::Generic(format!(
                "Time coordinate has {} entries, grid has {} steps",
                times.len(),
                data.len_of(Axis(0))
            )));
        }

        let cube = Self {
            variable: var_name.to_string(),
            times,
            lats,
            lons,
            data: data.as_standard_layout().into_owned(),
        };

        Ok(if window.is_unbounded() {
            cube
        } else {
            cube.restrict_to(window)
        })
    }

    /// Keeps only the time steps inside `window`.
    pub fn restrict_to(self, window: DateWindow) -> Self {
        let keep: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, t)| window.contains(t))
            .map(|(i, _)| i)
            .collect();
        let times = keep.iter().map(|&i| self.times[i]).collect();
        let data = self.data.select(Axis(0), &keep);
        Self {
            times,
            data,
            ..self
        }
    }

    /// Locates the grid cell nearest to a point.
    pub fn locate(&self, lat: f64, lon: f64) -> Result<CellIndex> {
        let invalid = |message: &str| ExtractError::InvalidCoordinate {
            lat,
            lon,
            message: message.to_string(),
        };
        let lat_idx = nearest_index(&self.lats, lat).ok_or_else(|| invalid("no latitude match"))?;
        let lon = normalize_longitude(&self.lons, lon);
        let lon_idx = nearest_index(&self.lons, lon).ok_or_else(|| invalid("no longitude match"))?;
        Ok(CellIndex {
            lat: lat_idx,
            lon: lon_idx,
        })
    }

    /// Time series of one cell.
    pub fn series(&self, cell: CellIndex) -> ArrayView1<'_, f32> {
        self.data.slice(s![.., cell.lat, cell.lon])
    }

    /// Time series of the cell nearest to a point.
    pub fn sample(&self, lat: f64, lon: f64) -> Result<ArrayView1<'_, f32>> {
        Ok(self.series(self.locate(lat, lon)?))
    }
}
