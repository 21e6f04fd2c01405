//! Arc_ID coordinate tables
//!
//! Sample locations come from a semicolon-delimited table with the columns
//! `Arc_ID`, `longitude` and `latitude`. Several rows may share one Arc_ID;
//! the values sampled at those rows are aggregated into a single output column.

use crate::errors::{ExtractError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Column names required in the coordinate table
pub const REQUIRED_COLUMNS: [&str; 3] = ["Arc_ID", "longitude", "latitude"];

/// Identifier of a spatial analysis unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcId(pub i64);

impl fmt::Display for ArcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ArcId {
    /// Builds an id from a numeric cell. Integral floats such as `63662.0` are accepted.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Some(ArcId(value as i64))
        } else {
            None
        }
    }
}

/// One row of the coordinate table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateRecord {
    pub arc_id: ArcId,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Arc_ID")]
    arc_id: f64,
    longitude: f64,
    latitude: f64,
}

/// All coordinate records of one Arc_ID
#[derive(Debug, Clone)]
pub struct ArcGroup {
    pub arc_id: ArcId,
    pub points: Vec<CoordinateRecord>,
}

/// Reads the coordinate table.
///
/// Malformed rows are logged and skipped. A missing file or a header without
/// the required columns is an error.
pub fn load_coordinates(path: &Path) -> Result<Vec<CoordinateRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ExtractError::Generic(format!(
                "Coordinate table {} has no '{}' column (found: {})",
                path.display(),
                column,
                headers.iter().collect::<Vec<_>>().join(";")
            )));
        }
    }

    let mut records = Vec::new();
    for (line, row) in reader.deserialize::<RawRecord>().enumerate() {
        // header is line 1
        let line = line + 2;
        let raw = match row {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping coordinate row {line}: {e}");
                continue;
            }
        };
        let Some(arc_id) = ArcId::from_f64(raw.arc_id) else {
            warn!("Skipping coordinate row {line}: Arc_ID {} is not an integer", raw.arc_id);
            continue;
        };
        records.push(CoordinateRecord {
            arc_id,
            longitude: raw.longitude,
            latitude: raw.latitude,
        });
    }

    debug!("Loaded {} coordinate records from {}", records.len(), path.display());
    Ok(records)
}

/// Groups records by Arc_ID, keeping the order in which ids first appear.
pub fn group_by_arc(records: &[CoordinateRecord]) -> Vec<ArcGroup> {
    let mut slots: HashMap<ArcId, usize> = HashMap::new();
    let mut groups: Vec<ArcGroup> = Vec::new();

    for record in records {
        match slots.get(&record.arc_id) {
            Some(&slot) => groups[slot].points.push(*record),
            None => {
                slots.insert(record.arc_id, groups.len());
                groups.push(ArcGroup {
                    arc_id: record.arc_id,
                    points: vec![*record],
                });
            }
        }
    }

    groups
}

/// Arc_IDs in order of first appearance
pub fn arc_order(records: &[CoordinateRecord]) -> Vec<ArcId> {
    group_by_arc(records).into_iter().map(|g| g.arc_id).collect()
}
