//! Wide time-indexed tables
//!
//! One row per time key, one column per Arc_ID. Rows are kept in key order so
//! the written table is always sorted by time; cells never filled are written
//! empty.

use crate::aggregation::Cell;
use crate::coordinates::ArcId;
use crate::errors::Result;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Header of the time column
pub const DATE_COLUMN: &str = "Date";

/// Outer-joined per-unit series
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable<K: Ord> {
    columns: Vec<ArcId>,
    rows: BTreeMap<K, HashMap<ArcId, Cell>>,
}

impl<K: Ord> Default for WideTable<K> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> WideTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table that still writes a header for `columns`.
    pub fn with_columns(columns: Vec<ArcId>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Single-column table; later entries for a key replace earlier ones.
    pub fn from_series<I>(arc: ArcId, series: I) -> Self
    where
        I: IntoIterator<Item = (K, Cell)>,
    {
        let mut table = Self::with_columns(vec![arc]);
        for (key, cell) in series {
            table.insert(key, arc, cell);
        }
        table
    }

    /// Sets one cell, adding the row and the column as needed.
    pub fn insert(&mut self, key: K, arc: ArcId, cell: Cell) {
        if !self.columns.contains(&arc) {
            self.columns.push(arc);
        }
        self.rows.entry(key).or_default().insert(arc, cell);
    }

    /// Adds an empty row for `key` if absent.
    pub fn ensure_row(&mut self, key: K) {
        self.rows.entry(key).or_default();
    }

    /// Outer join on the time key: union of rows and of columns.
    pub fn merge_outer(mut self, other: Self) -> Self {
        for arc in other.columns {
            if !self.columns.contains(&arc) {
                self.columns.push(arc);
            }
        }
        for (key, cells) in other.rows {
            self.rows.entry(key).or_default().extend(cells);
        }
        self
    }

    pub fn columns(&self) -> &[ArcId] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(key, arc)`, [`Cell::Missing`] when never set.
    pub fn get(&self, key: &K, arc: ArcId) -> Cell {
        self.rows
            .get(key)
            .and_then(|cells| cells.get(&arc))
            .copied()
            .unwrap_or(Cell::Missing)
    }

    /// Writes the table as semicolon-delimited CSV.
    pub fn write_csv<W, F>(&self, writer: W, label: F) -> Result<()>
    where
        W: Write,
        F: Fn(&K) -> String,
    {
        let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(DATE_COLUMN.to_string());
        header.extend(self.columns.iter().map(ArcId::to_string));
        csv_writer.write_record(&header)?;

        for (key, cells) in &self.rows {
            let mut record = Vec::with_capacity(header.len());
            record.push(label(key));
            record.extend(self.columns.iter().map(|arc| {
                cells.get(arc).copied().unwrap_or(Cell::Missing).to_string()
            }));
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes the table to `path`, creating parent directories.
    pub fn write_csv_file<F>(&self, path: &Path, label: F) -> Result<()>
    where
        F: Fn(&K) -> String,
    {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file), label)
    }
}
