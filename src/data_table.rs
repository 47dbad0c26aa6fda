//! Row-per-frame tracking tables loaded from CSV.
//!
//! A table holds one column per header, every cell parsed as `f64`. Body
//! parts are addressed by name and resolved to their `<name>_x` / `<name>_y`
//! column pair; classifier and region columns are addressed directly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single body-part position at one frame, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

impl TrackPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point, in pixels
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Truncate to integer pixel coordinates
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Pixel coordinates fit in i32
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// One tracking file held in memory, column-major.
#[derive(Debug, Clone)]
pub struct DataTable {
    headers: Vec<String>,
    columns: HashMap<String, Vec<f64>>,
    rows: usize,
}

impl DataTable {
    /// Load a table from a CSV file with one header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any cell fails to
    /// parse as a number.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut columns: HashMap<String, Vec<f64>> = headers
            .iter()
            .map(|h| (h.clone(), Vec::new()))
            .collect();
        let mut rows = 0;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(Error::ShapeMismatch(format!(
                    "row {} of {} has {} fields, expected {}",
                    row_idx,
                    path.display(),
                    record.len(),
                    headers.len()
                )));
            }
            for (header, field) in headers.iter().zip(record.iter()) {
                let value: f64 = field.trim().parse().map_err(|_| {
                    Error::DataError(format!(
                        "cell '{}' in column '{}', row {} of {} is not numeric",
                        field,
                        header,
                        row_idx,
                        path.display()
                    ))
                })?;
                if let Some(column) = columns.get_mut(header) {
                    column.push(value);
                }
            }
            rows += 1;
        }

        Ok(Self {
            headers,
            columns,
            rows,
        })
    }

    /// Number of frames (rows) in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column headers in file order
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Raw values of one named column
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not exist.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::DataError(format!("column '{name}' not found in table")))
    }

    /// Per-frame positions of one body part, from its `_x` / `_y` columns
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate column is missing.
    pub fn body_part_points(&self, body_part: &str) -> Result<Vec<TrackPoint>> {
        let xs = self.column(&format!("{body_part}_x"))?;
        let ys = self.column(&format!("{body_part}_y"))?;
        Ok(xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| TrackPoint::new(x, y))
            .collect())
    }

    /// Raw occupancy rows over an ordered set of region columns. Values are
    /// returned unvalidated; the alternation analyzer enforces the 0/1
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns an error if any region column is missing.
    pub fn occupancy(&self, region_names: &[String]) -> Result<Vec<Vec<f64>>> {
        let columns: Vec<&[f64]> = region_names
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<_>>()?;
        Ok((0..self.rows)
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect())
    }
}
