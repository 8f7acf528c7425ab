//! Catalog table loading
//!
//! Reads the input table of candidate targets (identifier, coordinates,
//! transit depth and period) from CSV, filters it by depth, and removes
//! duplicate identifiers so IDs can serve as unique keys downstream.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::types::{SkyCoord, TargetId};

/// One row of the input catalog table
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// External catalog identifier
    #[serde(rename = "tic_id")]
    pub id: TargetId,

    /// Right ascension in degrees
    #[serde(rename = "ra")]
    pub ra_deg: f64,

    /// Declination in degrees
    #[serde(rename = "dec")]
    pub dec_deg: f64,

    /// Transit depth in parts per million
    pub depth: f64,

    /// Orbital period in days
    pub period: f64,
}

impl CatalogRow {
    /// Sky coordinate of this row
    pub fn coord(&self) -> SkyCoord {
        SkyCoord::new(self.ra_deg, self.dec_deg)
    }
}

/// Load catalog rows from any CSV reader
///
/// The table must carry a header row naming at least `tic_id`, `ra`, `dec`,
/// `depth`, and `period`; extra columns are ignored. A malformed row fails
/// the whole load.
pub fn load_catalog<R: Read>(reader: R) -> Result<Vec<CatalogRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let row: CatalogRow = record?;
        rows.push(row);
    }
    tracing::debug!(rows = rows.len(), "Loaded catalog table");
    Ok(rows)
}

/// Load catalog rows from a CSV file on disk
pub fn load_catalog_file(path: &Path) -> Result<Vec<CatalogRow>> {
    let file = std::fs::File::open(path)?;
    load_catalog(file)
}

/// Keep only rows whose transit depth meets the threshold
pub fn filter_by_depth(rows: Vec<CatalogRow>, min_depth: f64) -> Vec<CatalogRow> {
    rows.into_iter().filter(|r| r.depth >= min_depth).collect()
}

/// Drop later rows that repeat an identifier, keeping first occurrences
///
/// After this, identifier values are usable as unique keys.
pub fn dedup_by_id(rows: Vec<CatalogRow>) -> Vec<CatalogRow> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|r| seen.insert(r.id)).collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const SAMPLE: &str = "\
tic_id,ra,dec,depth,period
261136679,63.3739396,-69.226822,5000.0,4.13
38846515,104.733036,-30.226852,18000.0,2.85
261136679,63.3739396,-69.226822,5000.0,4.13
150428135,111.289059,-43.616042,300.0,0.94
";

    #[test]
    fn loads_rows_with_extra_columns_ignored() {
        let csv = "tic_id,ra,dec,depth,period,disposition\n1,10.0,-5.0,100.0,3.2,PC\n";
        let rows = load_catalog(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, TargetId::new(1));
        assert_eq!(rows[0].coord(), SkyCoord::new(10.0, -5.0));
    }

    #[test]
    fn malformed_row_fails_the_load() {
        let csv = "tic_id,ra,dec,depth,period\n1,not-a-number,-5.0,100.0,3.2\n";
        let err = load_catalog(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn missing_column_fails_the_load() {
        let csv = "tic_id,ra,dec,depth\n1,10.0,-5.0,100.0\n";
        assert!(load_catalog(csv.as_bytes()).is_err());
    }

    #[test]
    fn depth_filter_keeps_threshold_and_above() {
        let rows = load_catalog(SAMPLE.as_bytes()).unwrap();
        let filtered = filter_by_depth(rows, 5000.0);
        assert_eq!(filtered.len(), 3, "300ppm row should be dropped");
        assert!(filtered.iter().all(|r| r.depth >= 5000.0));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let rows = load_catalog(SAMPLE.as_bytes()).unwrap();
        let deduped = dedup_by_id(rows);
        assert_eq!(deduped.len(), 3);
        let ids: Vec<u64> = deduped.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![261136679, 38846515, 150428135]);
    }

    #[test]
    fn empty_table_loads_as_empty() {
        let rows = load_catalog("tic_id,ra,dec,depth,period\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }
}
