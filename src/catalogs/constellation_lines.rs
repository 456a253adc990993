//! Constellation stick-figure lines.
//!
//! The table is plain CSV with one segment per row and no header:
//!
//! ```text
//! from_ra_deg,from_dec_deg,to_ra_deg,to_dec_deg
//! ```
//!
//! Stick figures for all 88 IAU constellations ship with the crate in
//! `data/constellation_lines.csv` and are available via [`LineCatalog::builtin`].
//! Rows are grouped by constellation; the first group is Orion.

use std::path::Path;

use tracing::info;

use crate::error::{OverlayError, Result};

const BUILTIN_LINES: &str = include_str!("../../data/constellation_lines.csv");
const BUILTIN_ORIGIN: &str = "<builtin constellation_lines.csv>";

/// One constellation line, endpoints in degrees (ICRS).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from_ra_deg: f64,
    pub from_dec_deg: f64,
    pub to_ra_deg: f64,
    pub to_dec_deg: f64,
}

/// Ordered, read-only list of constellation lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineCatalog {
    segments: Vec<LineSegment>,
}

impl LineCatalog {
    pub fn new(segments: Vec<LineSegment>) -> Self {
        Self { segments }
    }

    /// Load a catalog from a CSV file.
    ///
    /// Fails with [`OverlayError::DataUnavailable`] if the file cannot be read or a
    /// row does not hold exactly four finite numbers.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::data_unavailable(path, e))?;
        let catalog = parse_lines(&data, path)?;
        info!(
            "Loaded {} constellation lines from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse an in-memory CSV table.
    pub fn parse(data: &str) -> Result<Self> {
        parse_lines(data, Path::new("<memory>"))
    }

    /// The full-sky line table compiled into the crate.
    pub fn builtin() -> Self {
        // The embedded table is fixed at compile time and covered by tests.
        parse_lines(BUILTIN_LINES, Path::new(BUILTIN_ORIGIN)).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[LineSegment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineSegment> {
        self.segments.iter()
    }
}

impl<'a> IntoIterator for &'a LineCatalog {
    type Item = &'a LineSegment;
    type IntoIter = std::slice::Iter<'a, LineSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

fn parse_lines(data: &str, origin: &Path) -> Result<LineCatalog> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut segments = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| OverlayError::data_unavailable(origin, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.len() != 4 {
            return Err(OverlayError::data_unavailable(
                origin,
                format!("line {}: expected 4 columns, found {}", line, record.len()),
            ));
        }

        let mut values = [0.0_f64; 4];
        for (value, field) in values.iter_mut().zip(record.iter()) {
            *value = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    OverlayError::data_unavailable(
                        origin,
                        format!("line {}: '{}' is not a finite number", line, field),
                    )
                })?;
        }

        segments.push(LineSegment {
            from_ra_deg: values[0],
            from_dec_deg: values[1],
            to_ra_deg: values[2],
            to_dec_deg: values[3],
        });
    }

    Ok(LineCatalog { segments })
}
