//! JSON and CSV export of committed measurements
//!
//! Records carry the stored pixel geometry plus real-world values derived
//! from the page calibration in the current display unit. Importing a record
//! keeps only the geometry and recomputes everything else.

use crate::engine::MeasurementEngine;
use crate::error::ValidationError;
use crate::geometry::Point;
use crate::measurement::{measurement_label, Measurement, MeasurementGeometry};
use crate::units::Unit;
use std::io::Write;

/// Error types for export and import
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid record {id}: {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: ValidationError,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// One exported measurement
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportRecord {
    Line {
        id: String,
        /// 1-based page number
        #[serde(default = "first_page")]
        page: u16,
        a: Point,
        b: Point,
        length_px: f64,
        /// `null` while the page is uncalibrated
        length_units: Option<f64>,
        units: Unit,
    },
    Area {
        id: String,
        #[serde(default = "first_page")]
        page: u16,
        points: Vec<Point>,
        area_px2: f64,
        #[serde(default)]
        perimeter_px: f64,
        area_units: Option<f64>,
        perimeter_units: Option<f64>,
        units: Unit,
    },
}

fn first_page() -> u16 {
    1
}

impl ExportRecord {
    pub fn id(&self) -> &str {
        match self {
            ExportRecord::Line { id, .. } | ExportRecord::Area { id, .. } => id,
        }
    }

    /// 1-based page number
    pub fn page(&self) -> u16 {
        match self {
            ExportRecord::Line { page, .. } | ExportRecord::Area { page, .. } => *page,
        }
    }
}

/// Build one record per committed measurement, in commit order
pub fn export_records(engine: &MeasurementEngine) -> Vec<ExportRecord> {
    let units = engine.display_unit();

    engine
        .measurements()
        .iter()
        .enumerate()
        .map(|(index, m)| {
            let id = measurement_label(m.kind(), index);
            let page = m.page_number();
            match m.geometry() {
                MeasurementGeometry::Line { a, b } => ExportRecord::Line {
                    id,
                    page,
                    a: *a,
                    b: *b,
                    length_px: m.length_px(),
                    length_units: engine.measurement_length(m),
                    units,
                },
                MeasurementGeometry::Area { points } => ExportRecord::Area {
                    id,
                    page,
                    points: points.clone(),
                    area_px2: m.area_px2(),
                    perimeter_px: m.length_px(),
                    area_units: engine.measurement_area(m),
                    perimeter_units: engine.measurement_length(m),
                    units,
                },
            }
        })
        .collect()
}

/// Pretty-printed JSON array of all records
pub fn export_json(engine: &MeasurementEngine) -> ExportResult<String> {
    let records = export_records(engine);
    tracing::debug!(count = records.len(), "exporting measurements as JSON");
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Rebuild a measurement from a record
///
/// Stored pixel values and derived units are ignored; the geometry is the
/// source of truth.
pub fn import_record(record: &ExportRecord) -> Result<Measurement, ValidationError> {
    let page_index = record.page().saturating_sub(1);
    let geometry = match record {
        ExportRecord::Line { a, b, .. } => MeasurementGeometry::Line { a: *a, b: *b },
        ExportRecord::Area { points, .. } => MeasurementGeometry::Area {
            points: points.clone(),
        },
    };
    Measurement::from_geometry(page_index, geometry)
}

/// Parse a JSON export back into measurements
pub fn import_json(json: &str) -> ExportResult<Vec<Measurement>> {
    let records: Vec<ExportRecord> = serde_json::from_str(json)?;
    records
        .iter()
        .map(|record| {
            import_record(record).map_err(|source| ExportError::InvalidRecord {
                id: record.id().to_string(),
                source,
            })
        })
        .collect()
}

/// Configuration for CSV export
#[derive(Debug, Clone)]
pub struct CsvExportConfig {
    /// Include column headers in the output
    pub include_headers: bool,

    /// CSV delimiter character
    pub delimiter: u8,

    /// Export only measurements on these pages (1-based, None = all pages)
    pub page_filter: Option<Vec<u16>>,
}

impl Default for CsvExportConfig {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
            page_filter: None,
        }
    }
}

/// Export measurements to CSV
///
/// CSV columns:
/// - ID: list label (L1, A2, ...)
/// - Page: 1-based page number
/// - Type: Line or Area
/// - Length (px): segment length, or perimeter for areas
/// - Area (px²): enclosed area, empty for lines
/// - Length: real-world length or perimeter, empty while uncalibrated
/// - Area: real-world area, empty for lines or while uncalibrated
/// - Units: display unit symbol
pub fn export_csv<W: Write>(
    writer: W,
    engine: &MeasurementEngine,
    config: &CsvExportConfig,
) -> ExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(config.include_headers)
        .from_writer(writer);

    if config.include_headers {
        csv_writer.write_record([
            "ID",
            "Page",
            "Type",
            "Length (px)",
            "Area (px²)",
            "Length",
            "Area",
            "Units",
        ])?;
    }

    let units = engine.display_unit();
    let mut written = 0usize;
    for (index, m) in engine.measurements().iter().enumerate() {
        let page = m.page_number();
        if let Some(ref pages) = config.page_filter {
            if !pages.contains(&page) {
                continue;
            }
        }

        let area_px = match m.geometry() {
            MeasurementGeometry::Line { .. } => String::new(),
            MeasurementGeometry::Area { .. } => format!("{:.2}", m.area_px2()),
        };

        csv_writer.write_record(&[
            measurement_label(m.kind(), index),
            page.to_string(),
            m.kind().name().to_string(),
            format!("{:.2}", m.length_px()),
            area_px,
            format_optional(engine.measurement_length(m)),
            format_optional(engine.measurement_area(m)),
            units.symbol().to_string(),
        ])?;
        written += 1;
    }

    csv_writer.flush()?;
    tracing::debug!(rows = written, "exported measurements as CSV");
    Ok(())
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}
