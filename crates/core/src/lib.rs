//! Take-off Core Library
//!
//! Calibration, measurement and interaction state for measuring lengths and
//! areas on rendered plan pages.

pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod measurement;
pub mod snapping;
pub mod tool;
pub mod units;
pub mod view_model;

pub use calibration::{CalibrationState, CalibrationStore};
pub use config::{ConfigError, EngineConfig};
pub use engine::{CalibrationStep, MeasurementEngine, PageSurface, Viewport};
pub use error::{ValidationError, ValidationResult};
pub use export::{
    export_csv, export_json, export_records, import_json, import_record, CsvExportConfig,
    ExportError, ExportRecord, ExportResult,
};
pub use geometry::{centroid, distance, midpoint, polygon_area_px, polygon_perimeter_px, Point};
pub use measurement::{
    measurement_label, Draft, Measurement, MeasurementGeometry, MeasurementKind,
    MeasurementSession,
};
pub use snapping::{SnapConfig, SnapEngine, SnapTarget};
pub use tool::{EngineInput, Outcome, PointerButton, Tool};
pub use units::{
    convert, format_area, format_length, from_base_units, pixels_to_world_area,
    pixels_to_world_length, scale_label, to_base_units, Unit,
};
pub use view_model::{derive_view_model, DraftPreview, ListEntry, OverlayItem, ViewModel};
