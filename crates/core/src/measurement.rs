//! Committed measurements and the measurement session
//!
//! Geometry is stored in page pixel space and frozen on commit. Pixel lengths
//! and areas are derived once at that moment; real-world values are computed
//! on demand from the page calibration so display units can change freely.

use crate::calibration::CalibrationState;
use crate::error::{ValidationError, ValidationResult};
use crate::geometry::{centroid, midpoint, polygon_area_px, polygon_perimeter_px, Point};
use crate::units::{pixels_to_world_area, pixels_to_world_length, Unit};
use std::sync::Arc;

/// Type of measurement being digitized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Straight distance between two points
    Line,
    /// Closed polygon area
    Area,
}

impl MeasurementKind {
    /// Prefix used for list labels ("L1", "A2")
    pub fn prefix(self) -> char {
        match self {
            MeasurementKind::Line => 'L',
            MeasurementKind::Area => 'A',
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            MeasurementKind::Line => "Line",
            MeasurementKind::Area => "Area",
        }
    }
}

/// Pixel geometry of a committed measurement
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MeasurementGeometry {
    Line { a: Point, b: Point },
    Area { points: Vec<Point> },
}

/// A committed measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Page this measurement is on (0-based)
    page_index: u16,
    /// Geometry in page pixels
    geometry: Arc<MeasurementGeometry>,
    /// Segment length for lines, perimeter for areas
    length_px: f64,
    /// Enclosed area, zero for lines
    area_px2: f64,
}

impl Measurement {
    /// Create a line measurement
    pub fn line(page_index: u16, a: Point, b: Point) -> Self {
        Self {
            page_index,
            length_px: a.distance_to(&b),
            area_px2: 0.0,
            geometry: Arc::new(MeasurementGeometry::Line { a, b }),
        }
    }

    /// Create an area measurement from at least three vertices
    pub fn area(page_index: u16, points: Vec<Point>) -> ValidationResult<Self> {
        if points.len() < 3 {
            return Err(ValidationError::InsufficientVertices {
                count: points.len(),
            });
        }

        Ok(Self {
            page_index,
            length_px: polygon_perimeter_px(&points),
            area_px2: polygon_area_px(&points),
            geometry: Arc::new(MeasurementGeometry::Area { points }),
        })
    }

    /// Rebuild a measurement from stored geometry, re-deriving pixel values
    pub fn from_geometry(
        page_index: u16,
        geometry: MeasurementGeometry,
    ) -> ValidationResult<Self> {
        match geometry {
            MeasurementGeometry::Line { a, b } => Ok(Self::line(page_index, a, b)),
            MeasurementGeometry::Area { points } => Self::area(page_index, points),
        }
    }

    /// Get the page index
    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// 1-based page number, as shown to the user
    pub fn page_number(&self) -> u16 {
        self.page_index.saturating_add(1)
    }

    /// Get the geometry
    pub fn geometry(&self) -> &MeasurementGeometry {
        &self.geometry
    }

    /// Get the measurement kind
    pub fn kind(&self) -> MeasurementKind {
        match self.geometry.as_ref() {
            MeasurementGeometry::Line { .. } => MeasurementKind::Line,
            MeasurementGeometry::Area { .. } => MeasurementKind::Area,
        }
    }

    /// Line length in pixels, or perimeter for areas
    pub fn length_px(&self) -> f64 {
        self.length_px
    }

    /// Area in square pixels (zero for lines)
    pub fn area_px2(&self) -> f64 {
        self.area_px2
    }

    /// All vertices, in drawing order
    pub fn vertices(&self) -> Vec<Point> {
        match self.geometry.as_ref() {
            MeasurementGeometry::Line { a, b } => vec![*a, *b],
            MeasurementGeometry::Area { points } => points.clone(),
        }
    }

    /// Where the measurement label should be anchored
    pub fn label_position(&self) -> Point {
        match self.geometry.as_ref() {
            MeasurementGeometry::Line { a, b } => midpoint(a, b),
            MeasurementGeometry::Area { points } => centroid(points),
        }
    }

    /// Length (or perimeter) in `unit`, `None` while uncalibrated
    pub fn world_length(&self, calibration: &CalibrationState, unit: Unit) -> Option<f64> {
        pixels_to_world_length(self.length_px, calibration, unit)
    }

    /// Area in square `unit`; `None` for lines or while uncalibrated
    pub fn world_area(&self, calibration: &CalibrationState, unit: Unit) -> Option<f64> {
        match self.kind() {
            MeasurementKind::Line => None,
            MeasurementKind::Area => pixels_to_world_area(self.area_px2, calibration, unit),
        }
    }
}

/// List label for the measurement at `index` in commit order
pub fn measurement_label(kind: MeasurementKind, index: usize) -> String {
    format!("{}{}", kind.prefix(), index + 1)
}

/// The measurement currently being digitized
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    kind: MeasurementKind,
    points: Vec<Point>,
    /// Live pointer position for previews, never committed
    cursor: Option<Point>,
}

impl Draft {
    /// Start a draft at its first vertex
    pub fn new(kind: MeasurementKind, first: Point) -> Self {
        Self {
            kind,
            points: vec![first],
            cursor: None,
        }
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Remove the last vertex and forget the cursor
    pub fn pop(&mut self) -> Option<Point> {
        self.cursor = None;
        self.points.pop()
    }

    pub fn set_cursor(&mut self, cursor: Point) {
        self.cursor = Some(cursor);
    }

    /// Consume the draft, keeping only its committed vertices
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Ordered committed measurements plus at most one draft
#[derive(Debug, Clone, Default)]
pub struct MeasurementSession {
    measurements: Vec<Measurement>,
    draft: Option<Draft>,
}

impl MeasurementSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed measurements in commit order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    /// Begin a new draft, replacing any existing one
    pub fn start_draft(&mut self, kind: MeasurementKind, first: Point) {
        self.draft = Some(Draft::new(kind, first));
    }

    /// Remove and return the draft
    pub fn take_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Append a measurement and return its index
    pub fn commit(&mut self, measurement: Measurement) -> usize {
        self.measurements.push(measurement);
        self.measurements.len() - 1
    }

    /// Discard the draft and every committed measurement
    pub fn clear(&mut self) {
        self.measurements.clear();
        self.draft = None;
    }

    /// Measurements on a page together with their commit index
    pub fn for_page(&self, page_index: u16) -> impl Iterator<Item = (usize, &Measurement)> {
        self.measurements
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.page_index() == page_index)
    }

    /// Vertices of committed measurements on a page, for snapping
    pub fn snap_points(&self, page_index: u16) -> Vec<Point> {
        self.for_page(page_index)
            .flat_map(|(_, m)| m.vertices())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}
