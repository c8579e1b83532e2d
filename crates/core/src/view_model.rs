//! Render description derived from engine state
//!
//! The rendering adapter draws whatever [`derive_view_model`] returns and
//! never reads the session directly. Points in the view model are device
//! pixels for the current zoom and pixel ratio; nothing here mutates state.

use crate::engine::MeasurementEngine;
use crate::geometry::{centroid, midpoint, polygon_area_px, Point};
use crate::measurement::{measurement_label, MeasurementKind};
use crate::tool::Tool;
use crate::units::{
    format_area, format_length, pixels_to_world_area, pixels_to_world_length, scale_label, Unit,
};

/// Everything a frame needs
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ViewModel {
    pub tool: Tool,
    /// Capitalized tool name for the status panel
    pub tool_title: &'static str,
    pub unit: Unit,
    pub calibrated: bool,
    /// "1 px = 0.1000 ft" or "not set"
    pub scale_label: String,
    /// Zoom as a rounded percentage, e.g. "120%"
    pub zoom_label: String,
    /// "n / total"
    pub page_label: String,
    pub last_length: String,
    pub last_area: String,
    pub show_labels: bool,
    /// Committed measurements on the current page
    pub overlay: Vec<OverlayItem>,
    /// Every committed measurement in commit order
    pub list: Vec<ListEntry>,
    pub draft: Option<DraftPreview>,
}

/// A committed measurement drawn over the current page
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OverlayItem {
    /// "L1", "A2", ...
    pub id: String,
    pub kind: MeasurementKind,
    /// Vertices in device pixels; areas are closed implicitly
    pub points: Vec<Point>,
    /// Midpoint for lines, centroid for areas
    pub anchor: Point,
    /// Floating label, `None` when labels are hidden
    pub label: Option<String>,
}

/// A row of the measurement list
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListEntry {
    pub id: String,
    pub kind: MeasurementKind,
    /// 1-based page number
    pub page: u16,
    pub text: String,
}

/// Dashed preview of the draft
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DraftPreview {
    pub kind: MeasurementKind,
    /// Draft vertices followed by the cursor, in device pixels
    pub path: Vec<Point>,
    pub anchor: Option<Point>,
    /// Live length (lines) or area (areas) while calibrated
    pub label: Option<String>,
}

/// Build the view model for the current engine state
pub fn derive_view_model(engine: &MeasurementEngine) -> ViewModel {
    let unit = engine.display_unit();
    let calibration = engine.calibration();
    let viewport = engine.viewport();
    let show_labels = engine.show_labels();
    let measurements = engine.measurements();

    let overlay = engine
        .session()
        .for_page(engine.current_page())
        .map(|(index, m)| OverlayItem {
            id: measurement_label(m.kind(), index),
            kind: m.kind(),
            points: m.vertices().into_iter().map(|p| viewport.to_device(p)).collect(),
            anchor: viewport.to_device(m.label_position()),
            label: show_labels.then(|| overlay_text(engine, index)),
        })
        .collect();

    let list = measurements
        .iter()
        .enumerate()
        .map(|(index, m)| ListEntry {
            id: measurement_label(m.kind(), index),
            kind: m.kind(),
            page: m.page_number(),
            text: list_text(engine, index),
        })
        .collect();

    let draft = engine.draft().map(|draft| {
        let mut page_path = draft.points().to_vec();
        page_path.extend(draft.cursor());

        let (anchor, label) = match draft.kind() {
            MeasurementKind::Line => {
                let a = page_path.first().copied().unwrap_or_default();
                let b = page_path.last().copied().unwrap_or(a);
                let length = pixels_to_world_length(a.distance_to(&b), calibration, unit);
                (
                    Some(midpoint(&a, &b)),
                    length.map(|len| format_length(Some(len), unit)),
                )
            }
            // Live area needs at least two vertices plus the cursor
            MeasurementKind::Area if draft.len() >= 2 && draft.cursor().is_some() => {
                let area = pixels_to_world_area(polygon_area_px(&page_path), calibration, unit);
                (
                    Some(centroid(&page_path)),
                    area.map(|a| format_area(Some(a), unit)),
                )
            }
            MeasurementKind::Area => (None, None),
        };

        DraftPreview {
            kind: draft.kind(),
            path: page_path.iter().map(|p| viewport.to_device(*p)).collect(),
            anchor: anchor.map(|p| viewport.to_device(p)),
            label: label.filter(|_| show_labels),
        }
    });

    ViewModel {
        tool: engine.tool(),
        tool_title: engine.tool().title(),
        unit,
        calibrated: calibration.is_calibrated(),
        scale_label: scale_label(calibration, unit),
        zoom_label: format!("{}%", (engine.zoom() * 100.0).round() as i64),
        page_label: format!("{} / {}", engine.page_number(), engine.page_count().max(1)),
        last_length: format_length(engine.last_length(), unit),
        last_area: format_area(engine.last_area(), unit),
        show_labels,
        overlay,
        list,
        draft,
    }
}

/// Label drawn next to a committed measurement
fn overlay_text(engine: &MeasurementEngine, index: usize) -> String {
    let m = &engine.measurements()[index];
    let unit = engine.display_unit();
    let length = format_length(engine.measurement_length(m), unit);
    match m.kind() {
        MeasurementKind::Line => length,
        MeasurementKind::Area => {
            format!("{}  (P: {})", format_area(engine.measurement_area(m), unit), length)
        }
    }
}

/// Value column of the measurement list
fn list_text(engine: &MeasurementEngine, index: usize) -> String {
    let m = &engine.measurements()[index];
    let unit = engine.display_unit();
    let length = format_length(engine.measurement_length(m), unit);
    match m.kind() {
        MeasurementKind::Line => length,
        MeasurementKind::Area => {
            format!("{} · P {}", format_area(engine.measurement_area(m), unit), length)
        }
    }
}
