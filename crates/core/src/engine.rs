//! Measurement engine
//!
//! Owns calibration, the measurement session, and the interaction state for a
//! single document. Every operation runs to completion synchronously and is
//! atomic: it either returns an [`Outcome`] with the change applied, or a
//! [`ValidationError`] with state untouched.
//!
//! Input points arrive in device pixels of the currently rendered page. The
//! engine divides them by the render scale (zoom × device pixel ratio) and
//! stores page pixels, so calibration and committed geometry stay valid when
//! the page is re-rendered at another zoom level.

use crate::calibration::{CalibrationState, CalibrationStore};
use crate::config::EngineConfig;
use crate::error::{ValidationError, ValidationResult};
use crate::geometry::Point;
use crate::measurement::{Draft, Measurement, MeasurementKind, MeasurementSession};
use crate::snapping::{SnapConfig, SnapEngine};
use crate::tool::{EngineInput, Outcome, PointerButton, Tool};
use crate::units::{from_base_units, Unit};
use tracing::{debug, info, warn};

/// Zoom level and pixel density of the rendered page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Device pixels per page pixel
    pub fn render_scale(&self) -> f64 {
        self.zoom * self.device_pixel_ratio
    }

    /// Map a device-pixel point into page space
    pub fn to_page(&self, point: Point) -> Point {
        point.scaled(1.0 / self.render_scale())
    }

    /// Map a page-space point into device pixels
    pub fn to_device(&self, point: Point) -> Point {
        point.scaled(self.render_scale())
    }
}

/// The raster surface the rendering adapter produced for a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSurface {
    pub page_index: u16,
    pub width_px: u32,
    pub height_px: u32,
}

impl PageSurface {
    /// Check whether a device-pixel point lies on the raster
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=f64::from(self.width_px)).contains(&point.x)
            && (0.0..=f64::from(self.height_px)).contains(&point.y)
    }
}

/// Progress of the two-click calibration gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    Idle,
    FirstPoint(Point),
    /// Segment drawn, waiting for the user to enter its length
    AwaitingLength(Point, Point),
}

/// Measurement engine for one document
#[derive(Debug)]
pub struct MeasurementEngine {
    config: EngineConfig,
    viewport: Viewport,
    page_count: u16,
    /// Current page (0-based)
    current_page: u16,
    surface: Option<PageSurface>,
    calibrations: CalibrationStore,
    session: MeasurementSession,
    calibration_step: CalibrationStep,
    tool: Tool,
    /// Temporary pan (space held) without changing the selected tool
    pan_override: bool,
    display_unit: Unit,
    show_labels: bool,
    snap: SnapEngine,
    /// Last committed line length in feet
    last_length_ft: Option<f64>,
    /// Last committed area in square feet
    last_area_ft2: Option<f64>,
}

impl Default for MeasurementEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl MeasurementEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        let snap = SnapEngine::with_config(SnapConfig {
            enabled: config.snap_enabled,
            radius_px: config.snap_radius_px,
        });

        Self {
            viewport: Viewport {
                zoom: 1.0,
                device_pixel_ratio: config.device_pixel_ratio.max(1.0),
            },
            page_count: 0,
            current_page: 0,
            surface: None,
            calibrations: CalibrationStore::new(),
            session: MeasurementSession::new(),
            calibration_step: CalibrationStep::Idle,
            tool: Tool::default(),
            pan_override: false,
            display_unit: config.display_unit,
            show_labels: config.show_labels,
            snap,
            last_length_ft: None,
            last_area_ft2: None,
            config,
        }
    }

    // ---- accessors ----

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.viewport.device_pixel_ratio
    }

    /// Selected tool
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Tool that pointer presses are routed to right now
    pub fn effective_tool(&self) -> Tool {
        if self.pan_override {
            Tool::Pan
        } else {
            self.tool
        }
    }

    pub fn display_unit(&self) -> Unit {
        self.display_unit
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap.is_enabled()
    }

    pub fn page_count(&self) -> u16 {
        self.page_count
    }

    /// Current page (0-based)
    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    /// Current page (1-based), as shown to the user
    pub fn page_number(&self) -> u16 {
        self.current_page.saturating_add(1)
    }

    pub fn surface(&self) -> Option<PageSurface> {
        self.surface
    }

    /// Calibration of the current page
    pub fn calibration(&self) -> &CalibrationState {
        self.calibrations.get(self.current_page)
    }

    /// Calibration of any page
    pub fn calibration_for(&self, page_index: u16) -> &CalibrationState {
        self.calibrations.get(page_index)
    }

    pub fn calibrations(&self) -> &CalibrationStore {
        &self.calibrations
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration().is_calibrated()
    }

    pub fn calibration_step(&self) -> CalibrationStep {
        self.calibration_step
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn measurements(&self) -> &[Measurement] {
        self.session.measurements()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.draft()
    }

    /// Last committed line length in the display unit
    pub fn last_length(&self) -> Option<f64> {
        self.last_length_ft
            .map(|ft| from_base_units(ft, self.display_unit))
    }

    /// Last committed area in the display unit squared
    pub fn last_area(&self) -> Option<f64> {
        let factor = self.display_unit.from_base_factor();
        self.last_area_ft2.map(|ft2| ft2 * factor * factor)
    }

    /// Length (perimeter for areas) of a measurement in the display unit
    pub fn measurement_length(&self, measurement: &Measurement) -> Option<f64> {
        measurement.world_length(
            self.calibrations.get(measurement.page_index()),
            self.display_unit,
        )
    }

    /// Area of a measurement in the display unit squared
    pub fn measurement_area(&self, measurement: &Measurement) -> Option<f64> {
        measurement.world_area(
            self.calibrations.get(measurement.page_index()),
            self.display_unit,
        )
    }

    // ---- document & pages ----

    /// Start a new document: all pages uncalibrated, no measurements
    pub fn load_document(&mut self, page_count: u16) -> Outcome {
        self.page_count = page_count;
        self.current_page = 0;
        self.surface = None;
        self.calibrations.clear();
        self.session.clear();
        self.calibration_step = CalibrationStep::Idle;
        self.last_length_ft = None;
        self.last_area_ft2 = None;
        info!(page_count, "document loaded");
        Outcome::PageChanged { page_number: 1 }
    }

    /// Record that a page finished rendering and is ready for input
    pub fn attach_surface(&mut self, page_index: u16, width_px: u32, height_px: u32) -> Outcome {
        // Every page must have a representable 1-based number
        let Some(pages_needed) = page_index.checked_add(1) else {
            warn!(page_index, "surface rejected: page index out of range");
            return Outcome::Ignored;
        };
        self.page_count = self.page_count.max(pages_needed);
        if page_index != self.current_page {
            self.leave_page();
            self.current_page = page_index;
        }
        self.surface = Some(PageSurface {
            page_index,
            width_px,
            height_px,
        });
        debug!(page_index, width_px, height_px, "surface attached");
        Outcome::SettingChanged
    }

    /// Go to a 1-based page number, clamped to the document
    pub fn go_to_page(&mut self, page_number: u16) -> Outcome {
        if self.page_count == 0 {
            return Outcome::Ignored;
        }

        let target = page_number.clamp(1, self.page_count) - 1;
        if target == self.current_page {
            return Outcome::Ignored;
        }

        self.leave_page();
        self.current_page = target;
        // The new page has to be rendered before it accepts input
        self.surface = None;
        debug!(page_number = target + 1, "page changed");
        Outcome::PageChanged {
            page_number: target + 1,
        }
    }

    pub fn next_page(&mut self) -> Outcome {
        self.go_to_page(self.page_number().saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Outcome {
        self.go_to_page(self.page_number().saturating_sub(1).max(1))
    }

    fn leave_page(&mut self) {
        if self.session.take_draft().is_some() {
            debug!("draft discarded on page change");
        }
        self.calibration_step = CalibrationStep::Idle;
    }

    // ---- tools & settings ----

    /// Select a tool
    ///
    /// A draft survives a switch to pan or to the tool of its own kind. Any
    /// other switch discards it. Leaving the calibrate tool for a measuring
    /// tool abandons a half-drawn reference segment.
    pub fn set_tool(&mut self, tool: Tool) -> Outcome {
        let keep_draft = match (tool, self.session.draft().map(Draft::kind)) {
            (_, None) => true,
            (Tool::Pan, Some(_)) => true,
            (Tool::Line, Some(kind)) => kind == MeasurementKind::Line,
            (Tool::Area, Some(kind)) => kind == MeasurementKind::Area,
            (Tool::Calibrate, Some(_)) => false,
        };
        if !keep_draft {
            self.session.take_draft();
            debug!(%tool, "draft discarded on tool change");
        }

        if matches!(tool, Tool::Line | Tool::Area) {
            self.calibration_step = CalibrationStep::Idle;
        }

        self.tool = tool;
        Outcome::ToolChanged(tool)
    }

    /// Temporarily route presses to panning (space held)
    pub fn set_pan_override(&mut self, active: bool) -> Outcome {
        self.pan_override = active;
        Outcome::SettingChanged
    }

    /// Change the display unit; calibration is untouched
    pub fn set_display_unit(&mut self, unit: Unit) -> Outcome {
        self.display_unit = unit;
        Outcome::SettingChanged
    }

    pub fn toggle_labels(&mut self) -> Outcome {
        self.show_labels = !self.show_labels;
        Outcome::SettingChanged
    }

    pub fn set_snap(&mut self, enabled: bool) -> Outcome {
        self.snap.set_enabled(enabled);
        Outcome::SettingChanged
    }

    // ---- viewport ----

    /// Set the zoom level, clamped to the configured range
    pub fn set_zoom(&mut self, zoom: f64) -> Outcome {
        if !zoom.is_finite() {
            return Outcome::Ignored;
        }

        let zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        if zoom == self.viewport.zoom {
            return Outcome::Ignored;
        }

        self.viewport.zoom = zoom;
        debug!(zoom, "zoom changed");
        Outcome::ZoomChanged { zoom }
    }

    pub fn zoom_in(&mut self) -> Outcome {
        self.set_zoom(self.viewport.zoom * self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Outcome {
        self.set_zoom(self.viewport.zoom / self.config.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> Outcome {
        self.set_zoom(1.0)
    }

    /// Zoom by one wheel notch; negative deltas zoom in
    pub fn zoom_by_wheel(&mut self, delta_y: f64) -> Outcome {
        let factor = if delta_y < 0.0 {
            self.config.wheel_zoom_step
        } else {
            1.0 / self.config.wheel_zoom_step
        };
        self.set_zoom(self.viewport.zoom * factor)
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) -> Outcome {
        let ratio = if ratio.is_finite() { ratio.max(1.0) } else { 1.0 };
        self.viewport.device_pixel_ratio = ratio;
        Outcome::SettingChanged
    }

    // ---- pointer input ----

    /// Handle a pointer press at a device-pixel position
    pub fn pointer_down(
        &mut self,
        position: Point,
        button: PointerButton,
    ) -> ValidationResult<Outcome> {
        if !self.accepts_input_at(position) {
            return Ok(Outcome::Ignored);
        }
        if button == PointerButton::Middle {
            return Ok(Outcome::Panning);
        }

        let point = self.snap_point(self.viewport.to_page(position));

        match self.effective_tool() {
            Tool::Pan => Ok(Outcome::Panning),
            Tool::Calibrate => self.handle_calibrate_click(point),
            Tool::Line => self.handle_line_click(point),
            Tool::Area => self.handle_area_click(point),
        }
    }

    /// Move the live preview cursor of the draft
    pub fn pointer_move(&mut self, position: Point) -> Outcome {
        if !self.accepts_input_at(position) || self.session.draft().is_none() {
            return Outcome::Ignored;
        }

        let point = self.snap_point(self.viewport.to_page(position));
        match self.session.draft_mut() {
            Some(draft) => {
                draft.set_cursor(point);
                Outcome::CursorMoved
            }
            None => Outcome::Ignored,
        }
    }

    /// Pointer input needs an attached surface and a position on it
    fn accepts_input_at(&self, position: Point) -> bool {
        self.surface.is_some_and(|surface| surface.contains(position))
    }

    fn handle_calibrate_click(&mut self, point: Point) -> ValidationResult<Outcome> {
        match self.calibration_step {
            CalibrationStep::FirstPoint(first) => {
                let pixel_distance = first.distance_to(&point) * self.viewport.render_scale();
                if !(pixel_distance.is_finite() && pixel_distance > 0.0) {
                    warn!("calibration segment rejected: points coincide");
                    return Err(ValidationError::DegenerateReference);
                }

                self.calibration_step = CalibrationStep::AwaitingLength(first, point);
                debug!(pixel_distance, "calibration segment drawn");
                Ok(Outcome::CalibrationRequested { pixel_distance })
            }
            CalibrationStep::Idle | CalibrationStep::AwaitingLength(..) => {
                self.calibration_step = CalibrationStep::FirstPoint(point);
                Ok(Outcome::CalibrationPointPlaced)
            }
        }
    }

    fn handle_line_click(&mut self, point: Point) -> ValidationResult<Outcome> {
        self.require_calibration()?;

        let start = match self.session.draft() {
            None => {
                self.session.start_draft(MeasurementKind::Line, point);
                debug!("line draft started");
                return Ok(Outcome::DraftStarted);
            }
            Some(draft) if draft.kind() == MeasurementKind::Line => draft.points().first().copied(),
            Some(_) => None,
        };

        let Some(start) = start else {
            return Ok(Outcome::Ignored);
        };

        self.session.take_draft();
        let measurement = Measurement::line(self.current_page, start, point);
        self.last_length_ft = self
            .calibration()
            .pixels_per_unit()
            .map(|ppu| measurement.length_px() / ppu);
        Ok(self.commit(measurement))
    }

    fn handle_area_click(&mut self, point: Point) -> ValidationResult<Outcome> {
        self.require_calibration()?;

        match self.session.draft_mut() {
            None => {
                self.session.start_draft(MeasurementKind::Area, point);
                debug!("area draft started");
                Ok(Outcome::DraftStarted)
            }
            Some(draft) if draft.kind() == MeasurementKind::Area => {
                draft.push(point);
                Ok(Outcome::PointAdded { count: draft.len() })
            }
            Some(_) => Ok(Outcome::Ignored),
        }
    }

    fn require_calibration(&self) -> ValidationResult<()> {
        if self.is_calibrated() {
            Ok(())
        } else {
            warn!(page = self.page_number(), "measurement rejected: page not calibrated");
            Err(ValidationError::Uncalibrated)
        }
    }

    fn snap_point(&self, point: Point) -> Point {
        if !self.snap.is_enabled() {
            return point;
        }

        let mut candidates = self.session.snap_points(self.current_page);
        if let Some(draft) = self.session.draft() {
            candidates.extend_from_slice(draft.points());
        }

        // The radius is defined in CSS pixels; convert it into page space
        let radius = self.snap.config().radius_px * self.viewport.device_pixel_ratio
            / self.viewport.render_scale();
        self.snap.snap(point, &candidates, radius)
    }

    fn commit(&mut self, measurement: Measurement) -> Outcome {
        let kind = measurement.kind();
        let length_px = measurement.length_px();
        let area_px2 = measurement.area_px2();
        let index = self.session.commit(measurement);
        info!(
            index,
            kind = kind.name(),
            page = self.page_number(),
            length_px,
            area_px2,
            "measurement committed"
        );
        Outcome::Committed { index }
    }

    // ---- calibration ----

    /// Apply a known length to the pending reference segment
    pub fn apply_calibration(&mut self, length: f64, unit: Unit) -> ValidationResult<Outcome> {
        let CalibrationStep::AwaitingLength(p1, p2) = self.calibration_step else {
            warn!("calibration rejected: no reference segment");
            return Err(ValidationError::NoPendingCalibration);
        };

        let pixels_per_unit = self
            .calibrations
            .entry(self.current_page)
            .calibrate(p1, p2, length, unit)
            .inspect_err(|error| warn!(%error, "calibration rejected"))?;

        self.calibration_step = CalibrationStep::Idle;
        info!(page = self.page_number(), pixels_per_unit, "calibration set");
        Ok(Outcome::Calibrated { pixels_per_unit })
    }

    /// Abandon the reference segment being drawn
    pub fn cancel_calibration(&mut self) -> Outcome {
        if self.calibration_step == CalibrationStep::Idle {
            return Outcome::Ignored;
        }
        self.calibration_step = CalibrationStep::Idle;
        Outcome::CalibrationCancelled
    }

    /// Calibrate the current page from two device-pixel points
    pub fn calibrate(
        &mut self,
        a: Point,
        b: Point,
        length: f64,
        unit: Unit,
    ) -> ValidationResult<Outcome> {
        let p1 = self.viewport.to_page(a);
        let p2 = self.viewport.to_page(b);
        let pixels_per_unit = self
            .calibrations
            .entry(self.current_page)
            .calibrate(p1, p2, length, unit)
            .inspect_err(|error| warn!(%error, "calibration rejected"))?;

        info!(page = self.page_number(), pixels_per_unit, "calibration set");
        Ok(Outcome::Calibrated { pixels_per_unit })
    }

    /// Restore a stored calibration for a page
    pub fn set_calibration(&mut self, page_index: u16, state: CalibrationState) {
        self.calibrations.set(page_index, state);
    }

    // ---- draft control ----

    /// Finish the area draft (double-click, Enter, or finish button)
    pub fn finish(&mut self) -> ValidationResult<Outcome> {
        let count = match self.session.draft() {
            Some(draft) if draft.kind() == MeasurementKind::Area => draft.len(),
            _ => return Ok(Outcome::Ignored),
        };

        if count < 3 {
            warn!(count, "finish rejected: area needs at least 3 points");
            return Err(ValidationError::InsufficientVertices { count });
        }

        let Some(draft) = self.session.take_draft() else {
            return Ok(Outcome::Ignored);
        };
        let measurement = Measurement::area(self.current_page, draft.into_points())?;
        self.last_area_ft2 = self
            .calibration()
            .pixels_per_unit()
            .map(|ppu| measurement.area_px2() / (ppu * ppu));
        Ok(self.commit(measurement))
    }

    /// Remove the last draft vertex; an emptied draft is discarded
    pub fn undo(&mut self) -> Outcome {
        let Some(draft) = self.session.draft_mut() else {
            return Outcome::Ignored;
        };

        draft.pop();
        let remaining = draft.len();
        if remaining == 0 {
            self.session.take_draft();
            debug!("draft emptied by undo");
            Outcome::DraftDiscarded
        } else {
            Outcome::PointRemoved { remaining }
        }
    }

    /// Discard the draft and every measurement
    pub fn clear_all(&mut self) -> Outcome {
        let removed = self.session.len();
        self.session.clear();
        self.last_length_ft = None;
        self.last_area_ft2 = None;
        info!(removed, "measurements cleared");
        Outcome::Cleared
    }

    /// Append an already-built measurement (e.g. from an import)
    pub fn restore(&mut self, measurement: Measurement) -> usize {
        self.session.commit(measurement)
    }

    // ---- dispatch ----

    /// Apply one serialized input event
    pub fn apply(&mut self, input: EngineInput) -> ValidationResult<Outcome> {
        match input {
            EngineInput::LoadDocument { page_count } => Ok(self.load_document(page_count)),
            EngineInput::AttachSurface {
                page_index,
                width_px,
                height_px,
            } => Ok(self.attach_surface(page_index, width_px, height_px)),
            EngineInput::SelectTool { tool } => Ok(self.set_tool(tool)),
            EngineInput::PointerDown { x, y, button } => {
                self.pointer_down(Point::new(x, y), button)
            }
            EngineInput::PointerMove { x, y } => Ok(self.pointer_move(Point::new(x, y))),
            EngineInput::ApplyCalibration { length, unit } => self.apply_calibration(length, unit),
            EngineInput::CancelCalibration => Ok(self.cancel_calibration()),
            EngineInput::Calibrate { a, b, length, unit } => self.calibrate(a, b, length, unit),
            EngineInput::Finish => self.finish(),
            EngineInput::Undo => Ok(self.undo()),
            EngineInput::ClearAll => Ok(self.clear_all()),
            EngineInput::SetZoom { zoom } => Ok(self.set_zoom(zoom)),
            EngineInput::ZoomIn => Ok(self.zoom_in()),
            EngineInput::ZoomOut => Ok(self.zoom_out()),
            EngineInput::ResetZoom => Ok(self.reset_zoom()),
            EngineInput::Wheel { delta_y } => Ok(self.zoom_by_wheel(delta_y)),
            EngineInput::SetDevicePixelRatio { ratio } => Ok(self.set_device_pixel_ratio(ratio)),
            EngineInput::SetPanOverride { active } => Ok(self.set_pan_override(active)),
            EngineInput::NextPage => Ok(self.next_page()),
            EngineInput::PrevPage => Ok(self.prev_page()),
            EngineInput::GoToPage { page_number } => Ok(self.go_to_page(page_number)),
            EngineInput::SetUnit { unit } => Ok(self.set_display_unit(unit)),
            EngineInput::ToggleLabels => Ok(self.toggle_labels()),
            EngineInput::SetSnap { enabled } => Ok(self.set_snap(enabled)),
        }
    }
}
