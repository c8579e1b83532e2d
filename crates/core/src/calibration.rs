//! Two-point scale calibration
//!
//! A page is calibrated by drawing a reference segment and entering its known
//! real-world length. The resulting ratio is stored as page pixels per foot.
//! Page pixels are device pixels at a render scale of 1.0, which keeps the
//! ratio valid across zoom changes.

use crate::error::{ValidationError, ValidationResult};
use crate::geometry::Point;
use crate::units::{to_base_units, Unit};
use std::collections::HashMap;

/// Calibration of a single page
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationState {
    /// Page pixels per foot, `None` until calibrated
    pixels_per_unit: Option<f64>,
    /// Reference segment the ratio was derived from
    reference_segment: Option<(Point, Point)>,
}

impl CalibrationState {
    /// Create an uncalibrated state
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a calibration from a stored ratio
    ///
    /// Non-positive or non-finite ratios leave the page uncalibrated.
    pub fn from_ratio(pixels_per_unit: f64) -> Self {
        Self {
            pixels_per_unit: (pixels_per_unit.is_finite() && pixels_per_unit > 0.0)
                .then_some(pixels_per_unit),
            reference_segment: None,
        }
    }

    /// Page pixels per foot
    pub fn pixels_per_unit(&self) -> Option<f64> {
        self.pixels_per_unit
    }

    /// Reference segment of the last successful calibration
    pub fn reference_segment(&self) -> Option<(Point, Point)> {
        self.reference_segment
    }

    /// Check whether a ratio has been established
    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_unit.is_some()
    }

    /// Calibrate from a reference segment of known length
    ///
    /// Overwrites any previous calibration. On error nothing changes.
    pub fn calibrate(
        &mut self,
        p1: Point,
        p2: Point,
        length: f64,
        unit: Unit,
    ) -> ValidationResult<f64> {
        if !(length.is_finite() && length > 0.0) {
            return Err(ValidationError::NonPositiveLength);
        }

        let pixel_distance = p1.distance_to(&p2);
        if !(pixel_distance.is_finite() && pixel_distance > 0.0) {
            return Err(ValidationError::DegenerateReference);
        }

        let ratio = pixel_distance / to_base_units(length, unit);
        self.pixels_per_unit = Some(ratio);
        self.reference_segment = Some((p1, p2));
        tracing::debug!(pixel_distance, length, %unit, ratio, "calibration established");
        Ok(ratio)
    }
}

/// Calibrations keyed by page index
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    pages: HashMap<u16, CalibrationState>,
}

/// Shared uncalibrated state returned for pages never calibrated
static UNCALIBRATED: CalibrationState = CalibrationState {
    pixels_per_unit: None,
    reference_segment: None,
};

impl CalibrationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Calibration for a page (uncalibrated if never set)
    pub fn get(&self, page_index: u16) -> &CalibrationState {
        self.pages.get(&page_index).unwrap_or(&UNCALIBRATED)
    }

    /// Mutable calibration for a page, created on first access
    pub fn entry(&mut self, page_index: u16) -> &mut CalibrationState {
        self.pages.entry(page_index).or_default()
    }

    /// Replace the calibration of a page
    pub fn set(&mut self, page_index: u16, state: CalibrationState) {
        self.pages.insert(page_index, state);
    }

    /// Forget every calibration
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
