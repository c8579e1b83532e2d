//! Linear units and pixel-to-world conversion
//!
//! Feet are the base unit. Every stored real-world value is normalized to feet
//! and converted to the display unit only when it is read or formatted, so
//! switching units never touches calibration.

use crate::calibration::CalibrationState;
use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;

/// Supported linear units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum Unit {
    #[default]
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "yd")]
    Yards,
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "mm")]
    Millimeters,
}

impl Unit {
    /// All units, in picker order
    pub const ALL: [Unit; 6] = [
        Unit::Feet,
        Unit::Inches,
        Unit::Yards,
        Unit::Meters,
        Unit::Centimeters,
        Unit::Millimeters,
    ];

    /// Short symbol used in labels and exports
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Feet => "ft",
            Unit::Inches => "in",
            Unit::Yards => "yd",
            Unit::Meters => "m",
            Unit::Centimeters => "cm",
            Unit::Millimeters => "mm",
        }
    }

    /// Multiplier converting a value in this unit to feet
    pub fn to_base_factor(self) -> f64 {
        match self {
            Unit::Feet => 1.0,
            Unit::Inches => 1.0 / 12.0,
            Unit::Yards => 3.0,
            Unit::Meters => 3.280839895,
            Unit::Centimeters => 0.03280839895,
            Unit::Millimeters => 0.003280839895,
        }
    }

    /// Multiplier converting feet to this unit
    pub fn from_base_factor(self) -> f64 {
        1.0 / self.to_base_factor()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ft" | "feet" | "foot" => Ok(Unit::Feet),
            "in" | "inch" | "inches" => Ok(Unit::Inches),
            "yd" | "yard" | "yards" => Ok(Unit::Yards),
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Unit::Meters),
            "cm" | "centimeter" | "centimeters" => Ok(Unit::Centimeters),
            "mm" | "millimeter" | "millimeters" => Ok(Unit::Millimeters),
            _ => Err(ValidationError::UnknownUnit(s.to_string())),
        }
    }
}

/// Convert a value in `unit` to feet
pub fn to_base_units(value: f64, unit: Unit) -> f64 {
    value * unit.to_base_factor()
}

/// Convert a value in feet to `unit`
pub fn from_base_units(value: f64, unit: Unit) -> f64 {
    value * unit.from_base_factor()
}

/// Convert a length between two units
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    from_base_units(to_base_units(value, from), to)
}

/// Convert a pixel length to `unit`, or `None` while uncalibrated
pub fn pixels_to_world_length(px: f64, calibration: &CalibrationState, unit: Unit) -> Option<f64> {
    let ppu = calibration.pixels_per_unit()?;
    Some(from_base_units(px / ppu, unit))
}

/// Convert a pixel area to square `unit`, or `None` while uncalibrated
pub fn pixels_to_world_area(px2: f64, calibration: &CalibrationState, unit: Unit) -> Option<f64> {
    let ppu = calibration.pixels_per_unit()?;
    let factor = unit.from_base_factor();
    Some(px2 / (ppu * ppu) * factor * factor)
}

/// Placeholder shown for values that cannot be computed yet
pub const EMPTY_VALUE: &str = "–";

/// Format a length for display
///
/// Feet switch to inches below two feet and to feet-and-inches above;
/// meters switch to centimeters below one meter.
pub fn format_length(value: Option<f64>, unit: Unit) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return EMPTY_VALUE.to_string();
    };

    match unit {
        Unit::Feet => {
            let inches = v * 12.0;
            if inches < 24.0 {
                return format!("{:.2} in", inches);
            }
            let feet = v.floor();
            let remainder = (v - feet) * 12.0;
            format!("{}′ {:.1}″", feet as i64, remainder)
        }
        Unit::Inches => format!("{:.2} in", v),
        Unit::Meters if v < 1.0 => format!("{:.1} cm", v * 100.0),
        Unit::Meters => format!("{:.3} m", v),
        other => format!("{:.2} {}", v, other.symbol()),
    }
}

/// Format an area for display
pub fn format_area(value: Option<f64>, unit: Unit) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return EMPTY_VALUE.to_string();
    };

    match unit {
        Unit::Feet => format!("{:.2} ft²", v),
        Unit::Inches => format!("{:.0} in²", v),
        Unit::Meters if v < 1.0 => format!("{:.1} cm²", v * 10_000.0),
        Unit::Meters => format!("{:.3} m²", v),
        other => format!("{:.2} {}²", v, other.symbol()),
    }
}

/// Describe the calibration as "1 px = N unit"
pub fn scale_label(calibration: &CalibrationState, unit: Unit) -> String {
    let Some(ppu) = calibration.pixels_per_unit() else {
        return "not set".to_string();
    };

    let per_pixel = from_base_units(1.0 / ppu, unit);
    match unit {
        Unit::Meters => format!("1 px = {:.6} {}", per_pixel, unit),
        _ => format!("1 px = {:.4} {}", per_pixel, unit),
    }
}
