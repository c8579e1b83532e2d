//! Tools, pointer input, and transition outcomes

use crate::error::ValidationError;
use crate::geometry::Point;
use crate::units::Unit;
use std::fmt;
use std::str::FromStr;

/// Active interaction tool
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pointer drags scroll the view; clicks never touch measurements
    #[default]
    Pan,
    /// Two clicks define a reference segment
    Calibrate,
    /// Two clicks commit a line
    Line,
    /// Clicks append polygon vertices until finished
    Area,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Pan => "pan",
            Tool::Calibrate => "calibrate",
            Tool::Line => "line",
            Tool::Area => "area",
        }
    }

    /// Capitalized name for status displays
    pub fn title(self) -> &'static str {
        match self {
            Tool::Pan => "Pan",
            Tool::Calibrate => "Calibrate",
            Tool::Line => "Line",
            Tool::Area => "Area",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pan" => Ok(Tool::Pan),
            "calibrate" => Ok(Tool::Calibrate),
            "line" => Ok(Tool::Line),
            "area" => Ok(Tool::Area),
            _ => Err(ValidationError::UnknownTool(s.to_string())),
        }
    }
}

/// Mouse button that started a pointer press
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    /// Always pans, whatever the active tool
    Middle,
}

/// Result of an accepted engine operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing applied (no page, no draft, wrong tool)
    Ignored,
    /// The press belongs to a pan gesture handled by the view
    Panning,
    /// First calibration point stored
    CalibrationPointPlaced,
    /// Reference segment complete; the caller should ask for its length
    CalibrationRequested { pixel_distance: f64 },
    /// Calibration applied
    Calibrated { pixels_per_unit: f64 },
    /// Calibration segment abandoned
    CalibrationCancelled,
    /// A new draft was started with one vertex
    DraftStarted,
    /// A vertex was appended to the area draft
    PointAdded { count: usize },
    /// Live preview cursor moved
    CursorMoved,
    /// A measurement was committed at this index
    Committed { index: usize },
    /// Undo removed a draft vertex
    PointRemoved { remaining: usize },
    /// The draft was dropped
    DraftDiscarded,
    /// Draft and measurements were cleared
    Cleared,
    ToolChanged(Tool),
    ZoomChanged { zoom: f64 },
    PageChanged { page_number: u16 },
    SettingChanged,
}

/// Serializable engine input, one per UI event
///
/// Points are device pixels on the currently rendered page.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineInput {
    LoadDocument {
        page_count: u16,
    },
    AttachSurface {
        page_index: u16,
        width_px: u32,
        height_px: u32,
    },
    SelectTool {
        tool: Tool,
    },
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    /// Length entered for the pending reference segment
    ApplyCalibration {
        length: f64,
        unit: Unit,
    },
    CancelCalibration,
    /// Calibrate directly from two device-pixel points
    Calibrate {
        a: Point,
        b: Point,
        length: f64,
        unit: Unit,
    },
    /// Double-click, Enter, or the finish button
    Finish,
    Undo,
    ClearAll,
    SetZoom {
        zoom: f64,
    },
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Wheel {
        delta_y: f64,
    },
    SetDevicePixelRatio {
        ratio: f64,
    },
    SetPanOverride {
        active: bool,
    },
    NextPage,
    PrevPage,
    GoToPage {
        page_number: u16,
    },
    SetUnit {
        unit: Unit,
    },
    ToggleLabels,
    SetSnap {
        enabled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_round_trips_through_name() {
        for tool in [Tool::Pan, Tool::Calibrate, Tool::Line, Tool::Area] {
            assert_eq!(tool.name().parse::<Tool>().unwrap(), tool);
        }
        assert_eq!(
            "lasso".parse::<Tool>(),
            Err(ValidationError::UnknownTool("lasso".to_string()))
        );
    }

    #[test]
    fn test_input_deserializes_from_tagged_json() {
        let inputs: Vec<EngineInput> = serde_json::from_str(
            r#"[
                {"event": "select_tool", "tool": "area"},
                {"event": "pointer_down", "x": 3.0, "y": 4.0},
                {"event": "pointer_down", "x": 3.0, "y": 4.0, "button": "middle"},
                {"event": "apply_calibration", "length": 10, "unit": "ft"},
                {"event": "finish"}
            ]"#,
        )
        .unwrap();

        assert_eq!(inputs[0], EngineInput::SelectTool { tool: Tool::Area });
        assert_eq!(
            inputs[1],
            EngineInput::PointerDown {
                x: 3.0,
                y: 4.0,
                button: PointerButton::Primary
            }
        );
        assert!(matches!(
            inputs[2],
            EngineInput::PointerDown {
                button: PointerButton::Middle,
                ..
            }
        ));
        assert_eq!(
            inputs[3],
            EngineInput::ApplyCalibration {
                length: 10.0,
                unit: Unit::Feet
            }
        );
        assert_eq!(inputs[4], EngineInput::Finish);
    }
}
