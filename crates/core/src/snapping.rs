//! Snap-to-point for digitizing
//!
//! Before a click is accepted the engine may replace it with the nearest
//! existing vertex, so adjacent measurements share exact endpoints. A snap is a
//! one-off coordinate substitution, not a persistent link between shapes.

use crate::geometry::Point;

/// Configuration for snapping behavior
#[derive(Debug, Clone, PartialEq)]
pub struct SnapConfig {
    /// Enable/disable snapping
    pub enabled: bool,

    /// Snap radius in CSS pixels, scaled by the device pixel ratio
    pub radius_px: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius_px: 8.0,
        }
    }
}

/// A snap result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    /// Vertex the click was moved to
    pub target_position: Point,

    /// Raw click position
    pub source_position: Point,

    /// Distance from the click to the vertex
    pub distance: f64,
}

/// Snapping engine for calculating snap targets
#[derive(Debug, Default)]
pub struct SnapEngine {
    config: SnapConfig,
}

impl SnapEngine {
    /// Create a snap engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snap engine with custom configuration
    pub fn with_config(config: SnapConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Turn snapping on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Check if snapping is on
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Find the closest candidate strictly inside `radius` of `position`
    ///
    /// `radius` is in the same space as the points. Returns `None` when
    /// snapping is disabled or nothing is close enough.
    pub fn find_target(
        &self,
        position: Point,
        candidates: &[Point],
        radius: f64,
    ) -> Option<SnapTarget> {
        if !self.config.enabled {
            return None;
        }

        let mut best: Option<SnapTarget> = None;
        let mut best_distance = radius;

        for candidate in candidates {
            let distance = position.distance_to(candidate);
            if distance < best_distance {
                best_distance = distance;
                best = Some(SnapTarget {
                    target_position: *candidate,
                    source_position: position,
                    distance,
                });
            }
        }

        best
    }

    /// Snap `position` if a candidate is in range, otherwise return it as is
    pub fn snap(&self, position: Point, candidates: &[Point], radius: f64) -> Point {
        self.find_target(position, candidates, radius)
            .map(|target| target.target_position)
            .unwrap_or(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> SnapEngine {
        SnapEngine::with_config(SnapConfig {
            enabled: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_snaps_to_vertex_within_radius() {
        let engine = enabled();
        let snapped = engine.snap(Point::new(53.0, 52.0), &[Point::new(50.0, 50.0)], 8.0);
        assert_eq!(snapped, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_ignores_vertices_outside_radius() {
        let engine = enabled();
        let click = Point::new(70.0, 70.0);
        assert_eq!(engine.snap(click, &[Point::new(50.0, 50.0)], 8.0), click);
    }

    #[test]
    fn test_radius_is_exclusive() {
        let engine = enabled();
        let click = Point::new(58.0, 50.0);
        assert_eq!(engine.snap(click, &[Point::new(50.0, 50.0)], 8.0), click);
    }

    #[test]
    fn test_picks_nearest_candidate() {
        let engine = enabled();
        let candidates = [Point::new(10.0, 10.0), Point::new(14.0, 10.0)];

        let target = engine
            .find_target(Point::new(13.0, 10.0), &candidates, 8.0)
            .unwrap();
        assert_eq!(target.target_position, Point::new(14.0, 10.0));
        assert_eq!(target.distance, 1.0);
    }

    #[test]
    fn test_disabled_engine_never_snaps() {
        let engine = SnapEngine::new();
        assert!(!engine.is_enabled());
        let click = Point::new(51.0, 50.0);
        assert_eq!(engine.snap(click, &[Point::new(50.0, 50.0)], 8.0), click);
    }
}
