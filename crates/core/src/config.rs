//! Engine configuration
//!
//! Settings can be created programmatically, loaded from a TOML file, or
//! overridden through environment variables. Missing keys fall back to the
//! defaults below.

use crate::units::Unit;
use std::fs;
use std::path::Path;

/// Configuration for a measurement engine
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unit used for every displayed length and area
    pub display_unit: Unit,
    /// Draw floating value labels
    pub show_labels: bool,
    /// Snap clicks to existing vertices
    pub snap_enabled: bool,
    /// Snap radius in CSS pixels (scaled by the device pixel ratio)
    pub snap_radius_px: f64,
    /// Device pixels per CSS pixel
    pub device_pixel_ratio: f64,
    /// Lower zoom bound
    pub min_zoom: f64,
    /// Upper zoom bound
    pub max_zoom: f64,
    /// Factor applied by zoom in / zoom out
    pub zoom_step: f64,
    /// Factor applied per wheel notch
    pub wheel_zoom_step: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            display_unit: Unit::Feet,
            show_labels: true,
            snap_enabled: false,
            snap_radius_px: 8.0,
            device_pixel_ratio: 1.0,
            min_zoom: 0.2,
            max_zoom: 6.0,
            zoom_step: 1.2,
            wheel_zoom_step: 1.12,
        }
    }
}

impl EngineConfig {
    /// Sets the display unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.display_unit = unit;
        self
    }

    /// Enables or disables snapping.
    pub fn with_snap(mut self, enabled: bool) -> Self {
        self.snap_enabled = enabled;
        self
    }

    /// Sets the device pixel ratio.
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `TAKEOFF_UNIT`: display unit symbol (default: ft)
    /// - `TAKEOFF_SHOW_LABELS`: true/false (default: true)
    /// - `TAKEOFF_SNAP`: true/false (default: false)
    /// - `TAKEOFF_SNAP_RADIUS_PX`: snap radius in CSS pixels (default: 8)
    /// - `TAKEOFF_DEVICE_PIXEL_RATIO`: device pixel ratio (default: 1)
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Applies environment overrides to an existing configuration.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(val) = env_var("TAKEOFF_UNIT") {
            self.display_unit = val
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TAKEOFF_UNIT".to_string()))?;
        }

        if let Some(val) = env_var("TAKEOFF_SHOW_LABELS") {
            self.show_labels = parse_env("TAKEOFF_SHOW_LABELS", &val)?;
        }

        if let Some(val) = env_var("TAKEOFF_SNAP") {
            self.snap_enabled = parse_env("TAKEOFF_SNAP", &val)?;
        }

        if let Some(val) = env_var("TAKEOFF_SNAP_RADIUS_PX") {
            self.snap_radius_px = parse_env("TAKEOFF_SNAP_RADIUS_PX", &val)?;
        }

        if let Some(val) = env_var("TAKEOFF_DEVICE_PIXEL_RATIO") {
            self.device_pixel_ratio = parse_env("TAKEOFF_DEVICE_PIXEL_RATIO", &val)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// display_unit = "m"
    /// snap_enabled = true
    /// snap_radius_px = 10.0
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml()?)?;
        Ok(())
    }

    /// Converts configuration to TOML format.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Checks that numeric settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.device_pixel_ratio) {
            return Err(ConfigError::InvalidValue("device_pixel_ratio".to_string()));
        }
        if !(self.snap_radius_px.is_finite() && self.snap_radius_px >= 0.0) {
            return Err(ConfigError::InvalidValue("snap_radius_px".to_string()));
        }
        if !positive(self.min_zoom) || !positive(self.max_zoom) || self.max_zoom < self.min_zoom {
            return Err(ConfigError::InvalidValue("min_zoom/max_zoom".to_string()));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::InvalidValue("zoom_step".to_string()));
        }
        if !(self.wheel_zoom_step.is_finite() && self.wheel_zoom_step > 1.0) {
            return Err(ConfigError::InvalidValue("wheel_zoom_step".to_string()));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const ENV_KEYS: [&str; 5] = [
        "TAKEOFF_UNIT",
        "TAKEOFF_SHOW_LABELS",
        "TAKEOFF_SNAP",
        "TAKEOFF_SNAP_RADIUS_PX",
        "TAKEOFF_DEVICE_PIXEL_RATIO",
    ];

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.display_unit, Unit::Feet);
        assert!(config.show_labels);
        assert!(!config.snap_enabled);
        assert_eq!(config.snap_radius_px, 8.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = EngineConfig::default()
            .with_unit(Unit::Meters)
            .with_snap(true)
            .with_device_pixel_ratio(2.0);

        assert_eq!(config.display_unit, Unit::Meters);
        assert!(config.snap_enabled);
        assert_eq!(config.device_pixel_ratio, 2.0);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        env::set_var("TAKEOFF_UNIT", "m");
        env::set_var("TAKEOFF_SHOW_LABELS", "false");
        env::set_var("TAKEOFF_SNAP", "true");
        env::set_var("TAKEOFF_SNAP_RADIUS_PX", "12");
        env::set_var("TAKEOFF_DEVICE_PIXEL_RATIO", "2");

        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config.display_unit, Unit::Meters);
        assert!(!config.show_labels);
        assert!(config.snap_enabled);
        assert_eq!(config.snap_radius_px, 12.0);
        assert_eq!(config.device_pixel_ratio, 2.0);
    }

    #[test]
    #[serial]
    fn test_from_env_partial() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        for key in ENV_KEYS {
            env::remove_var(key);
        }
        env::set_var("TAKEOFF_SNAP", "true");

        let config = EngineConfig::from_env().unwrap();
        assert!(config.snap_enabled);
        assert_eq!(config.display_unit, Unit::Feet); // default
        assert_eq!(config.device_pixel_ratio, 1.0); // default
    }

    #[test]
    #[serial]
    fn test_from_env_invalid() {
        let _guard = EnvGuard::new(&ENV_KEYS);

        env::set_var("TAKEOFF_UNIT", "cubits");
        assert!(matches!(
            EngineConfig::from_env(),
            Err(ConfigError::InvalidValue(key)) if key == "TAKEOFF_UNIT"
        ));

        env::remove_var("TAKEOFF_UNIT");
        env::set_var("TAKEOFF_DEVICE_PIXEL_RATIO", "-1");
        assert!(EngineConfig::from_env().is_err());
    }

    // Helper to save and restore environment variables
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(var_names: &[&str]) -> Self {
            let vars = var_names
                .iter()
                .map(|name| (name.to_string(), env::var(name).ok()))
                .collect();
            Self { vars }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in &self.vars {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml(
            r#"
            display_unit = "in"
            snap_enabled = true
        "#,
        )
        .unwrap();

        assert_eq!(config.display_unit, Unit::Inches);
        assert!(config.snap_enabled);
        assert_eq!(config.max_zoom, 6.0);
    }

    #[test]
    fn test_from_toml_rejects_bad_zoom_range() {
        let result = EngineConfig::from_toml("min_zoom = 4.0\nmax_zoom = 2.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_from_toml_rejects_unknown_unit() {
        assert!(matches!(
            EngineConfig::from_toml("display_unit = \"cubits\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("takeoff.toml");

        let config = EngineConfig::default()
            .with_unit(Unit::Centimeters)
            .with_snap(true);
        config.save_to_file(&path).unwrap();

        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_from_file_missing() {
        let result = EngineConfig::from_file("/nonexistent/takeoff.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
