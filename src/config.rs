//! # Configuration Management
//!
//! This module loads and validates the engine configuration from
//! `tidelight.toml`. The configuration is the engine's only boundary check:
//! everything that could destabilize a tick (LED count, matrix size, fluid
//! constants, night window) is clamped here by [`Config::validated`], so the
//! hot loop never has to.
//!
//! The whole struct is handed to the engine on every tick, so edits made
//! between ticks take effect on the next frame.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    animation::{AnimationMode, NightMode, RenderSettings},
    fluid::FluidParams,
    keyframes::CycleConfig,
    topology::{LayoutKind, Topology},
    EnvironmentSample,
};

/// Default configuration file name, relative to the working directory.
pub const CONFIG_FILE: &str = "tidelight.toml";

/// Largest LED count the engine will allocate for.
pub const MAX_LEDS: usize = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub cycle: CycleConfig,
    pub fluid: FluidParams,
    pub render: RenderConfig,
    pub environment: EnvironmentSample,
    pub data: DataConfig,
}

/// LED hardware description.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub led_count: usize,
    pub layout: LayoutKind,
    /// Matrix columns (ignored for strip and ring)
    pub width: usize,
    /// Matrix rows (ignored for strip and ring)
    pub height: usize,
    pub serpentine: bool,
}

/// Animation and post-processing settings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: AnimationMode,
    /// Global brightness, 0–255
    pub brightness: u8,
    /// Target render rate
    pub fps: u32,
    /// Seed for wind disturbances
    pub seed: u64,
    pub night: NightMode,
}

/// Where the data collaborator drops keyframes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub keyframes_path: PathBuf,
    /// Seconds between reloads of `keyframes_path`
    pub refresh_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            led_count: 60,
            layout: LayoutKind::Strip,
            width: 16,
            height: 16,
            serpentine: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: AnimationMode::FluidPhysics,
            brightness: 200,
            fps: 30,
            seed: 0x7d1e_1167,
            night: NightMode::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            keyframes_path: PathBuf::from("keyframes.json"),
            refresh_secs: 300,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceConfig::default(),
            cycle: CycleConfig::DAILY,
            fluid: FluidParams::default(),
            render: RenderConfig::default(),
            environment: EnvironmentSample::default(),
            data: DataConfig::default(),
        }
    }
}

impl DeviceConfig {
    pub fn topology(&self) -> Topology {
        Topology {
            kind: self.layout,
            width: self.width,
            height: self.height,
            serpentine: self.serpentine,
        }
    }
}

impl RenderConfig {
    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            brightness: self.brightness,
            night: self.night,
        }
    }
}

impl Config {
    /// Load configuration from `tidelight.toml`.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load and validate configuration from `path`.
    /// Falls back to default configuration if the file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    leds = config.device.led_count,
                    mode = config.render.mode.as_str(),
                    "loaded configuration"
                );
                config
            }
            Err(ConfigError::Io(err)) => {
                info!(path = %path.display(), %err, "no config file, using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Load and validate configuration, reporting why it failed.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        Ok(config.validated())
    }

    /// Save the configuration as pretty TOML.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Clamp every field into the range the engine can run unattended with.
    /// Each correction is logged once here instead of being re-checked per tick.
    pub fn validated(mut self) -> Self {
        let device = &mut self.device;
        let led_count = device.led_count.clamp(1, MAX_LEDS);
        if led_count != device.led_count {
            warn!(requested = device.led_count, used = led_count, "LED count out of range");
            device.led_count = led_count;
        }

        if device.layout == LayoutKind::Matrix {
            if device.width == 0 {
                warn!("matrix width 0, using 1");
                device.width = 1;
            }
            let rows = device.led_count.div_ceil(device.width);
            if device.height < rows {
                warn!(
                    width = device.width,
                    height = device.height,
                    leds = device.led_count,
                    "matrix too small for LED count, adding rows"
                );
                device.height = rows;
            }
        }

        let duration = self.cycle.duration();
        if duration != self.cycle.duration_hours {
            warn!(requested = self.cycle.duration_hours, "invalid cycle duration, using 24 h");
            self.cycle.duration_hours = duration;
        }

        let fluid = self.fluid.clamped();
        if fluid != self.fluid {
            warn!(
                requested = ?self.fluid,
                used = ?fluid,
                "fluid parameters outside the stable range"
            );
            self.fluid = fluid;
        }

        let night = &mut self.render.night;
        let hour = |h: f32| if h.is_finite() { h.rem_euclid(24.0) } else { 0.0 };
        let factor = if night.factor.is_finite() {
            night.factor.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if factor != night.factor {
            warn!(requested = night.factor, used = factor, "night factor out of range");
        }
        night.start_hour = hour(night.start_hour);
        night.end_hour = hour(night.end_hour);
        night.factor = factor;

        self.render.fps = self.render.fps.clamp(1, 240);
        self.data.refresh_secs = self.data.refresh_secs.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.led_count, 60);
        assert_eq!(config.device.layout, LayoutKind::Strip);
        assert_eq!(config.cycle, CycleConfig::DAILY);
        assert_eq!(config.render.mode, AnimationMode::FluidPhysics);
        assert!(config.fluid.is_stable());
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
[device]
led_count = 144
layout = "ring"

[render]
mode = "moon_phase"
"#,
        )
        .unwrap();
        assert_eq!(config.device.led_count, 144);
        assert_eq!(config.device.layout, LayoutKind::Ring);
        assert_eq!(config.render.mode, AnimationMode::MoonPhase);
        assert_eq!(config.render.brightness, 200);
        assert_eq!(config.fluid, FluidParams::default());
    }

    #[test]
    fn test_validation_clamps_out_of_range_values() {
        let config = Config::from_toml(
            r#"
[device]
led_count = 0
layout = "matrix"
width = 0
height = 0

[cycle]
duration_hours = -4.0

[fluid]
tension = 0.9
damping = 0.5
spread = 2.0

[render.night]
enabled = true
start_hour = 30.0
end_hour = -2.0
factor = 3.0
"#,
        )
        .unwrap();

        assert_eq!(config.device.led_count, 1);
        assert_eq!(config.device.width, 1);
        assert_eq!(config.device.height, 1);
        assert_eq!(config.cycle.duration_hours, 24.0);
        assert_eq!(config.fluid, FluidParams::STABLE);
        assert_eq!(config.render.night.start_hour, 6.0);
        assert_eq!(config.render.night.end_hour, 22.0);
        assert_eq!(config.render.night.factor, 1.0);
    }

    #[test]
    fn test_matrix_grows_to_fit_led_count() {
        let mut config = Config::default();
        config.device.layout = LayoutKind::Matrix;
        config.device.led_count = 100;
        config.device.width = 16;
        config.device.height = 2;
        let config = config.validated();
        assert_eq!(config.device.height, 7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[device\nled_count = ").unwrap();
        assert!(matches!(
            Config::try_load_from_path(file.path()),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(Config::load_from_path(file.path()), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.render.mode = AnimationMode::Storm;
        config.device.led_count = 32;
        config.save_to_path(file.path()).unwrap();

        let loaded = Config::try_load_from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_environment_keys_are_snake_case() {
        let mut config = Config::default();
        config.environment.wind_speed = 12.5;
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("wind_speed = 12.5"), "{toml_str}");
        assert!(!toml_str.contains("windSpeed"), "{toml_str}");

        for key in ["wind_speed", "windSpeed"] {
            let config = Config::from_toml(&format!("[environment]\n{key} = 8.0\n")).unwrap();
            assert_eq!(config.environment.wind_speed, 8.0, "{key}");
            assert_eq!(config.environment.temperature, 15.0);
        }
    }
}
