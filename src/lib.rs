//! # Tide Light Engine
//!
//! A deterministic tide-to-light simulation: given a cycle position, a set of
//! tide keyframes, an environment sample and an LED topology, it produces one
//! color per LED. The same engine drives the interactive preview and the
//! embedded render loop, so both must agree numerically for identical inputs.
//!
//! ## Design Philosophy
//!
//! ### One algorithm, explicit state
//! All engine state lives in plain structs passed around explicitly: the
//! keyframe store, the fluid node arrays and the per-tick [`config::Config`].
//! Nothing is hidden in globals, so the engine can be ported or generated for
//! another target without semantic drift.
//!
//! ### Degrade, never halt
//! Missing data falls back to a synthetic harmonic tide, out-of-range
//! configuration is clamped, and every output channel is clamped before it
//! leaves the engine. No engine call returns an error or panics.
//!
//! ### Bounded ticks
//! A render tick is `O(LED count)` with no data-dependent loops and no I/O, so
//! it fits a periodic scheduler slot.
//!
//! ## Data Flow
//! 1. [`keyframes::KeyframeStore`] holds the sorted keyframes
//! 2. [`interpolator`] samples the tide at the current cycle position
//! 3. [`fluid::FluidSimulator`] turns the level into a moving surface (fluid modes)
//! 4. [`animation`] colors each LED through [`topology::TopologyMapper`]
//! 5. an [`output::OutputSink`] receives the finished frame
//!
//! ## Core Types
//! - [`EnvironmentSample`]: wind, temperature and humidity from the sensors
//! - [`FrameTime`]: cycle position plus the animation clock for one tick

use serde::{Deserialize, Serialize};

pub mod animation;
pub mod color;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod fluid;
pub mod interpolator;
pub mod keyframes;
pub mod lunar;
pub mod output;
pub mod shared;
pub mod telemetry;
pub mod tide_data;
pub mod topology;

pub use animation::AnimationMode;
pub use color::Rgb;
pub use engine::Engine;
pub use interpolator::TideSample;
pub use keyframes::{CycleConfig, Effect, Keyframe};

/// Environmental readings supplied by the sensor/data side. Read-only to the
/// engine.
///
/// Field names serialize in snake_case (`wind_speed`), matching the rest of
/// the TOML config. The JSON interchange file spells it `windSpeed`; that
/// mapping lives in [`tide_data`]. Both spellings are accepted on input.
///
/// # Example
/// ```
/// use tidelight::EnvironmentSample;
///
/// let calm = EnvironmentSample::default();
/// assert_eq!(calm.wind_speed, 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSample {
    /// Wind speed in m/s
    #[serde(alias = "windSpeed")]
    pub wind_speed: f32,
    /// Air temperature in °C
    pub temperature: f32,
    /// Relative humidity, 0–100 %
    pub humidity: f32,
}

impl Default for EnvironmentSample {
    fn default() -> Self {
        Self {
            wind_speed: 0.0,
            temperature: 15.0,
            humidity: 60.0,
        }
    }
}

/// Time inputs for one tick.
///
/// `hours` is the position in the tide cycle (drives interpolation and the
/// night window); `seconds` is a free-running animation clock for ripples and
/// sparkles. Keeping them apart preserves sub-second precision in `f32` even
/// late in a weekly cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    pub hours: f32,
    pub seconds: f32,
}

impl FrameTime {
    pub const fn new(hours: f32, seconds: f32) -> Self {
        Self { hours, seconds }
    }

    /// Derive both clocks from a cycle position alone; the animation clock is
    /// the seconds elapsed within the current hour.
    pub fn at_hours(hours: f32) -> Self {
        Self {
            hours,
            seconds: hours.rem_euclid(1.0) * 3600.0,
        }
    }
}
