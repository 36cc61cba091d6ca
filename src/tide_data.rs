//! # Keyframe Interchange File
//!
//! The data collaborator (a tide API client, a sensor bridge, or a person with
//! a text editor) drops a JSON file that the binary loads and swaps into the
//! engine wholesale:
//!
//! ```json
//! {
//!   "cycleDuration": 24,
//!   "keyframes": [
//!     { "timeOffset": 0,  "height": 20, "color": "#004080", "intensity": 255 },
//!     { "timeOffset": 6,  "height": 80, "color": "#00a0c0", "intensity": 255, "effect": "wave" }
//!   ],
//!   "environment": { "windSpeed": 4.5, "temperature": 12, "humidity": 70 }
//! }
//! ```
//!
//! `environment` is optional; when absent the configured default applies.
//!
//! ## Reloading
//! The data task polls [`modified`] and only re-reads the file when its
//! modification time changes, so an idle file costs one `stat` per refresh.
//!
//! ## Error Handling
//! Every failure is a [`TideDataError`]. Callers are expected to keep the
//! keyframes they already have, or fall back to [`crate::fallback::approximate`]
//! when nothing has been loaded yet (see [`load_or_approximate`]).

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, time::SystemTime};
use thiserror::Error;
use tracing::{info, warn};

use crate::{fallback, keyframes::CycleConfig, Keyframe, EnvironmentSample};

#[derive(Error, Debug)]
pub enum TideDataError {
    /// File missing, unreadable or unwritable
    #[error("keyframe file IO: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON or an invalid field (bad color, wrong type)
    #[error("keyframe file JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed fine but holds no keyframes
    #[error("keyframe file has no keyframes")]
    Empty,
}

/// Contents of the interchange file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideFile {
    /// Cycle length in hours
    #[serde(default = "default_cycle_duration")]
    pub cycle_duration: f32,
    pub keyframes: Vec<Keyframe>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "environment_json"
    )]
    pub environment: Option<EnvironmentSample>,
}

/// Wire shape of the `environment` object: camelCase like the rest of the
/// file, while [`EnvironmentSample`] itself stays snake_case for TOML.
#[derive(Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EnvironmentJson {
    #[serde(alias = "wind_speed")]
    wind_speed: f32,
    temperature: f32,
    humidity: f32,
}

impl Default for EnvironmentJson {
    fn default() -> Self {
        EnvironmentSample::default().into()
    }
}

impl From<EnvironmentSample> for EnvironmentJson {
    fn from(env: EnvironmentSample) -> Self {
        Self {
            wind_speed: env.wind_speed,
            temperature: env.temperature,
            humidity: env.humidity,
        }
    }
}

impl From<EnvironmentJson> for EnvironmentSample {
    fn from(env: EnvironmentJson) -> Self {
        Self {
            wind_speed: env.wind_speed,
            temperature: env.temperature,
            humidity: env.humidity,
        }
    }
}

mod environment_json {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::EnvironmentJson;
    use crate::EnvironmentSample;

    pub fn serialize<S: Serializer>(
        env: &Option<EnvironmentSample>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        env.map(EnvironmentJson::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EnvironmentSample>, D::Error> {
        Ok(Option::<EnvironmentJson>::deserialize(deserializer)?.map(Into::into))
    }
}

fn default_cycle_duration() -> f32 {
    CycleConfig::DAILY.duration_hours
}

impl TideFile {
    pub fn new(cycle: CycleConfig, keyframes: Vec<Keyframe>) -> Self {
        Self {
            cycle_duration: cycle.duration_hours,
            keyframes,
            environment: None,
        }
    }

    pub fn cycle(&self) -> CycleConfig {
        CycleConfig {
            duration_hours: self.cycle_duration,
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, TideDataError> {
        let file: TideFile = serde_json::from_slice(data)?;
        if file.keyframes.is_empty() {
            return Err(TideDataError::Empty);
        }
        Ok(file)
    }
}

/// Read and parse the interchange file at `path`.
pub fn load<P: AsRef<Path>>(path: P) -> Result<TideFile, TideDataError> {
    let data = fs::read(path)?;
    TideFile::from_json(&data)
}

/// Write `file` as pretty JSON.
pub fn save<P: AsRef<Path>>(path: P, file: &TideFile) -> Result<(), TideDataError> {
    let data = serde_json::to_vec_pretty(file)?;
    fs::write(path, data)?;
    Ok(())
}

/// Modification time of the file, used to skip reloading an unchanged file.
pub fn modified<P: AsRef<Path>>(path: P) -> Result<SystemTime, TideDataError> {
    Ok(fs::metadata(path)?.modified()?)
}

/// Load the file, or synthesize the local day containing `now` if it can't
/// be used. The returned flag is true for synthetic data.
pub fn load_or_approximate<P, Tz>(path: P, now: &DateTime<Tz>) -> (TideFile, bool)
where
    P: AsRef<Path>,
    Tz: TimeZone,
{
    let path = path.as_ref();
    match load(path) {
        Ok(file) => {
            info!(
                path = %path.display(),
                keyframes = file.keyframes.len(),
                cycle_hours = file.cycle_duration,
                "loaded keyframes"
            );
            (file, false)
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "using synthetic keyframes");
            (
                TideFile::new(CycleConfig::DAILY, fallback::approximate(now)),
                true,
            )
        }
    }
}
