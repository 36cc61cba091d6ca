//! # Tide Keyframes
//!
//! Keyframes are the engine's only tide input: timestamped samples of water
//! height, color, intensity and a visual effect. They arrive from the data
//! collaborator as a complete list and replace whatever the store held before.
//!
//! ## Ordering
//! A [`KeyframeStore`] is always sorted ascending by `time_offset`. The sort is
//! stable, so keyframes sharing an offset keep the order they were supplied in
//! and the first of them wins during interpolation. That tie-break is an
//! artifact of the search order, not a promise.
//!
//! ## Weekly projection
//! [`project_week`] expands a single day of keyframes into seven, shifting each
//! successive day by the ~50 minute lunar day-over-day drift.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{self, Rgb};

/// Hours the tide schedule slips per day (lunar day ≈ 24 h 50 m).
pub const LUNAR_DAILY_DRIFT_HOURS: f32 = 0.84;

/// Visual treatment attached to a keyframe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Static,
    Wave,
    Pulse,
    Glow,
}

/// One timestamped tide sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Hours from the start of the cycle
    pub time_offset: f32,
    /// Water level, 0 (empty) to 100 (full)
    pub height: f32,
    #[serde(with = "color::hex")]
    pub color: Rgb,
    pub intensity: u8,
    #[serde(default)]
    pub effect: Effect,
}

impl Keyframe {
    pub fn new(time_offset: f32, height: f32) -> Self {
        Self {
            time_offset,
            height,
            color: Rgb::new(0, 105, 148),
            intensity: 255,
            effect: Effect::Static,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }
}

/// Length of the repeating tide cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub duration_hours: f32,
}

impl CycleConfig {
    pub const DAILY: CycleConfig = CycleConfig { duration_hours: 24.0 };
    pub const WEEKLY: CycleConfig = CycleConfig { duration_hours: 168.0 };

    /// Cycle duration with non-positive or non-finite values replaced by a day.
    pub fn duration(&self) -> f32 {
        if self.duration_hours.is_finite() && self.duration_hours > 0.0 {
            self.duration_hours
        } else {
            24.0
        }
    }

    /// Daily cycles wrap from the last keyframe back to the first; longer
    /// (multi-day) cycles do not.
    pub fn wraps(&self) -> bool {
        self.duration() <= 24.0
    }

    /// Fold any time into `[0, duration)`.
    pub fn normalize(&self, hours: f32) -> f32 {
        if !hours.is_finite() {
            return 0.0;
        }
        let duration = self.duration();
        let t = hours.rem_euclid(duration);
        // rem_euclid can round up to the divisor for tiny negative inputs
        if t >= duration {
            0.0
        } else {
            t
        }
    }

    /// Hours into the cycle at a wall-clock instant. Daily cycles start at
    /// midnight, longer cycles at Monday 00:00.
    pub fn position_of<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> f32 {
        let hour_of_day = at.hour() as f32
            + at.minute() as f32 / 60.0
            + (at.second() as f32 + at.nanosecond() as f32 / 1e9) / 3600.0;
        let days = if self.wraps() {
            0.0
        } else {
            at.weekday().num_days_from_monday() as f32
        };
        self.normalize(days * 24.0 + hour_of_day)
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self::DAILY
    }
}

/// Sorted keyframe list owned by the engine.
#[derive(Clone, Debug, Default)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keyframes(keyframes: Vec<Keyframe>) -> Self {
        let mut store = Self::new();
        store.replace(keyframes);
        store
    }

    /// Swap in a complete keyframe set.
    ///
    /// Entries with a non-finite offset or height are dropped, negative offsets
    /// are pinned to zero and heights clamped to `0..=100`.
    pub fn replace(&mut self, mut keyframes: Vec<Keyframe>) {
        let supplied = keyframes.len();
        keyframes.retain(|k| k.time_offset.is_finite() && k.height.is_finite());
        for keyframe in &mut keyframes {
            keyframe.time_offset = keyframe.time_offset.max(0.0);
            keyframe.height = keyframe.height.clamp(0.0, 100.0);
        }
        keyframes.sort_by(|a, b| a.time_offset.total_cmp(&b.time_offset));

        if keyframes.len() != supplied {
            debug!(
                supplied,
                kept = keyframes.len(),
                "dropped non-finite keyframes"
            );
        }
        self.keyframes = keyframes;
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn first(&self) -> Option<&Keyframe> {
        self.keyframes.first()
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }
}

/// Expand one day of keyframes into a seven-day series.
///
/// Day `d` repeats the base values shifted by `d * 24 + d * 0.84` hours. The
/// result is sorted, so offsets never decrease across day boundaries.
pub fn project_week(base: &[Keyframe]) -> Vec<Keyframe> {
    let mut week = Vec::with_capacity(base.len() * 7);
    for day in 0..7u8 {
        let shift = f32::from(day) * (24.0 + LUNAR_DAILY_DRIFT_HOURS);
        week.extend(base.iter().map(|k| Keyframe {
            time_offset: k.time_offset + shift,
            ..*k
        }));
    }
    week.sort_by(|a, b| a.time_offset.total_cmp(&b.time_offset));
    week
}
