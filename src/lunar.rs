//! Low-precision moon phase (Schaefer 1985 phase routine).
//!
//! Accuracy is about ±1 day on the phase, which is plenty for a light
//! animation. Only the synodic quantities are computed: age since new moon and
//! illuminated fraction.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Mean synodic month in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530_588_2;

/// Moon age and the quantities derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoonPhase {
    /// Days since new moon, `0 ≤ age < 29.53`
    pub age_days: f64,
}

impl MoonPhase {
    pub const NEW: MoonPhase = MoonPhase { age_days: 0.0 };
    pub const FULL: MoonPhase = MoonPhase {
        age_days: SYNODIC_MONTH_DAYS / 2.0,
    };

    pub fn from_age(age_days: f64) -> Self {
        let age_days = if age_days.is_finite() {
            age_days.rem_euclid(SYNODIC_MONTH_DAYS)
        } else {
            0.0
        };
        Self { age_days }
    }

    /// Position in the synodic cycle, 0 = new, 0.5 = full.
    pub fn fraction(&self) -> f64 {
        self.age_days / SYNODIC_MONTH_DAYS
    }

    /// Illuminated fraction of the disc (0–1), cosine model.
    pub fn illumination(&self) -> f64 {
        (1.0 - (self.fraction() * core::f64::consts::TAU).cos()) / 2.0
    }

    /// True between new and full moon.
    pub fn is_waxing(&self) -> bool {
        self.fraction() < 0.5
    }

    /// Phase index 0–7 (0 = new, 4 = full).
    pub fn index(&self) -> u8 {
        ((self.fraction() * 8.0 + 0.5).floor() as u8) & 7
    }

    pub fn advanced_by_hours(&self, hours: f64) -> Self {
        Self::from_age(self.age_days + hours / 24.0)
    }
}

impl Default for MoonPhase {
    fn default() -> Self {
        Self::FULL
    }
}

/// Moon phase at a UTC instant.
pub fn moon_phase(at: DateTime<Utc>) -> MoonPhase {
    let day = at.day() as f64
        + (at.hour() as f64 + at.minute() as f64 / 60.0 + at.second() as f64 / 3600.0) / 24.0;
    moon_phase_ymd(at.year(), at.month(), day)
}

/// Moon phase for a proleptic-Gregorian date; `day` may be fractional.
pub fn moon_phase_ymd(year: i32, month: u32, day: f64) -> MoonPhase {
    // March-based year keeps the day count formula free of leap-day branches
    let (mut y, mut m) = (year, month as i32);
    if m < 3 {
        y -= 1;
        m += 12;
    }
    m += 1;

    // Offset from the 1900-01-00 12 UT new moon epoch
    let days = (365.25 * y as f64).floor() + (30.6 * m as f64).floor() + day - 694_039.09;
    MoonPhase::from_age(days)
}
