//! # Synthetic Tide Model
//!
//! Two closed-form tide approximations used when collaborator data is missing:
//!
//! - [`harmonic_height`] is the interpolator's last resort: a single lunar
//!   semidiurnal (M2) constituent, `50 + 45·cos(2πt / 12.42)`. It needs no
//!   data at all, so the animation never stalls.
//! - [`approximate`] builds a full day of keyframes from a two-constituent
//!   (M2 + S2) equilibrium tide ([`equilibrium_height`]) whose phases follow
//!   the real clock and the moon's age. The day starts at local midnight. Spring tides appear near new/full moon, neap tides near the
//!   quarters. It seeds the engine at startup before the first data refresh.
//!
//! Neither model knows anything about a local station; both only promise a
//! plausible, continuous curve inside `[5, 95]`.

use core::f32::consts::TAU;

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use crate::{
    color::{Color, Rgb},
    keyframes::{Effect, Keyframe},
    lunar,
};

/// M2 period in hours.
pub const M2_PERIOD_HOURS: f32 = 12.42;
/// S2 period in hours.
pub const S2_PERIOD_HOURS: f32 = 12.0;

const MEAN_LEVEL: f32 = 50.0;
const AMPLITUDE: f32 = 45.0;

// Relative constituent amplitudes (Portland, ME harmonics)
const A_M2: f32 = 4.51;
const A_S2: f32 = 0.68;

// Moon transit to local high water
const LUNITIDAL_OFFSET_HOURS: f32 = 3.59;

const LOW_WATER: Rgb = Rgb::new(0, 40, 90);
const HIGH_WATER: Rgb = Rgb::new(0, 170, 200);

/// Single-constituent fallback height at `t` hours, always within `[5, 95]`.
pub fn harmonic_height(t: f32) -> f32 {
    MEAN_LEVEL + AMPLITUDE * (TAU * t / M2_PERIOD_HOURS).cos()
}

/// Color paired with the fallback height so synthetic output still shades
/// from deep to shallow water.
pub fn harmonic_color(height: f32) -> Rgb {
    Color::from_rgb(LOW_WATER)
        .lerp(Color::from_rgb(HIGH_WATER), (height / 100.0).clamp(0.0, 1.0))
        .to_rgb()
}

/// Two-constituent equilibrium height at the instant `at`, within `[5, 95]`.
///
/// The M2 phase follows the clock from the Unix epoch shifted by the
/// lunitidal interval; S2 leads it by twice the moon's phase angle, so the
/// constituents add up at new and full moon.
pub fn equilibrium_height(at: DateTime<Utc>) -> f32 {
    // Wrap in whole seconds before converting to f32 to keep precision
    let m2_period_secs = (M2_PERIOD_HOURS * 3600.0) as i64;
    let lunitidal_secs = (LUNITIDAL_OFFSET_HOURS * 3600.0) as i64;
    let theta_m2 = (at.timestamp() + lunitidal_secs).rem_euclid(m2_period_secs) as f32
        / m2_period_secs as f32
        * TAU;
    let moon_angle = lunar::moon_phase(at).fraction() as f32 * TAU;
    let theta_s2 = theta_m2 + 2.0 * moon_angle;

    let tide = (A_M2 * theta_m2.sin() + A_S2 * theta_s2.sin()) / (A_M2 + A_S2);
    MEAN_LEVEL + AMPLITUDE * tide
}

/// Hourly keyframes (offsets 0..=24) for the local day containing `now`.
///
/// Offset `t` holds [`equilibrium_height`] at `t` hours after that day's
/// midnight in `now`'s time zone, which is the same origin
/// [`CycleConfig::position_of`](crate::keyframes::CycleConfig::position_of)
/// uses. Pass `Local::now()` to line the curve up with the wall clock.
pub fn approximate<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<Keyframe> {
    let midnight = day_start(now);

    (0..=24)
        .map(|hour| {
            let height = equilibrium_height(midnight + Duration::hours(hour));
            Keyframe {
                time_offset: hour as f32,
                height,
                color: harmonic_color(height),
                intensity: 255,
                effect: Effect::Wave,
            }
        })
        .collect()
}

/// Instant of the most recent midnight on `now`'s own wall clock.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let since_midnight = Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(now.nanosecond()));
    now.with_timezone(&Utc) - since_midnight
}
