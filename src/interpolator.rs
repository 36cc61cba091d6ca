//! # Tide Interpolation
//!
//! Turns a cycle position plus the keyframe store into one [`TideSample`].
//!
//! Lookup order:
//! 1. Fold the time into `[0, cycle)`.
//! 2. With fewer than two keyframes, or a time outside the covered span of a
//!    non-wrapping (multi-day) cycle, use the synthetic harmonic model.
//! 3. Otherwise find the bracketing pair (wrapping last → first on daily
//!    cycles) and interpolate height, color channels and intensity linearly.
//!    The effect is taken from the earlier keyframe. A time landing exactly
//!    on a keyframe returns that keyframe unchanged, effect included.
//!
//! Sampling never fails. Missing or expired data degrades to the synthetic
//! curve, flagged through [`TideSample::synthetic`].

use crate::{
    color::{lerp, Rgb},
    fallback,
    keyframes::{CycleConfig, Effect, Keyframe, KeyframeStore},
};

/// Instantaneous tide state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideSample {
    /// Water level, 0–100
    pub height: f32,
    pub color: Rgb,
    pub intensity: u8,
    pub effect: Effect,
    /// True when produced by the harmonic fallback instead of keyframes
    pub synthetic: bool,
}

impl TideSample {
    /// Water level as a fraction, 0–1.
    pub fn level(&self) -> f32 {
        (self.height / 100.0).clamp(0.0, 1.0)
    }

    fn from_keyframe(keyframe: &Keyframe) -> Self {
        Self {
            height: keyframe.height.clamp(0.0, 100.0),
            color: keyframe.color,
            intensity: keyframe.intensity,
            effect: keyframe.effect,
            synthetic: false,
        }
    }

    fn synthetic(t: f32) -> Self {
        let height = fallback::harmonic_height(t).clamp(0.0, 100.0);
        Self {
            height,
            color: fallback::harmonic_color(height),
            intensity: 255,
            effect: Effect::Wave,
            synthetic: true,
        }
    }
}

/// Keyframe store plus the cycle it is interpreted against.
#[derive(Clone, Debug, Default)]
pub struct TideInterpolator {
    store: KeyframeStore,
}

impl TideInterpolator {
    pub fn new(store: KeyframeStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Replace the keyframe set wholesale.
    pub fn replace_keyframes(&mut self, keyframes: Vec<Keyframe>) {
        self.store.replace(keyframes);
    }

    pub fn sample(&self, cycle: &CycleConfig, t: f32) -> TideSample {
        sample(&self.store, cycle, t)
    }
}

/// Sample the tide at `t` hours.
pub fn sample(store: &KeyframeStore, cycle: &CycleConfig, t: f32) -> TideSample {
    let t = cycle.normalize(t);
    let keyframes = store.keyframes();

    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return TideSample::synthetic(t);
    };
    if keyframes.len() < 2 {
        return TideSample::synthetic(t);
    }

    if let Some(pair) = keyframes
        .windows(2)
        .find(|w| w[0].time_offset <= t && t <= w[1].time_offset)
    {
        let (start, end) = (&pair[0], &pair[1]);
        let duration = end.time_offset - start.time_offset;
        return blend(start, end, t - start.time_offset, duration);
    }

    // Outside [first, last]
    if !cycle.wraps() {
        return TideSample::synthetic(t);
    }

    let duration = cycle.duration();
    let mut span = first.time_offset - last.time_offset;
    if span < 0.0 {
        span += duration;
    }
    let mut elapsed = t - last.time_offset;
    if elapsed < 0.0 {
        elapsed += duration;
    }
    blend(last, first, elapsed, span)
}

fn blend(start: &Keyframe, end: &Keyframe, elapsed: f32, duration: f32) -> TideSample {
    let progress = if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if progress == 0.0 {
        return TideSample::from_keyframe(start);
    }
    if progress >= 1.0 {
        return TideSample::from_keyframe(end);
    }

    let channel = |a: u8, b: u8| lerp(f32::from(a), f32::from(b), progress).round() as u8;
    TideSample {
        height: lerp(start.height, end.height, progress).clamp(0.0, 100.0),
        color: Rgb::new(
            channel(start.color.r, end.color.r),
            channel(start.color.g, end.color.g),
            channel(start.color.b, end.color.b),
        ),
        intensity: channel(start.intensity, end.intensity),
        effect: start.effect,
        synthetic: false,
    }
}
