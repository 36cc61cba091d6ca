//! # Cross-Task Scalars
//!
//! In the two-task deployment the data task writes the current tide state and
//! environment, and the render task reads them every tick. They exchange
//! plain scalars through relaxed atomics, with no lock.
//!
//! ## Consistency
//! This is deliberately relaxed. Each scalar is read atomically, but a reader
//! may see a new height next to an old color, and values may lag by one
//! publish interval. The output is a light animation: a stale or mixed value
//! is visible for at most one refresh and is never wrong in a way that
//! matters. A lock here would put the render slot at the mercy of the data
//! task.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::{color::Rgb, interpolator::TideSample, keyframes::Effect, EnvironmentSample};

/// An `f32` stored as its bit pattern.
#[derive(Debug, Default)]
pub struct SharedScalar(AtomicU32);

impl SharedScalar {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Latest tide state published by the data task.
#[derive(Debug)]
pub struct SharedTide {
    height: SharedScalar,
    // 0xRRGGBBII: color and intensity in one word
    color_intensity: AtomicU32,
    effect: AtomicU8,
    synthetic: AtomicU8,
}

impl SharedTide {
    pub fn new(initial: &TideSample) -> Self {
        let shared = Self {
            height: SharedScalar::new(initial.height),
            color_intensity: AtomicU32::new(0),
            effect: AtomicU8::new(0),
            synthetic: AtomicU8::new(0),
        };
        shared.publish(initial);
        shared
    }

    pub fn publish(&self, sample: &TideSample) {
        self.height.store(sample.height);
        self.color_intensity
            .store(pack(sample.color, sample.intensity), Ordering::Relaxed);
        self.effect
            .store(effect_to_raw(sample.effect), Ordering::Relaxed);
        self.synthetic
            .store(u8::from(sample.synthetic), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TideSample {
        let (color, intensity) = unpack(self.color_intensity.load(Ordering::Relaxed));
        TideSample {
            height: self.height.load().clamp(0.0, 100.0),
            color,
            intensity,
            effect: effect_from_raw(self.effect.load(Ordering::Relaxed)),
            synthetic: self.synthetic.load(Ordering::Relaxed) != 0,
        }
    }
}

/// Latest environment sample published by the data task.
#[derive(Debug, Default)]
pub struct SharedEnvironment {
    wind_speed: SharedScalar,
    temperature: SharedScalar,
    humidity: SharedScalar,
}

impl SharedEnvironment {
    pub fn new(initial: &EnvironmentSample) -> Self {
        let shared = Self::default();
        shared.publish(initial);
        shared
    }

    pub fn publish(&self, sample: &EnvironmentSample) {
        self.wind_speed.store(sample.wind_speed);
        self.temperature.store(sample.temperature);
        self.humidity.store(sample.humidity);
    }

    pub fn snapshot(&self) -> EnvironmentSample {
        EnvironmentSample {
            wind_speed: self.wind_speed.load(),
            temperature: self.temperature.load(),
            humidity: self.humidity.load(),
        }
    }
}

fn pack(color: Rgb, intensity: u8) -> u32 {
    u32::from_be_bytes([color.r, color.g, color.b, intensity])
}

fn unpack(word: u32) -> (Rgb, u8) {
    let [r, g, b, intensity] = word.to_be_bytes();
    (Rgb::new(r, g, b), intensity)
}

fn effect_to_raw(effect: Effect) -> u8 {
    match effect {
        Effect::Static => 0,
        Effect::Wave => 1,
        Effect::Pulse => 2,
        Effect::Glow => 3,
    }
}

fn effect_from_raw(raw: u8) -> Effect {
    match raw {
        1 => Effect::Wave,
        2 => Effect::Pulse,
        3 => Effect::Glow,
        _ => Effect::Static,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_tide_snapshot_matches_published_sample() {
        let sample = TideSample {
            height: 63.5,
            color: Rgb::new(12, 34, 56),
            intensity: 200,
            effect: Effect::Glow,
            synthetic: true,
        };
        let shared = SharedTide::new(&sample);
        assert_eq!(shared.snapshot(), sample);
    }

    #[test]
    fn test_environment_is_visible_across_threads() {
        let shared = Arc::new(SharedEnvironment::new(&EnvironmentSample::default()));
        let writer = Arc::clone(&shared);
        thread::spawn(move || {
            writer.publish(&EnvironmentSample {
                wind_speed: 12.5,
                temperature: -3.0,
                humidity: 90.0,
            });
        })
        .join()
        .unwrap();

        let seen = shared.snapshot();
        assert_eq!(seen.wind_speed, 12.5);
        assert_eq!(seen.temperature, -3.0);
        assert_eq!(seen.humidity, 90.0);
    }
}
