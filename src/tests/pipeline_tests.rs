//! # End-to-End Pipeline Tests
//!
//! These tests drive the library the way the binary does: keyframes in,
//! frames out. Module-level details are covered by the inline unit tests.

use approx::assert_relative_eq;
use chrono::{FixedOffset, TimeZone, Utc};
use tempfile::NamedTempFile;

use crate::roll_synthetic_day;
use tidelight::{
    config::Config,
    fallback,
    fluid::{FluidParams, FluidSimulator},
    interpolator::{self, TideInterpolator},
    keyframes::{project_week, KeyframeStore, LUNAR_DAILY_DRIFT_HOURS},
    shared::SharedTide,
    tide_data::{self, TideFile},
    topology::{Topology, TopologyMapper},
    AnimationMode, CycleConfig, Effect, Engine, EnvironmentSample, FrameTime, Keyframe, Rgb,
};

/// The reference day used throughout: low, high, low, high, low.
fn reference_day() -> Vec<Keyframe> {
    vec![
        Keyframe::new(0.0, 20.0),
        Keyframe::new(6.0, 80.0),
        Keyframe::new(12.0, 10.0),
        Keyframe::new(18.0, 90.0),
        Keyframe::new(24.0, 20.0),
    ]
}

fn config_for(mode: AnimationMode, leds: usize) -> Config {
    let mut config = Config::default();
    config.render.mode = mode;
    config.render.brightness = 255;
    config.device.led_count = leds;
    config
}

/// Halfway between 20 at 0 h and 80 at 6 h is exactly 50.
#[test]
fn midpoint_between_keyframes_is_linear() {
    let config = Config::default();
    let mut engine = Engine::new(&config);
    engine.replace_keyframes(reference_day());

    let sample = engine.sample(&config, FrameTime::at_hours(3.0));
    assert_relative_eq!(sample.height, 50.0, epsilon = 1e-4);
    assert!(!sample.synthetic);
}

/// Sampling at a keyframe offset returns that keyframe exactly, including
/// its effect, even though the pair ending there is found first.
#[test]
fn keyframe_offsets_sample_exactly() {
    let effects = [Effect::Static, Effect::Pulse, Effect::Glow, Effect::Wave];
    let day: Vec<Keyframe> = reference_day()
        .into_iter()
        .zip(effects.iter().cycle())
        .map(|(keyframe, effect)| keyframe.with_effect(*effect))
        .collect();
    let store = KeyframeStore::from_keyframes(day.clone());
    for keyframe in &day[..4] {
        let sample = interpolator::sample(&store, &CycleConfig::DAILY, keyframe.time_offset);
        assert_eq!(sample.height, keyframe.height);
        assert_eq!(sample.effect, keyframe.effect, "at {}", keyframe.time_offset);
    }
}

/// Without enough keyframes the synthetic tide stays inside `[5, 95]`.
#[test]
fn sparse_keyframes_stay_in_synthetic_range() {
    for keyframes in [vec![], vec![Keyframe::new(4.0, 100.0)]] {
        let store = KeyframeStore::from_keyframes(keyframes);
        for step in 0..=480 {
            let t = step as f32 * 0.1 - 12.0;
            let sample = interpolator::sample(&store, &CycleConfig::DAILY, t);
            assert!(
                (5.0..=95.0).contains(&sample.height),
                "height {} at t={t}",
                sample.height
            );
            assert!(sample.synthetic);
        }
    }
}

/// Every mode renders one color per LED across extreme inputs without
/// panicking; the `u8` channels make range violations impossible, so this
/// guards the clamp path instead.
#[test]
fn every_mode_renders_full_frames_under_extreme_inputs() {
    let extremes = [
        EnvironmentSample {
            wind_speed: 200.0,
            temperature: 60.0,
            humidity: 100.0,
        },
        EnvironmentSample {
            wind_speed: -5.0,
            temperature: -40.0,
            humidity: 0.0,
        },
        EnvironmentSample {
            wind_speed: f32::NAN,
            temperature: f32::INFINITY,
            humidity: f32::NAN,
        },
    ];
    for mode in AnimationMode::ALL {
        let config = config_for(mode, 30);
        let mut engine = Engine::new(&config);
        engine.replace_keyframes(vec![
            Keyframe::new(0.0, 0.0).with_color(Rgb::new(255, 255, 255)),
            Keyframe::new(12.0, 100.0).with_color(Rgb::new(255, 255, 255)),
        ]);
        for env in &extremes {
            for step in 0..20 {
                let time = FrameTime::new(step as f32 * 1.3, step as f32 * 0.37);
                assert_eq!(engine.tick(&config, time, env).len(), 30, "{mode:?}");
            }
        }
    }
}

/// Brightness 0 turns everything off; night mode dims inside its window only.
#[test]
fn brightness_and_night_window_scale_output() {
    let mut config = config_for(AnimationMode::StaticFill, 5);
    let mut engine = Engine::new(&config);
    engine.replace_keyframes(vec![
        Keyframe::new(0.0, 50.0).with_color(Rgb::new(200, 100, 50)),
        Keyframe::new(24.0, 50.0).with_color(Rgb::new(200, 100, 50)),
    ]);
    let env = EnvironmentSample::default();

    let day = engine.tick(&config, FrameTime::at_hours(12.0), &env)[0];
    assert_eq!(day, Rgb::new(200, 100, 50));

    config.render.night.enabled = true;
    config.render.night.factor = 0.5;
    let night = engine.tick(&config, FrameTime::at_hours(23.0), &env)[0];
    assert_eq!(night, Rgb::new(100, 50, 25));
    let noon = engine.tick(&config, FrameTime::at_hours(12.0), &env)[0];
    assert_eq!(noon, day);

    config.render.brightness = 0;
    let off = engine.tick(&config, FrameTime::at_hours(12.0), &env);
    assert!(off.iter().all(|px| *px == Rgb::default()));
}

/// The documented parameters keep the surface bounded over a long run.
#[test]
fn fluid_stays_bounded_for_ten_thousand_steps() {
    let params = FluidParams {
        tension: 0.025,
        damping: 0.02,
        spread: 0.1,
    };
    let mut fluid = FluidSimulator::new(144);
    for _ in 0..10_000 {
        fluid.update(0.5, &params);
    }
    assert!(fluid.peak() < 2.0, "peak {}", fluid.peak());
}

/// A 16-wide serpentine panel maps every index to a unique cell and back.
#[test]
fn serpentine_panel_round_trips_every_index() {
    let mapper = TopologyMapper::new(Topology::matrix(16, 16, true), 256);
    for index in 0..256 {
        let at = mapper.locate(index);
        assert_eq!(mapper.index(at.x as usize, at.y as usize), Some(index));
    }
}

/// Day `d` of the projection is the base day shifted by `d * 24.84` hours.
#[test]
fn week_projection_drifts_with_the_moon() {
    let base = reference_day();
    let week = project_week(&base);
    assert_eq!(week.len(), base.len() * 7);
    assert!(week
        .windows(2)
        .all(|w| w[0].time_offset <= w[1].time_offset));

    for day in 0..7 {
        let shift = day as f32 * (24.0 + LUNAR_DAILY_DRIFT_HOURS);
        for keyframe in &base {
            let expected = keyframe.time_offset + shift;
            assert!(
                week.iter().any(|k| (k.time_offset - expected).abs() < 1e-3
                    && k.height == keyframe.height),
                "missing day {day} keyframe at {expected}"
            );
        }
    }
}

/// The render-task path (shared snapshot) matches the single-task path.
#[test]
fn shared_snapshot_renders_like_a_direct_tick() {
    let config = config_for(AnimationMode::StripBasic, 20);
    let env = EnvironmentSample::default();
    let time = FrameTime::at_hours(9.0);

    let mut direct = Engine::new(&config);
    direct.replace_keyframes(reference_day());
    let expected = direct.tick(&config, time, &env).to_vec();

    let shared = SharedTide::new(&direct.sample(&config, time));
    let mut render = Engine::new(&config);
    let frame = render.render_sample(&config, &shared.snapshot(), time, &env);
    assert_eq!(frame, expected.as_slice());
}

/// A keyframe file written by the data side drives the engine.
#[test]
fn keyframe_file_feeds_the_engine() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut file = TideFile::new(CycleConfig::WEEKLY, project_week(&reference_day()));
    file.environment = Some(EnvironmentSample {
        wind_speed: 3.0,
        temperature: 18.0,
        humidity: 55.0,
    });
    tide_data::save(temp_file.path(), &file).unwrap();

    let (loaded, synthetic) = tide_data::load_or_approximate(temp_file.path(), &Utc::now());
    assert!(!synthetic);

    let mut config = config_for(AnimationMode::Thermal, 12);
    config.cycle = loaded.cycle();
    let env = loaded.environment.unwrap_or(config.environment);
    let mut engine = Engine::new(&config);
    engine.replace_keyframes(loaded.keyframes);

    // Day 2 starts 2 * 24.84 h into the week
    let day_two = 2.0 * (24.0 + LUNAR_DAILY_DRIFT_HOURS);
    let sample = engine.sample(&config, FrameTime::at_hours(day_two + 3.0));
    assert_relative_eq!(sample.height, 50.0, epsilon = 1e-3);
    assert_eq!(engine.tick(&config, FrameTime::at_hours(day_two), &env).len(), 12);
}

/// Synthetic keyframes are rebuilt once the local date changes and left
/// alone within the same day.
#[test]
fn synthetic_day_rolls_over_at_local_midnight() {
    let zone = FixedOffset::east_opt(-7 * 3600).unwrap();
    let evening = zone.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
    let mut day = evening.date_naive();
    let mut interpolator = TideInterpolator::default();
    interpolator.replace_keyframes(fallback::approximate(&evening));
    let yesterday = interpolator.store().keyframes().to_vec();

    let later = zone.with_ymd_and_hms(2025, 3, 10, 23, 59, 59).unwrap();
    assert!(!roll_synthetic_day(&mut interpolator, &mut day, &later));
    assert_eq!(interpolator.store().keyframes(), yesterday.as_slice());

    let after_midnight = zone.with_ymd_and_hms(2025, 3, 11, 0, 0, 5).unwrap();
    assert!(roll_synthetic_day(&mut interpolator, &mut day, &after_midnight));
    assert_eq!(day, after_midnight.date_naive());
    assert_eq!(
        interpolator.store().keyframes(),
        fallback::approximate(&after_midnight).as_slice()
    );
    assert_ne!(interpolator.store().keyframes(), yesterday.as_slice());
}
