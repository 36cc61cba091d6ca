//! # Engine Facade
//!
//! [`Engine`] owns the mutable state of the pipeline (keyframes, fluid nodes,
//! disturbance RNG, moon phase and the output frame) and runs one tick at a
//! time. Configuration is *not* owned: every tick borrows the current
//! [`Config`], so edits made between ticks apply on the next one.
//!
//! There are two entry points:
//! - [`Engine::tick`] interpolates the tide itself (preview, single task).
//! - [`Engine::render_sample`] renders a [`TideSample`] that another task
//!   produced, e.g. a snapshot from [`crate::shared::SharedTide`].

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::{
    animation::{self, Scene, GALE_WIND_SPEED},
    color::Rgb,
    config::{Config, MAX_LEDS},
    fluid::FluidSimulator,
    interpolator::{TideInterpolator, TideSample},
    keyframes::{Keyframe, KeyframeStore},
    lunar::MoonPhase,
    topology::TopologyMapper,
    EnvironmentSample, FrameTime,
};

/// Chance per tick of a wind disturbance at gale force.
const GUST_PROBABILITY: f32 = 0.3;
/// Largest velocity kick a gale applies to one node.
const GUST_STRENGTH: f32 = 0.05;

pub struct Engine {
    interpolator: TideInterpolator,
    fluid: FluidSimulator,
    rng: StdRng,
    moon: MoonPhase,
    frame: Vec<Rgb>,
}

impl Engine {
    /// Engine with no keyframes (synthetic tide) sized for `config`.
    pub fn new(config: &Config) -> Self {
        let count = led_count(config);
        Self {
            interpolator: TideInterpolator::default(),
            fluid: FluidSimulator::new(count),
            rng: StdRng::seed_from_u64(config.render.seed),
            moon: MoonPhase::default(),
            frame: vec![Rgb::default(); count],
        }
    }

    /// Swap in a complete keyframe set.
    pub fn replace_keyframes(&mut self, keyframes: Vec<Keyframe>) {
        self.interpolator.replace_keyframes(keyframes);
        debug!(keyframes = self.interpolator.store().len(), "keyframes replaced");
    }

    pub fn keyframes(&self) -> &KeyframeStore {
        self.interpolator.store()
    }

    pub fn set_moon_phase(&mut self, moon: MoonPhase) {
        self.moon = moon;
    }

    pub fn moon_phase(&self) -> MoonPhase {
        self.moon
    }

    pub fn fluid(&self) -> &FluidSimulator {
        &self.fluid
    }

    /// Last rendered frame.
    pub fn frame(&self) -> &[Rgb] {
        &self.frame
    }

    /// Tide sample at `time.hours` under `config`'s cycle.
    pub fn sample(&self, config: &Config, time: FrameTime) -> TideSample {
        self.interpolator.sample(&config.cycle, time.hours)
    }

    /// Interpolate the tide and render one frame.
    pub fn tick(&mut self, config: &Config, time: FrameTime, env: &EnvironmentSample) -> &[Rgb] {
        let tide = self.sample(config, time);
        self.render_sample(config, &tide, time, env)
    }

    /// Render one frame from an already computed tide sample.
    pub fn render_sample(
        &mut self,
        config: &Config,
        tide: &TideSample,
        time: FrameTime,
        env: &EnvironmentSample,
    ) -> &[Rgb] {
        let count = led_count(config);
        if count != self.frame.len() {
            debug!(from = self.frame.len(), to = count, "LED count changed");
            self.frame.resize(count, Rgb::default());
        }

        let mode = config.render.mode;
        if mode.uses_fluid() {
            self.fluid.resize(count);
            self.stir(env.wind_speed);
            self.fluid.update(tide.level(), &config.fluid.clamped());
        }

        let mapper = TopologyMapper::new(config.device.topology(), count);
        let scene = Scene {
            tide,
            env,
            time,
            moon: self.moon,
            fluid: mode.uses_fluid().then_some(&self.fluid),
        };
        animation::render(
            mode,
            &scene,
            &mapper,
            &config.render.settings(),
            &mut self.frame,
        );
        &self.frame
    }

    /// Random velocity kick whose likelihood and size scale with wind speed.
    fn stir(&mut self, wind_speed: f32) {
        let gust = if wind_speed.is_finite() {
            (wind_speed / GALE_WIND_SPEED).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if gust <= 0.0 || self.fluid.is_empty() {
            return;
        }
        if self.rng.gen::<f32>() < gust * GUST_PROBABILITY {
            let index = self.rng.gen_range(0..self.fluid.len());
            let amount = self.rng.gen_range(-1.0f32..=1.0) * GUST_STRENGTH * gust;
            self.fluid.disturb(index, amount);
        }
    }
}

fn led_count(config: &Config) -> usize {
    config.device.led_count.clamp(1, MAX_LEDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{animation::AnimationMode, keyframes::Effect};

    fn still_air() -> EnvironmentSample {
        EnvironmentSample {
            wind_speed: 0.0,
            ..EnvironmentSample::default()
        }
    }

    fn fill_config(leds: usize) -> Config {
        let mut config = Config::default();
        config.device.led_count = leds;
        config.render.mode = AnimationMode::StaticFill;
        config.render.brightness = 255;
        config
    }

    #[test]
    fn test_config_change_applies_on_next_tick() {
        let mut config = fill_config(10);
        let mut engine = Engine::new(&config);
        engine.replace_keyframes(vec![
            Keyframe::new(0.0, 50.0).with_color(Rgb::new(0, 0, 200)),
            Keyframe::new(24.0, 50.0).with_color(Rgb::new(0, 0, 200)),
        ]);

        let time = FrameTime::at_hours(3.0);
        assert_eq!(engine.tick(&config, time, &still_air())[0], Rgb::new(0, 0, 200));

        config.render.brightness = 0;
        config.device.led_count = 4;
        let frame = engine.tick(&config, time, &still_air());
        assert_eq!(frame.len(), 4);
        assert!(frame.iter().all(|px| *px == Rgb::default()));
    }

    #[test]
    fn test_zero_led_count_renders_one_pixel() {
        let config = fill_config(0);
        let mut engine = Engine::new(&config);
        assert_eq!(engine.tick(&config, FrameTime::default(), &still_air()).len(), 1);
    }

    #[test]
    fn test_resize_resets_fluid() {
        let mut config = Config::default();
        config.device.led_count = 8;
        let mut engine = Engine::new(&config);
        for step in 0..50 {
            engine.tick(&config, FrameTime::new(0.0, step as f32), &still_air());
        }
        assert!(engine.fluid().peak() > 0.0);

        config.device.led_count = 12;
        engine.render_sample(
            &config,
            &TideSample {
                height: 0.0,
                color: Rgb::default(),
                intensity: 255,
                effect: Effect::Static,
                synthetic: false,
            },
            FrameTime::default(),
            &still_air(),
        );
        assert_eq!(engine.fluid().len(), 12);
        assert!(engine.fluid().nodes().iter().all(|n| n.velocity.abs() < 1e-6));
    }

    #[test]
    fn test_non_fluid_modes_leave_fluid_idle() {
        let config = fill_config(6);
        let mut engine = Engine::new(&config);
        engine.tick(&config, FrameTime::at_hours(5.0), &still_air());
        assert_eq!(engine.fluid().peak(), 0.0);
    }

    #[test]
    fn test_same_seed_renders_same_frames_in_a_gale() {
        let config = Config::default();
        let gale = EnvironmentSample {
            wind_speed: 25.0,
            ..EnvironmentSample::default()
        };
        let mut a = Engine::new(&config);
        let mut b = Engine::new(&config);
        for step in 0..200 {
            let time = FrameTime::new(6.0, step as f32 / 30.0);
            let frame_a = a.tick(&config, time, &gale).to_vec();
            assert_eq!(frame_a, b.tick(&config, time, &gale));
        }
        assert!(a.fluid().peak() < 2.0);
    }
}
