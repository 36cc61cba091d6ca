//! # Animation Modes
//!
//! Every mode is a pure function from one pixel's inputs to an unclamped
//! [`Color`]. Modes share no mutable state and never see the output buffer, so
//! a frame is computed in a single pass with no feedback between pixels.
//!
//! After the mode runs, each pixel goes through the same post-processing in a
//! fixed order:
//! 1. night dimming, when `hours mod 24` falls inside the night window
//! 2. global brightness × tide intensity
//! 3. clamp to the 8-bit output range
//!
//! Only step 3 produces output pixels, so every mode yields valid colors.

use core::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{
    color::{hue_to_color, Color, Rgb},
    fluid::FluidSimulator,
    interpolator::TideSample,
    keyframes::Effect,
    lunar::MoonPhase,
    topology::TopologyMapper,
    EnvironmentSample, FrameTime,
};

const MODE_NAME_FLUID_PHYSICS: &str = "fluid_physics";
const MODE_NAME_THERMAL: &str = "thermal";
const MODE_NAME_MOON_PHASE: &str = "moon_phase";
const MODE_NAME_STRIP_BASIC: &str = "strip_basic";
const MODE_NAME_BIO: &str = "bio";
const MODE_NAME_STORM: &str = "storm";
const MODE_NAME_STATIC_FILL: &str = "static_fill";

/// Wind speed (m/s) treated as a full gale.
pub const GALE_WIND_SPEED: f32 = 20.0;

/// Pixel-coloring strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Water column driven by the fluid simulator
    #[default]
    #[serde(alias = "fluidPhysics")]
    FluidPhysics,
    /// Water colored by air temperature
    Thermal,
    /// Moon illumination mask above the water line
    #[serde(alias = "moonPhase")]
    MoonPhase,
    /// Plain tide bar with the keyframe's effect
    #[serde(alias = "stripBasic")]
    StripBasic,
    /// Dark water with bioluminescent sparkles
    Bio,
    /// Wind-whipped surface with lightning
    Storm,
    /// Every pixel in the tide color
    #[serde(alias = "staticFill")]
    StaticFill,
}

impl AnimationMode {
    pub const ALL: [AnimationMode; 7] = [
        Self::FluidPhysics,
        Self::Thermal,
        Self::MoonPhase,
        Self::StripBasic,
        Self::Bio,
        Self::Storm,
        Self::StaticFill,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FluidPhysics => MODE_NAME_FLUID_PHYSICS,
            Self::Thermal => MODE_NAME_THERMAL,
            Self::MoonPhase => MODE_NAME_MOON_PHASE,
            Self::StripBasic => MODE_NAME_STRIP_BASIC,
            Self::Bio => MODE_NAME_BIO,
            Self::Storm => MODE_NAME_STORM,
            Self::StaticFill => MODE_NAME_STATIC_FILL,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            MODE_NAME_FLUID_PHYSICS | "fluidPhysics" => Some(Self::FluidPhysics),
            MODE_NAME_THERMAL => Some(Self::Thermal),
            MODE_NAME_MOON_PHASE | "moonPhase" => Some(Self::MoonPhase),
            MODE_NAME_STRIP_BASIC | "stripBasic" => Some(Self::StripBasic),
            MODE_NAME_BIO => Some(Self::Bio),
            MODE_NAME_STORM => Some(Self::Storm),
            MODE_NAME_STATIC_FILL | "staticFill" => Some(Self::StaticFill),
            _ => None,
        }
    }

    /// Whether the engine must step the fluid simulator for this mode.
    pub const fn uses_fluid(self) -> bool {
        matches!(self, Self::FluidPhysics)
    }
}

/// Hours during which output is dimmed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightMode {
    pub enabled: bool,
    /// Window start, hour of day
    pub start_hour: f32,
    /// Window end (exclusive), hour of day; may be before `start_hour`
    pub end_hour: f32,
    /// Brightness multiplier inside the window, 0–1
    pub factor: f32,
}

impl NightMode {
    /// Whether `hours mod 24` lies inside the window. An empty window
    /// (`start == end`) never matches.
    pub fn contains(&self, hours: f32) -> bool {
        if !self.enabled || !hours.is_finite() {
            return false;
        }
        let hour = hours.rem_euclid(24.0);
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn gain(&self, hours: f32) -> f32 {
        if self.contains(hours) {
            self.factor.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

impl Default for NightMode {
    fn default() -> Self {
        Self {
            enabled: false,
            start_hour: 22.0,
            end_hour: 6.0,
            factor: 0.3,
        }
    }
}

/// Post-processing shared by all modes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub brightness: u8,
    pub night: NightMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            brightness: 255,
            night: NightMode::default(),
        }
    }
}

/// Everything a mode may read for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub tide: &'a TideSample,
    pub env: &'a EnvironmentSample,
    pub time: FrameTime,
    pub moon: MoonPhase,
    pub fluid: Option<&'a FluidSimulator>,
}

/// Per-pixel inputs derived from the topology.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelInput {
    pub index: usize,
    pub count: usize,
    /// 0 at the bottom of the layout, 1 at the top
    pub vertical: f32,
    /// 0 at the left of the layout, 1 at the right
    pub horizontal: f32,
    /// Vertical size of one LED as a fraction of the layout
    pub pitch: f32,
}

/// Render one frame into `out`, one color per LED.
pub fn render(
    mode: AnimationMode,
    scene: &Scene<'_>,
    mapper: &TopologyMapper,
    settings: &RenderSettings,
    out: &mut [Rgb],
) {
    let count = out.len();
    let (_, extent_height) = mapper.extent();
    let pitch = if extent_height > 0.0 {
        1.0 / extent_height
    } else {
        1.0
    };

    let night = settings.night.gain(scene.time.hours);
    let global = f32::from(settings.brightness) / 255.0 * f32::from(scene.tide.intensity) / 255.0;

    for (index, pixel) in out.iter_mut().enumerate() {
        let input = PixelInput {
            index,
            count,
            vertical: mapper.vertical(index),
            horizontal: mapper.horizontal(index),
            pitch,
        };
        *pixel = shade(mode, scene, &input).scale(night).scale(global).to_rgb();
    }
}

/// Base color of one pixel before post-processing.
pub fn shade(mode: AnimationMode, scene: &Scene<'_>, px: &PixelInput) -> Color {
    match mode {
        AnimationMode::FluidPhysics => fluid_physics(scene, px),
        AnimationMode::Thermal => thermal(scene, px),
        AnimationMode::MoonPhase => moon_phase(scene, px),
        AnimationMode::StripBasic => strip_basic(scene, px),
        AnimationMode::Bio => bio(scene, px),
        AnimationMode::Storm => storm(scene, px),
        AnimationMode::StaticFill => Color::from_rgb(scene.tide.color),
    }
}

/// Fraction of an LED below the water line, anti-aliased over one pitch.
/// Level 0 leaves every LED dry and level 1 submerges all of them.
fn coverage(level: f32, px: &PixelInput) -> f32 {
    ((level * (1.0 + px.pitch) - px.vertical) / px.pitch).clamp(0.0, 1.0)
}

fn strip_basic(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let base = Color::from_rgb(scene.tide.color);
    let level = scene.tide.level();
    let wet = coverage(level, px);
    let secs = scene.time.seconds;

    match scene.tide.effect {
        Effect::Static => base.scale(wet),
        Effect::Wave => {
            let ripple = 0.75 + 0.25 * (TAU * (px.vertical * 3.0 - secs * 0.25)).sin();
            base.scale(wet * ripple)
        }
        Effect::Pulse => {
            let breath = 0.6 + 0.4 * (0.5 + 0.5 * (TAU * secs / 4.0).sin());
            base.scale(wet * breath)
        }
        Effect::Glow => {
            let distance = (px.vertical - level).abs();
            let halo = (-distance * 8.0).exp();
            base.scale(0.5 * wet + 0.5 * halo)
        }
    }
}

fn fluid_physics(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let base = Color::from_rgb(scene.tide.color);
    let Some(fluid) = scene.fluid.filter(|f| !f.is_empty()) else {
        return base.scale(coverage(scene.tide.level(), px));
    };

    let node = (px.vertical * (fluid.len() - 1) as f32).round() as usize;
    let fill = fluid.node_height(node).clamp(0.0, 1.0);

    let depth_tint = base.scale(0.35).lerp(base, px.vertical);
    // Foam peaks where the surface is half-filled
    let foam = (1.0 - (fill - 0.5).abs() * 2.0).max(0.0) * 0.5;
    depth_tint.scale(fill).add(Color::WHITE.scale(foam * 0.4))
}

fn thermal(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let warmth = ((scene.env.temperature + 10.0) / 50.0).clamp(0.0, 1.0);
    // Blue (240°) when cold, red (0°) when hot; surface water slightly warmer
    let hue = (240.0 * (1.0 - warmth) - 30.0 * px.vertical).max(0.0);
    let wet = coverage(scene.tide.level(), px);
    hue_to_color(hue, 1.0).scale(0.15 + 0.85 * wet)
}

const MOONLIGHT: Color = Color::new(220.0, 225.0, 255.0);

fn moon_phase(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let wet = coverage(scene.tide.level(), px);
    let water = Color::from_rgb(scene.tide.color).scale(0.4);

    let lit_fraction = scene.moon.illumination() as f32;
    // Waxing moons are lit from the right, waning from the left
    let lit = lit_fraction > 0.0
        && if scene.moon.is_waxing() {
            px.horizontal >= 1.0 - lit_fraction
        } else {
            px.horizontal <= lit_fraction
        };
    let sky = if lit { MOONLIGHT } else { Color::BLACK };

    water.scale(wet).add(sky.scale(1.0 - wet))
}

const BIO_WATER: Color = Color::new(0.0, 10.0, 30.0);
const BIO_GLOW: Color = Color::new(0.0, 255.0, 180.0);

fn bio(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let wet = coverage(scene.tide.level(), px);
    if wet <= 0.0 {
        return Color::BLACK;
    }

    let beat = scene.time.seconds * 4.0;
    let slot = beat.floor().max(0.0) as u32;
    let density = 0.04 + 0.08 * (scene.env.humidity / 100.0).clamp(0.0, 1.0);

    let mut color = BIO_WATER;
    if hash01(px.index as u32, slot) < density {
        // Triangle fade over the slot
        let phase = beat - beat.floor();
        let envelope = 1.0 - (phase * 2.0 - 1.0).abs();
        let strength = 0.5 + 0.5 * hash01(slot, px.index as u32 ^ 0x9e37);
        color = color.add(BIO_GLOW.scale(envelope * strength));
    }
    color.scale(wet)
}

const STORM_GREY: Color = Color::new(90.0, 100.0, 110.0);

fn storm(scene: &Scene<'_>, px: &PixelInput) -> Color {
    let gust = (scene.env.wind_speed / GALE_WIND_SPEED).clamp(0.0, 1.0);
    let secs = scene.time.seconds;

    let chop = (TAU * (px.horizontal * 2.0 + secs * 0.7)).sin() * 0.1 * gust;
    let wet = coverage(scene.tide.level() + chop, px);
    let water = Color::from_rgb(scene.tide.color).lerp(STORM_GREY, 0.6);

    // Same hash for every pixel: the whole frame flashes together
    let flash_slot = (secs * 3.0).floor().max(0.0) as u32;
    let flash = if hash01(flash_slot, 7) < 0.02 * gust {
        Color::WHITE.scale(0.8)
    } else {
        Color::BLACK
    };

    water.scale(0.2 + 0.8 * wet).add(flash)
}

/// Integer hash to `[0, 1)`, identical on every target.
fn hash01(a: u32, b: u32) -> f32 {
    let mut h = a.wrapping_mul(0x9E37_79B1) ^ b.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}
