//! # Tide Light Application Entry Point
//!
//! Runs the engine against the keyframe interchange file and the local clock.
//!
//! - `--stdout` renders a single frame to the terminal and exits (development
//!   mode, no hardware needed).
//! - Otherwise the two-task reference design runs until Ctrl-C: a data task
//!   reloads keyframes and publishes the current tide and environment through
//!   relaxed atomics, and a render task ticks the engine at the configured
//!   frame rate.
//!
//! `--config PATH` selects the TOML configuration (default `tidelight.toml`).

#[cfg(test)]
mod tests;

use std::{
    env,
    path::PathBuf,
    sync::Arc,
    time::{Instant, SystemTime},
};

use anyhow::{bail, Context};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use tidelight::{
    config::{Config, CONFIG_FILE},
    fallback,
    interpolator::TideInterpolator,
    keyframes::CycleConfig,
    lunar,
    output::{OutputSink, TerminalSink},
    shared::{SharedEnvironment, SharedTide},
    telemetry,
    tide_data,
    topology::TopologyMapper,
    Engine, EnvironmentSample, FrameTime,
};

/// Fluid steps run before a one-shot frame so the surface has settled.
const SETTLE_TICKS: usize = 300;
/// How often the data task republishes the tide sample.
const PUBLISH_INTERVAL: Duration = Duration::from_secs(1);
/// How often the render task recomputes the moon phase.
const MOON_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, PartialEq)]
struct Args {
    stdout: bool,
    config: PathBuf,
}

fn parse_args<I>(args: I) -> anyhow::Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        stdout: false,
        config: PathBuf::from(CONFIG_FILE),
    };
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => parsed.stdout = true,
            "--config" => {
                parsed.config = args
                    .next()
                    .map(PathBuf::from)
                    .context("--config needs a path")?;
            }
            other => bail!("unknown argument `{other}` (usage: tidelight [--stdout] [--config PATH])"),
        }
    }
    Ok(parsed)
}

/// Hour of the local day; the render path only needs it for the night window.
fn hour_of_day() -> f32 {
    CycleConfig::DAILY.position_of(&Local::now())
}

/// Render one frame for "now" and print it.
fn render_once(config: &Config) -> anyhow::Result<()> {
    let (file, synthetic) =
        tide_data::load_or_approximate(&config.data.keyframes_path, &Local::now());
    let mut config = config.clone();
    config.cycle = file.cycle();
    let env = file.environment.unwrap_or(config.environment);

    let mut engine = Engine::new(&config);
    engine.replace_keyframes(file.keyframes);
    engine.set_moon_phase(lunar::moon_phase(Utc::now()));

    let hours = config.cycle.position_of(&Local::now());
    let settle = if config.render.mode.uses_fluid() {
        SETTLE_TICKS
    } else {
        1
    };
    let dt = 1.0 / config.render.fps as f32;
    for step in 0..settle {
        engine.tick(&config, FrameTime::new(hours, step as f32 * dt), &env);
    }

    if synthetic {
        println!("⚠ OFFLINE\n");
    }
    let mapper = TopologyMapper::new(config.device.topology(), engine.frame().len());
    TerminalSink::stdout()
        .write(engine.frame(), &mapper)
        .context("writing frame to stdout")?;
    Ok(())
}

/// Regenerate the synthetic day once the local date moves past `day`.
/// Returns true when the keyframes were replaced.
fn roll_synthetic_day<Tz: TimeZone>(
    interpolator: &mut TideInterpolator,
    day: &mut NaiveDate,
    now: &DateTime<Tz>,
) -> bool {
    let today = now.date_naive();
    if today == *day {
        return false;
    }
    *day = today;
    interpolator.replace_keyframes(fallback::approximate(now));
    true
}

/// Keyframe owner: reloads the interchange file when it changes and
/// publishes the sample for the current cycle position.
///
/// `synthetic_day` is the local date the synthetic keyframes were built
/// for, or `None` when they came from the file. Synthetic data is rebuilt
/// after midnight until a file shows up.
async fn data_task(
    config: Arc<Config>,
    tide: Arc<SharedTide>,
    environment: Arc<SharedEnvironment>,
    mut interpolator: TideInterpolator,
    mut cycle: CycleConfig,
    mut synthetic_day: Option<NaiveDate>,
) {
    let path = &config.data.keyframes_path;
    let refresh = Duration::from_secs(config.data.refresh_secs);
    let mut last_modified: Option<SystemTime> = tide_data::modified(path).ok();
    let mut last_check = Instant::now();

    let mut ticker = time::interval(PUBLISH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;

        if last_check.elapsed() >= refresh {
            last_check = Instant::now();
            match tide_data::modified(path) {
                Ok(stamp) if Some(stamp) != last_modified => match tide_data::load(path) {
                    Ok(file) => {
                        info!(keyframes = file.keyframes.len(), "keyframe file changed, swapping");
                        last_modified = Some(stamp);
                        synthetic_day = None;
                        cycle = file.cycle();
                        environment.publish(&file.environment.unwrap_or(config.environment));
                        interpolator.replace_keyframes(file.keyframes);
                    }
                    Err(err) => warn!(%err, "keeping previous keyframes"),
                },
                Ok(_) => debug!("keyframe file unchanged"),
                Err(err) => debug!(%err, "keyframe file unavailable"),
            }
        }

        let now = Local::now();
        if let Some(day) = synthetic_day.as_mut() {
            if roll_synthetic_day(&mut interpolator, day, &now) {
                info!(day = %day, "rebuilt synthetic keyframes for the new day");
                cycle = CycleConfig::DAILY;
            }
        }

        let sample = interpolator.sample(&cycle, cycle.position_of(&now));
        tide.publish(&sample);
    }
}

/// Frame loop: snapshot the shared scalars and render at the configured rate.
async fn render_task(
    config: Arc<Config>,
    tide: Arc<SharedTide>,
    environment: Arc<SharedEnvironment>,
) {
    let mut engine = Engine::new(&config);
    engine.set_moon_phase(lunar::moon_phase(Utc::now()));
    let mapper = TopologyMapper::new(config.device.topology(), config.device.led_count);
    let mut sink = TerminalSink::stdout();

    let started = Instant::now();
    let mut last_moon = Instant::now();
    let mut ticker = time::interval(Duration::from_secs_f32(1.0 / config.render.fps as f32));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;

        if last_moon.elapsed() >= MOON_INTERVAL {
            last_moon = Instant::now();
            engine.set_moon_phase(lunar::moon_phase(Utc::now()));
        }

        let time = FrameTime::new(hour_of_day(), started.elapsed().as_secs_f32());
        let frame = engine.render_sample(&config, &tide.snapshot(), time, &environment.snapshot());

        // Redraw in place
        print!("\x1b[H");
        if let Err(err) = sink.write(frame, &mapper) {
            warn!(%err, "frame write failed");
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    if let Err(err) = telemetry::init_tracing() {
        eprintln!("logging disabled: {err}");
    }

    let args = parse_args(env::args().skip(1))?;
    let config = Config::load_from_path(&args.config);

    // Development mode: one frame to the terminal
    if args.stdout {
        return render_once(&config);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let now = Local::now();
        let (file, synthetic) = tide_data::load_or_approximate(&config.data.keyframes_path, &now);
        let cycle = file.cycle();
        let interpolator = {
            let mut interpolator = TideInterpolator::default();
            interpolator.replace_keyframes(file.keyframes);
            interpolator
        };
        let env: EnvironmentSample = file.environment.unwrap_or(config.environment);

        let tide = Arc::new(SharedTide::new(
            &interpolator.sample(&cycle, cycle.position_of(&now)),
        ));
        let environment = Arc::new(SharedEnvironment::new(&env));
        let config = Arc::new(config);

        info!(
            leds = config.device.led_count,
            mode = config.render.mode.as_str(),
            fps = config.render.fps,
            synthetic,
            "starting render loop"
        );

        let data = tokio::spawn(data_task(
            Arc::clone(&config),
            Arc::clone(&tide),
            Arc::clone(&environment),
            interpolator,
            cycle,
            synthetic.then(|| now.date_naive()),
        ));
        let render = tokio::spawn(render_task(config, tide, environment));

        tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?;
        info!("shutting down");
        data.abort();
        render.abort();
        print!("\x1b[0m");
        Ok::<(), anyhow::Error>(())
    })
}
