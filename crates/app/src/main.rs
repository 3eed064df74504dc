use std::{cell::Cell, path::PathBuf, rc::Rc, time::Duration};

use anim_chain_core::{
    AnimConfig, AnimContext, AnimError, Ease, Layer, LayoutRoot, Pacing, RunLoop,
    SettingsConfig,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> anim_chain_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AnimConfig::load(path)?,
        None => AnimConfig::default(),
    };

    match cli.command {
        Commands::Particle { count } => {
            let context = build_context(&config, cli.realtime)?;
            run_particle(&context, count, cli.sample_ms)
        }
        Commands::CircleMenu { interrupt_ms } => {
            let context = build_context(&config, cli.realtime)?;
            run_circle_menu(&context, interrupt_ms, cli.sample_ms)
        }
        Commands::Sequence {
            ease,
            delay,
            duration,
            steps,
        } => {
            let context = build_context(&config, cli.realtime)?;
            let ease: Ease = ease.parse()?;
            run_sequence(&context, ease, delay, duration, steps, cli.sample_ms)
        }
        Commands::Eases => {
            list_eases();
            Ok(())
        }
        Commands::DumpConfig { output } => dump_config(&config, output.as_ref()),
    }
}

fn build_context(config: &AnimConfig, realtime: bool) -> anim_chain_core::Result<AnimContext> {
    let pacing = if realtime {
        Pacing::RealTime
    } else {
        Pacing::Virtual
    };
    let context = AnimContext::from_config(config, RunLoop::with_pacing(pacing))?;
    tracing::debug!(?context, "animation context ready");
    Ok(context)
}

/// Particles drift up and fade in, then fade out, staggered by index.
fn run_particle(context: &AnimContext, count: usize, sample_ms: u64) -> anim_chain_core::Result<()> {
    if count == 0 {
        return Err(AnimError::msg("particle demo needs at least one particle"));
    }
    tracing::info!(count, "starting particle demo");

    for index in 0..count {
        let particle = context.scene().layer(format!("particle{index}"));
        particle.set("y", 0.0);
        particle.set("alpha", 0.0);

        let rise = particle.clone();
        let fade = particle.clone();
        let stagger = Duration::from_millis(150 * index as u64);
        context
            .anim_with(move |s| {
                s.delay = stagger;
                s.duration = Duration::from_millis(600);
                s.ease = Ease::EASE_OUT_CUBIC;
                s.user_interaction = true;
                move || {
                    rise.set("y", -120.0);
                    rise.set("alpha", 1.0);
                }
            })
            .then_with(move |s| {
                s.duration = Duration::from_millis(400);
                s.ease = Ease::EASE_IN_SINE;
                s.user_interaction = true;
                move || fade.set("alpha", 0.0)
            })
            .callback(move || tracing::info!(particle = index, "particle finished"));
    }

    drive(context, sample_ms);
    Ok(())
}

/// Layout engine for the circle menu: one anchor constant places every button.
struct AnchorLayout {
    anchor: Cell<f64>,
    buttons: Vec<Layer>,
}

impl LayoutRoot for AnchorLayout {
    fn layout_if_needed(&self) {
        let anchor = self.anchor.get();
        for (index, button) in self.buttons.iter().enumerate() {
            button.set("y", anchor * (index + 1) as f64);
        }
    }
}

/// Opens a menu through constraint animation, then stops it part way.
fn run_circle_menu(
    context: &AnimContext,
    interrupt_ms: Option<u64>,
    sample_ms: u64,
) -> anim_chain_core::Result<()> {
    tracing::info!(?interrupt_ms, "starting circle menu demo");

    let layout = Rc::new(AnchorLayout {
        anchor: Cell::new(0.0),
        buttons: (0..3)
            .map(|index| context.scene().layer(format!("button{index}")))
            .collect(),
    });
    layout.layout_if_needed();

    let (open, close) = (layout.clone(), layout.clone());
    let menu = context
        .anim_layout_with(layout.clone(), move |s| {
            s.duration = Duration::from_millis(500);
            s.ease = Ease::EASE_OUT_BACK;
            move || open.anchor.set(60.0)
        })
        .wait(Duration::from_millis(300))
        .then_layout_with(layout, move |s| {
            s.duration = Duration::from_millis(400);
            s.ease = Ease::EASE_IN_OUT_QUAD;
            move || close.anchor.set(0.0)
        });

    if let Some(interrupt_ms) = interrupt_ms {
        let run_loop = context.run_loop();
        let until = run_loop.now() + Duration::from_millis(interrupt_ms);
        while run_loop.now() < until && !run_loop.is_idle() {
            let step = Duration::from_millis(sample_ms).min(until - run_loop.now());
            run_loop.advance(step);
            log_snapshot(context);
        }
        menu.stop();
        tracing::info!(step = %menu, state = ?menu.state(), "menu interrupted");
    }

    drive(context, sample_ms);
    Ok(())
}

/// Chains `steps` moves of one box with the given curve and timings.
fn run_sequence(
    context: &AnimContext,
    ease: Ease,
    delay: f64,
    duration: f64,
    steps: usize,
    sample_ms: u64,
) -> anim_chain_core::Result<()> {
    if steps == 0 {
        return Err(AnimError::msg("sequence needs at least one step"));
    }
    let settings = SettingsConfig {
        delay,
        duration,
        ..SettingsConfig::from_settings(&context.default_settings())
    }
    .to_settings()?;
    context.set_default_settings(settings.with_ease(ease));
    tracing::info!(%ease, delay, duration, steps, "starting sequence demo");

    let target = context.scene().layer("box");
    target.set("x", 0.0);

    let first = target.clone();
    let mut tail = context.anim(move || first.set("x", 100.0));
    for index in 1..steps {
        let layer = target.clone();
        let x = if index % 2 == 0 { 100.0 } else { 0.0 };
        tail = tail.then(move || layer.set("x", x));
    }
    tail.callback(|| tracing::info!("sequence complete"));

    drive(context, sample_ms);
    Ok(())
}

fn list_eases() {
    for name in Ease::preset_names() {
        if let Ok(ease) = name.parse::<Ease>() {
            let [x1, y1, x2, y2] = ease.control_points();
            println!("{name:<18} ({x1}, {y1}, {x2}, {y2})");
        }
    }
}

fn dump_config(config: &AnimConfig, output: Option<&PathBuf>) -> anim_chain_core::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    match output {
        Some(path) => {
            tracing::info!(?path, "writing configuration");
            std::fs::write(path, json)?;
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Runs the loop to completion, logging the scene every `sample_ms`.
fn drive(context: &AnimContext, sample_ms: u64) {
    let run_loop = context.run_loop();
    let sample = Duration::from_millis(sample_ms.max(1));
    while !run_loop.is_idle() {
        run_loop.advance(sample);
        log_snapshot(context);
    }
    tracing::info!(elapsed = ?run_loop.now(), "all animations settled");
}

fn log_snapshot(context: &AnimContext) {
    let values = context
        .scene()
        .snapshot()
        .into_iter()
        .map(|(key, value)| format!("{key}={value:.1}"))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(t = ?context.run_loop().now(), "{values}");
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Chained animation playground", long_about = None)]
struct Cli {
    /// JSON file with default settings and frame rate.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Interval between logged scene snapshots, in milliseconds.
    #[arg(long, default_value_t = 100, global = true)]
    sample_ms: u64,
    /// Sleep through delays instead of skipping ahead.
    #[arg(long, global = true)]
    realtime: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Staggered particles that rise, fade in and fade out.
    Particle {
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,
    },
    /// Constraint-driven menu that opens, waits and closes.
    CircleMenu {
        /// Stop the menu chain after this many milliseconds.
        #[arg(long)]
        interrupt_ms: Option<u64>,
    },
    /// Back-and-forth moves of a single box.
    Sequence {
        /// Preset name such as `easeInOutCubic`, or `linear`.
        #[arg(short, long, default_value = "easeOutQuint")]
        ease: String,
        /// Delay before each move, in seconds.
        #[arg(long, default_value_t = 0.0)]
        delay: f64,
        /// Duration of each move, in seconds.
        #[arg(long, default_value_t = 0.5)]
        duration: f64,
        #[arg(long, default_value_t = 4)]
        steps: usize,
    },
    /// List the built-in easing presets.
    Eases,
    /// Print the effective configuration as JSON.
    DumpConfig {
        /// Write to this file instead of stdout.
        output: Option<PathBuf>,
    },
}
