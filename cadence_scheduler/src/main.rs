//! # Cadence demo
//!
//! Runs the command scheduler against a small simulated mechanism: a
//! drivetrain and an intake, each with a default command, plus two buttons
//! whose presses are scripted against the tick counter.
//!
//! Subsystems come from the config file when it exists; otherwise the two
//! built-in ones are registered.

use std::cell::Cell;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cadence_scheduler::config::{apply_config, load_config};
use cadence_scheduler::command::basic as cmd;
use cadence_scheduler::prelude::*;
use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

const BUILTIN_CONFIG: &str = r#"
[shared]
service_name = "cadence-demo"

[[subsystems]]
name = "drivetrain"

[[subsystems]]
name = "intake"
"#;

/// Cadence: cooperative command scheduler demo
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Fixed-period command scheduler driving a simulated mechanism")]
struct Args {
    /// Path to the scheduler configuration TOML.
    #[arg(short, long, default_value = cadence_common::consts::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many ticks (0 = run until Ctrl-C).
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// CPU core to pin the loop thread to (`rt` builds only).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (`rt` builds only).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);
    let log_level = loaded
        .as_ref()
        .map_or_else(|_| LogLevel::default(), |config| config.shared.log_level);
    setup_tracing(&args, log_level);

    info!("Cadence v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Cadence shutdown complete");
}

fn run(
    args: &Args,
    loaded: Result<CadenceConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match loaded {
        Ok(config) => {
            info!("Loaded config from {}", args.config.display());
            config
        }
        Err(ConfigError::FileNotFound) => {
            warn!(
                "No config at '{}', using built-in subsystems",
                args.config.display()
            );
            builtin_config()?
        }
        Err(e) => return Err(e.into()),
    };

    let mut scheduler = CommandScheduler::new();
    let subsystems = apply_config(&mut scheduler, &config)?;
    let drivetrain = *subsystems
        .get("drivetrain")
        .ok_or("config must declare a 'drivetrain' subsystem")?;
    let intake = *subsystems
        .get("intake")
        .ok_or("config must declare an 'intake' subsystem")?;

    let buttons = Buttons::default();
    build_mechanism(&mut scheduler, drivetrain, intake, &buttons)?;

    RtPlacement {
        cpu_core: args.cpu_core,
        priority: args.rt_priority,
    }
    .apply()?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut runner = LoopRunner::new(&config.scheduler);
    if args.ticks > 0 {
        runner = runner.with_tick_limit(args.ticks);
    }
    info!(
        "Entering loop: period={:?}, ticks={}",
        runner.period(),
        args.ticks
    );
    runner.run(&mut scheduler, &running, |_, tick| buttons.script(tick))?;

    let stats = runner.stats();
    info!(
        "Loop stats: ticks={}, mean={:?}, slowest={:?}, overruns={}, worst_wake_latency={:?}",
        stats.ticks,
        stats.mean_tick(),
        stats.slowest_tick,
        stats.overruns,
        stats.worst_wake_latency
    );
    Ok(())
}

fn builtin_config() -> Result<CadenceConfig, ConfigError> {
    CadenceConfig::from_toml(BUILTIN_CONFIG)
}

/// Scripted operator inputs.
#[derive(Default, Clone)]
struct Buttons {
    intake: Rc<Cell<bool>>,
    auto: Rc<Cell<bool>>,
}

impl Buttons {
    /// Intake held for ticks 50..120 of every 250; auto toggled at 150 and 220.
    fn script(&self, tick: u64) {
        let phase = tick % 250;
        self.intake.set((50..120).contains(&phase));
        self.auto.set(phase == 150 || phase == 220);
    }
}

fn build_mechanism(
    scheduler: &mut CommandScheduler,
    drivetrain: SubsystemId,
    intake: SubsystemId,
    buttons: &Buttons,
) -> Result<(), Box<dyn std::error::Error>> {
    let speed = Rc::new(Cell::new(0.0_f64));
    let roller = Rc::new(Cell::new(false));

    let s = speed.clone();
    let hold = scheduler.register(
        cmd::run(move || s.set(s.get() * 0.9))
            .requiring(drivetrain)
            .named("CoastDrive"),
    );
    scheduler.set_default_command(drivetrain, hold)?;

    let r = roller.clone();
    let idle = scheduler.register(
        cmd::run(move || r.set(false))
            .requiring(intake)
            .named("IntakeIdle")
            .run_when_disabled(true),
    );
    scheduler.set_default_command(intake, idle)?;

    let r = roller.clone();
    let feed = scheduler.register(
        start_end(move || r.set(true), || {})
            .requiring(intake)
            .named("Feed")
            .with_timeout(Duration::from_secs(1)),
    );
    let pressed = buttons.intake.clone();
    scheduler.register_trigger(Trigger::new(move || pressed.get()).while_true(feed));

    let s = speed.clone();
    let drive_out = scheduler.register(
        cmd::run(move || s.set(0.6))
            .requiring(drivetrain)
            .named("DriveOut")
            .with_timeout(Duration::from_millis(1500)),
    );
    let announce = scheduler.register(PrintCommand::new("Auto routine complete"));
    let auto = scheduler.sequence(&[drive_out, announce])?;
    let auto = scheduler.decorate(auto, |c| c.with_name("Auto"))?;
    let toggled = buttons.auto.clone();
    scheduler.register_trigger(Trigger::new(move || toggled.get()).toggle_on_true(auto));

    let s = speed.clone();
    let drivetrain_periodic = move || {
        if s.get().abs() < 1e-3 {
            s.set(0.0);
        }
    };
    scheduler.set_periodic(drivetrain, drivetrain_periodic)?;

    info!(
        "Mechanism ready: {} subsystems, {} commands",
        scheduler.subsystem_count(),
        scheduler.command_count()
    );
    Ok(())
}

/// Setup tracing subscriber.
///
/// `--verbose` adds a DEBUG directive on top of `RUST_LOG`; otherwise
/// `RUST_LOG` wins when set and the configured `shared.log_level` applies
/// when it is not.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::default().add_directive(configured.as_tracing_level().into())
        })
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
