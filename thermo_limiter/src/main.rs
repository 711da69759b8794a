//! # Thermo Limiter
//!
//! Loads the limiter configuration and joint model, performs RT setup and
//! runs the thermal limiting cycle against simulated motors until Ctrl-C
//! or the requested number of cycles.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thermo_common::config::LogLevel;
use thermo_common::consts::{DEBUG_TRACE_INTERVAL, DEFAULT_CONFIG_PATH};
use thermo_limiter::alert::BeepAlert;
use thermo_limiter::config::load_config;
use thermo_limiter::cycle::{CycleRunner, RtSetup};
use thermo_limiter::io::{LogSink, SimulatedMotors};
use thermo_limiter::service::ThermoLimiterService;
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Thermo Limiter: motor temperature based torque ceilings
#[derive(Parser, Debug)]
#[command(name = "thermo_limiter")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Per-joint torque ceilings from motor temperature")]
struct Args {
    /// Path to the limiter configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Constant torque load applied to every simulated motor [Nm].
    #[arg(long, default_value_t = 0.0)]
    sim_load: f64,

    /// CPU core to pin the RT thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn main() {
    let args = Args::parse();
    let filter = setup_tracing(&args);

    info!("Thermo Limiter v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &filter) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Thermo Limiter shutdown complete");
}

fn run(args: &Args, filter: &FilterHandle) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = load_config(&args.config)?;
    let config = &loaded.config;

    let env_override = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    if let Some(level) = configured_level(args.verbose, env_override, config.shared.log_level) {
        filter.reload(EnvFilter::new(level))?;
    }
    info!("service {} using log level {:?}", config.shared.service_name, config.shared.log_level);

    let source = SimulatedMotors::new(loaded.num_joints(), config.ambient_temperature, config.dt)
        .with_load(args.sim_load);
    let sink = LogSink::new(DEBUG_TRACE_INTERVAL);
    let mut runner = CycleRunner::new(&loaded, source, sink, BeepAlert::default())?;

    RtSetup::for_joints(loaded.num_joints(), args.cpu_core, args.rt_priority).apply()?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    runner.activate()?;
    let result = runner.run(&running, args.cycles);
    runner.deactivate()?;
    result?;

    let service = runner.service();
    for (id, joint) in loaded.topology.joints.iter().enumerate() {
        let Ok(id) = i32::try_from(id) else { break };
        info!(
            "{}: tauMax={:.3} error={}",
            joint.name,
            service.get_max_torque(id),
            service.is_max_temperature_error(id)
        );
    }
    Ok(())
}

/// Level directive taken from the config file, unless `--verbose` or
/// `RUST_LOG` already decide it.
fn configured_level(verbose: bool, env_override: bool, level: LogLevel) -> Option<&'static str> {
    (!verbose && !env_override).then(|| level.as_directive())
}

/// Setup tracing subscriber from CLI arguments.
///
/// The returned handle swaps in the configured level once the config is read.
fn setup_tracing(args: &Args) -> FilterHandle {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_directive()))
    };
    let (filter, handle) = reload::Layer::new(filter);
    let registry = tracing_subscriber::registry().with(filter);

    if args.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
    handle
}
