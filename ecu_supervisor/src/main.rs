//! # ECU Supervisor
//!
//! The Management Task collaborator: the operator CLI, the
//! hardware-watchdog feed, and the fuel-pump duty cycler. A thin,
//! non-core binary — it exists only to drive
//! [`ecu_control::task::EngineTask`] end to end against the simulation
//! backend, since this workspace has no real MCU target.
//!
//! Usage: `ecu_supervisor [path/to/ecu.toml]`. Falls back to
//! [`EcuConfig::default`] if no path is given.

mod cli;
mod params;
mod sim_trigger;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ecu_common::config::EcuConfig;
use ecu_common::cylinder::Cyl;
use ecu_control::task::EngineTask;
use ecu_hal::driver::OutputDriver;
use ecu_hal::fatal::die;
use ecu_hal::sim::SimulationDriver;

use cli::Command;
use params::SharedParams;

/// How long the prime-injector CLI command holds each injector open.
const PRIME_FUEL_MSEC: u64 = 17;

/// Management-loop cadence: feed the watchdog and service the CLI at
/// this rate (the watchdog is primed every 100ms).
const MANAGEMENT_TICK: Duration = Duration::from_millis(100);

/// Duty-cycle the fuel pump every 20th management tick (2s), matching
/// the original `management_thread`'s `if(!(loop%20)) gaz_toggle();`.
const GAZ_DUTY_TICKS: u32 = 20;

fn main() {
    setup_tracing();

    let config_path = std::env::args().nth(1);
    let cfg = match config_path {
        Some(path) => match EcuConfig::load(std::path::Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => {
            info!("no config path given, using defaults");
            EcuConfig::default()
        }
    };

    info!(wheel = %cfg.wheel, "ECU supervisor starting");

    let params = Arc::new(SharedParams::from_config(&cfg));
    let running = Arc::new(AtomicBool::new(true));

    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("received shutdown signal");
            running.store(false, Ordering::SeqCst);
        }) {
            error!("failed to install signal handler: {e}");
        }
    }

    let (engine_tx, engine_rx) = mpsc::channel::<EngineCommand>();

    let engine_handle = {
        let params = params.clone();
        let running = running.clone();
        std::thread::spawn(move || engine_loop(cfg, params, running, engine_rx))
    };

    management_loop(params, running.clone(), engine_tx);

    let _ = engine_handle.join();
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Commands that need direct access to the output driver, which the
/// Engine Task owns. Forwarded across the task boundary instead of
/// executed in-place, since the driver is not `Sync` shared state in
/// this implementation (plain memory-mapped writes would make this a
/// non-issue on real hardware).
enum EngineCommand {
    PrimeInjectors,
    RelayOn,
    StarterOn,
    PrintRpm,
    PrintProbes,
    ForceDie,
    GazToggle,
}

/// The Engine Task: owns the decoder/angle/scheduler stack and the
/// output driver, fed by a synthetic crank-trigger generator since no
/// real hardware is present.
fn engine_loop(
    cfg: EcuConfig,
    params: Arc<SharedParams>,
    running: Arc<AtomicBool>,
    commands: mpsc::Receiver<EngineCommand>,
) {
    let mut task = EngineTask::new(
        cfg.wheel,
        cfg.timing_advance_enabled,
        SimulationDriver::new(),
    );
    task.set_timing_advance(cfg.timing_advance_deg);
    task.set_fuel_msec(cfg.fuel_msec);
    task.set_trim_flag(cfg.trim_flag);

    // Idle-ish nominal tooth period: plausible for either wheel pattern.
    let mut trigger = sim_trigger::TriggerSimulator::new(cfg.wheel, 2_000);

    while running.load(Ordering::Relaxed) {
        let advance = params.timing_advance_enabled();
        if let Err(reason) = task.set_advance_mode(advance) {
            die(reason, task.driver_mut());
        }
        task.set_timing_advance(params.timing_advance_deg());
        task.set_fuel_msec(params.fuel_msec());
        task.set_trim_flag(params.trim_flag());

        drain_engine_commands(&commands, &mut task, &params);

        let period_us = trigger.next_period_us();
        std::thread::sleep(Duration::from_micros(period_us as u64));
        let now = task.driver_mut().now_usec();
        task.on_tooth_edge(now);
        if let Err(reason) = task.pump() {
            die(reason, task.driver_mut());
        }
    }

    info!("engine loop shut down");
}

fn drain_engine_commands(
    commands: &mpsc::Receiver<EngineCommand>,
    task: &mut EngineTask<SimulationDriver>,
    params: &SharedParams,
) {
    loop {
        match commands.try_recv() {
            Ok(EngineCommand::PrimeInjectors) => {
                info!("priming injectors");
                for cyl in Cyl::ALL {
                    task.driver_mut().open_injector(cyl);
                    std::thread::sleep(Duration::from_millis(PRIME_FUEL_MSEC));
                    let now = task.driver_mut().now_usec();
                    task.driver_mut().close_injector(cyl, now);
                }
                info!("priming injectors done");
            }
            Ok(EngineCommand::RelayOn) => {
                info!("relay ON");
                task.driver_mut().relay_on();
                params.set_relay_on(true);
            }
            Ok(EngineCommand::StarterOn) => {
                info!("starter ON");
                task.driver_mut().starter_on();
            }
            Ok(EngineCommand::PrintRpm) => {
                let rpm = task.rpm();
                let usec_per_10deg = task.deg_to_usec(10);
                info!(rpm, usec_per_10deg, "RPM");
            }
            Ok(EngineCommand::PrintProbes) => {
                info!(state = ?task.driver_mut().state, "test probes");
            }
            Ok(EngineCommand::ForceDie) => {
                info!("operator-triggered KILL");
                die(ecu_common::die::DieReason::Management, task.driver_mut());
            }
            Ok(EngineCommand::GazToggle) => {
                task.driver_mut().gaz_toggle();
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => break,
        }
    }
}

/// The Management Task: services the operator CLI, feeds the
/// watchdog, and duty-cycles the fuel pump — all at a 100ms cadence.
fn management_loop(params: Arc<SharedParams>, running: Arc<AtomicBool>, engine_tx: mpsc::Sender<EngineCommand>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    cli::spawn_reader(std::io::stdin(), cmd_tx);

    let mut loop_count: u32 = 0;
    let mut next_tick = Instant::now();

    while running.load(Ordering::Relaxed) {
        // Feed the watchdog: primed every 100ms.
        tracing::trace!("watchdog fed");

        while let Ok(cmd) = cmd_rx.try_recv() {
            dispatch_cli_command(cmd, &params, &engine_tx);
        }

        if loop_count % GAZ_DUTY_TICKS == 0 && params.relay_on() {
            tracing::trace!("gaz pump duty toggle");
            let _ = engine_tx.send(EngineCommand::GazToggle);
        }
        loop_count = loop_count.wrapping_add(1);

        next_tick += MANAGEMENT_TICK;
        let now = Instant::now();
        if next_tick > now {
            std::thread::sleep(next_tick - now);
        } else {
            next_tick = now;
        }
    }
}

fn dispatch_cli_command(cmd: Command, params: &SharedParams, engine_tx: &mpsc::Sender<EngineCommand>) {
    match cmd {
        Command::Trim => {
            info!("trim");
            params.set_trim_flag(true);
        }
        Command::ToggleAdvance => {
            let enabled = params.toggle_timing_advance_enabled();
            info!(enabled, "timing advance mode");
        }
        Command::BumpAdvance => {
            info!(deg = params.bump_timing_advance(), "timing advance");
        }
        Command::CutAdvance => {
            info!(deg = params.cut_timing_advance(), "timing advance");
        }
        Command::BumpFuel => {
            info!(msec = params.bump_fuel_msec(), "fuel pulse width");
        }
        Command::CutFuel => {
            info!(msec = params.cut_fuel_msec(), "fuel pulse width");
        }
        Command::PrintRpm => {
            let _ = engine_tx.send(EngineCommand::PrintRpm);
        }
        Command::PrimeInjectors => {
            let _ = engine_tx.send(EngineCommand::PrimeInjectors);
        }
        Command::RelayOn => {
            let _ = engine_tx.send(EngineCommand::RelayOn);
        }
        Command::StarterOn => {
            let _ = engine_tx.send(EngineCommand::StarterOn);
        }
        Command::ToggleRecordMode => {
            let enabled = params.toggle_record_mode();
            info!(enabled, "record mode");
        }
        Command::ForceDie => {
            let _ = engine_tx.send(EngineCommand::ForceDie);
        }
        Command::PrintProbes => {
            let _ = engine_tx.send(EngineCommand::PrintProbes);
        }
    }
}
