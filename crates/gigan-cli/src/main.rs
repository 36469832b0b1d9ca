//! `gigan-cli` – match simulator for the Gigan control core.
//!
//! This binary runs the full robot stack against simulated hardware:
//!
//! 1. Loads `~/.gigan/config.toml`, writing the defaults on first run.
//! 2. Plays a match: disabled, autonomous, teleop, each phase as long as the
//!    `[match]` table says, ticking the robot at the configured period.
//! 3. Replays operator inputs and telemetry from the optional input script.
//! 4. Prints alert changes as they happen.
//! 5. On Ctrl-C or at the end of the match, disables the robot and prints the
//!    final status as JSON.

mod config;
mod script;

use std::collections::BTreeSet;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use gigan_kernel::AlertLevel;
use gigan_runtime::layout::sim_hardware;
use gigan_runtime::{Robot, RobotMode, init_tracing};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{Config, MatchPlan};
use crate::script::{InputScript, SimWorld};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go through tracing; user-facing output stays on stdout.
    let _tracing = init_tracing("gigan");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – disabling robot …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the match can only end on its own");
    }

    let cfg = load_config();

    let script = match &cfg.input_script {
        Some(path) => match InputScript::load(path) {
            Ok(script) => {
                println!(
                    "  Input script {} ({} events)",
                    path.display().to_string().bold(),
                    script.len()
                );
                script
            }
            Err(e) => {
                println!("{}: {}", "Input script error".red(), e);
                return ExitCode::FAILURE;
            }
        },
        None => InputScript::default(),
    };

    let hardware = match sim_hardware(None) {
        Ok(hw) => hw,
        Err(e) => {
            println!("{}: {}", "Hardware error".red(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut robot = match Robot::new(cfg.robot.clone(), hardware.registry) {
        Ok(robot) => robot,
        Err(e) => {
            println!("{}: {}", "Robot init failed".red(), e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "  Auto routine: {}   Tick: {} ms\n",
        cfg.robot.auto_routine.to_string().bold(),
        cfg.robot.tick_ms
    );

    let end = run_match(&mut robot, &cfg.match_plan, script, &shutdown).await;

    robot.set_mode(RobotMode::Disabled);
    robot.periodic(end, &Default::default(), &SimWorld::default().telemetry(false));

    match serde_json::to_string_pretty(&robot.status()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            println!("{}: {}", "Status serialization failed".red(), e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// Match loop
// ─────────────────────────────────────────────────────────────────────────────

/// Tick the robot until the match ends or shutdown is requested.  Returns
/// the simulated time reached.
async fn run_match(
    robot: &mut Robot,
    plan: &MatchPlan,
    mut script: InputScript,
    shutdown: &AtomicBool,
) -> Duration {
    let period = robot.config().tick_period();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut world = SimWorld::default();
    let mut active_alerts = BTreeSet::new();
    let mut now = Duration::ZERO;

    loop {
        interval.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            info!(at = ?now, "shutdown requested");
            break;
        }
        let Some(mode) = plan.mode_at(now) else {
            println!("{}", "  Match over.".green().bold());
            break;
        };
        if mode != robot.mode() {
            println!(
                "  [{:>7.2}s] {} {}",
                now.as_secs_f64(),
                "mode".dimmed(),
                mode.to_string().bold()
            );
            robot.set_mode(mode);
        }

        let fired = script.advance(now, &mut world);
        if fired > 0 {
            debug!(fired, "script events applied");
        }
        let telemetry = world.telemetry(robot.mode().is_enabled());
        let report = robot.periodic(now, &world.input, &telemetry);
        if !report.is_quiet() {
            debug!(?report, "tick");
        }

        print_alert_changes(robot, now, &mut active_alerts);
        now += period;
    }
    now
}

fn print_alert_changes(robot: &Robot, now: Duration, active: &mut BTreeSet<&'static str>) {
    for alert in robot.health().alerts().alerts {
        let was_active = active.contains(alert.name);
        if alert.active && !was_active {
            let label = match alert.level {
                AlertLevel::Error => "ERROR".red().bold(),
                AlertLevel::Warning => "WARN".yellow().bold(),
                AlertLevel::Info => "INFO".cyan().bold(),
            };
            println!("  [{:>7.2}s] {} {}", now.as_secs_f64(), label, alert.message);
            active.insert(alert.name);
        } else if !alert.active && was_active {
            println!(
                "  [{:>7.2}s] {} {}",
                now.as_secs_f64(),
                "cleared".green(),
                alert.name
            );
            active.remove(alert.name);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   _____ _                   "#.bold().cyan());
    println!("{}", r#"  / ___/(_)___ _____ _____   "#.bold().cyan());
    println!("{}", r#" / (_ // / _ `/ _ `/ _ \     "#.bold().cyan());
    println!("{}", r#" \___//_/\_, /\_,_/_//_/     "#.bold().cyan());
    println!("{}", r#"        /___/                "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Gigan".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot control core – match simulator");
    println!();
}
