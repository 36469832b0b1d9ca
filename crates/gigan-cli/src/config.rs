//! Simulator configuration – reads/writes `~/.gigan/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gigan_runtime::{AutoRoutine, RobotConfig, RobotMode};
use serde::{Deserialize, Serialize};

fn default_disabled_secs() -> f64 {
    1.0
}
fn default_auto_secs() -> f64 {
    15.0
}
fn default_teleop_secs() -> f64 {
    135.0
}

/// Phase lengths of a simulated match, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPlan {
    #[serde(default = "default_disabled_secs")]
    pub disabled_secs: f64,
    #[serde(default = "default_auto_secs")]
    pub auto_secs: f64,
    #[serde(default = "default_teleop_secs")]
    pub teleop_secs: f64,
}

impl Default for MatchPlan {
    fn default() -> Self {
        Self {
            disabled_secs: default_disabled_secs(),
            auto_secs: default_auto_secs(),
            teleop_secs: default_teleop_secs(),
        }
    }
}

impl MatchPlan {
    /// The mode the robot should be in at `now`, or `None` once the match is
    /// over.  Negative or non-finite phase lengths count as zero.
    pub fn mode_at(&self, now: Duration) -> Option<RobotMode> {
        let len = |secs: f64| if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        let t = now.as_secs_f64();
        let auto_start = len(self.disabled_secs);
        let teleop_start = auto_start + len(self.auto_secs);
        let end = teleop_start + len(self.teleop_secs);
        if t < auto_start {
            Some(RobotMode::Disabled)
        } else if t < teleop_start {
            Some(RobotMode::Autonomous)
        } else if t < end {
            Some(RobotMode::Teleop)
        } else {
            None
        }
    }
}

/// Persisted configuration stored in `~/.gigan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,

    #[serde(default, rename = "match")]
    pub match_plan: MatchPlan,

    /// TOML file of timed operator inputs replayed during the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_script: Option<PathBuf>,
}

/// Return the path to `~/.gigan/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".gigan").join("config.toml")
}

/// Load the config from disk and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    let mut cfg = load_from(&config_path())?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `GIGAN_*` environment variable overrides to `cfg`.  Unparseable
/// values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `GIGAN_TICK_MS` | `robot.tick_ms` |
/// | `GIGAN_AUTO` | `robot.auto_routine` |
/// | `GIGAN_LOW_BATTERY_VOLTS` | `robot.alerts.low_battery_volts` |
/// | `GIGAN_INPUT_SCRIPT` | `input_script` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("GIGAN_TICK_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
        && ms > 0
    {
        cfg.robot.tick_ms = ms;
    }
    if let Ok(v) = std::env::var("GIGAN_AUTO")
        && let Ok(routine) = v.parse::<AutoRoutine>()
    {
        cfg.robot.auto_routine = routine;
    }
    if let Ok(v) = std::env::var("GIGAN_LOW_BATTERY_VOLTS")
        && let Ok(volts) = v.trim().parse::<f64>()
        && volts.is_finite()
    {
        cfg.robot.alerts.low_battery_volts = volts;
    }
    if let Ok(v) = std::env::var("GIGAN_INPUT_SCRIPT")
        && !v.trim().is_empty()
    {
        cfg.input_script = Some(PathBuf::from(v));
    }
}

/// Save the config to disk, creating `~/.gigan/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
