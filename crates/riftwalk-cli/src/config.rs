//! Reads and writes `~/.riftwalk/config.toml`.
//!
//! The file has a `[robot]` table (the facade's [`RobotConfig`]) and a
//! `[sim]` table describing the simulated sensors the demo drives.

use std::fs;
use std::path::{Path, PathBuf};

use riftwalk_runtime::RobotConfig;
use riftwalk_runtime::config::rate_period;
use riftwalk_types::RiftError;
use serde::{Deserialize, Serialize};

/// Simulated sensor rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Distance between the corridor walls (m).
    #[serde(default = "default_corridor_width")]
    pub corridor_width: f32,

    /// Initial lateral offset from the corridor centre (m, left positive).
    #[serde(default = "default_start_offset")]
    pub start_offset: f32,

    #[serde(default = "default_scan_hz")]
    pub scan_hz: f32,

    #[serde(default = "default_camera_hz")]
    pub camera_hz: f32,

    #[serde(default = "default_pose_hz")]
    pub pose_hz: f32,

    #[serde(default = "default_camera_width")]
    pub camera_width: u32,

    #[serde(default = "default_camera_height")]
    pub camera_height: u32,
}

fn default_corridor_width() -> f32 {
    2.0
}
fn default_start_offset() -> f32 {
    0.3
}
fn default_scan_hz() -> f32 {
    10.0
}
fn default_camera_hz() -> f32 {
    5.0
}
fn default_pose_hz() -> f32 {
    50.0
}
fn default_camera_width() -> u32 {
    160
}
fn default_camera_height() -> u32 {
    120
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            corridor_width: default_corridor_width(),
            start_offset: default_start_offset(),
            scan_hz: default_scan_hz(),
            camera_hz: default_camera_hz(),
            pose_hz: default_pose_hz(),
            camera_width: default_camera_width(),
            camera_height: default_camera_height(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), RiftError> {
        if !(self.corridor_width.is_finite() && self.corridor_width > 0.0) {
            return Err(RiftError::Config(format!(
                "sim.corridor_width must be positive, got {}",
                self.corridor_width
            )));
        }
        if self.start_offset.abs() >= self.corridor_width / 2.0 {
            return Err(RiftError::Config(format!(
                "sim.start_offset {} puts the robot outside the corridor",
                self.start_offset
            )));
        }
        for (name, hz) in [
            ("scan_hz", self.scan_hz),
            ("camera_hz", self.camera_hz),
            ("pose_hz", self.pose_hz),
        ] {
            rate_period(&format!("sim.{name}"), hz)?;
        }
        if self.camera_width == 0 || self.camera_height == 0 {
            return Err(RiftError::Config("sim camera size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Persisted configuration stored in `~/.riftwalk/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,

    #[serde(default)]
    pub sim: SimConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), RiftError> {
        self.robot.validate()?;
        self.sim.validate()
    }
}

/// `~/.riftwalk/config.toml`, falling back to the working directory when no
/// home directory is known.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".riftwalk").join("config.toml")
}

/// Load the config, with environment overrides applied.  `None` when the
/// file does not exist.
pub fn load() -> Result<Option<Config>, RiftError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, RiftError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| RiftError::Config(format!("failed to read {}: {e}", path.display())))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| RiftError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `RIFTWALK_*` overrides.  Unparseable numbers are ignored.
///
/// | Variable | Field |
/// |---|---|
/// | `RIFTWALK_KP` | `robot.kp` |
/// | `RIFTWALK_KI` | `robot.ki` |
/// | `RIFTWALK_FOV` | `robot.horizontal_fov` |
/// | `RIFTWALK_NAMESPACE` | `robot.namespace` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(kp) = env_f32("RIFTWALK_KP") {
        cfg.robot.kp = kp;
    }
    if let Some(ki) = env_f32("RIFTWALK_KI") {
        cfg.robot.ki = ki;
    }
    if let Some(fov) = env_f32("RIFTWALK_FOV") {
        cfg.robot.horizontal_fov = fov;
    }
    if let Ok(ns) = std::env::var("RIFTWALK_NAMESPACE") {
        cfg.robot.namespace = ns;
    }
}

fn env_f32(name: &str) -> Option<f32> {
    std::env::var(name).ok()?.trim().parse().ok()
}

pub fn save(cfg: &Config) -> Result<(), RiftError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), RiftError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RiftError::Config(format!("failed to create {}: {e}", parent.display())))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| RiftError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw).map_err(|e| RiftError::Config(format!("failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.robot.namespace, "/phantomx/");
        assert_eq!(loaded.robot.standoff_window.lo, 80);
        assert_eq!(loaded.sim, SimConfig::default());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[robot]\nworld_frame = \"odom\"\n\n[robot.wall_follow]\nenabled = false\n")
            .expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.robot.world_frame, "odom");
        assert!(!cfg.robot.wall_follow.enabled);
        assert_eq!(cfg.robot.wall_follow.left_window.lo, 50);
        assert_eq!(cfg.robot.kernel_size, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn garbage_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "robot = 12").expect("write");
        assert!(matches!(load_from(&path), Err(RiftError::Config(_))));
    }

    #[test]
    fn config_path_points_to_riftwalk_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".riftwalk"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        // SAFETY: the only test in this crate touching these variables.
        unsafe {
            std::env::set_var("RIFTWALK_KP", "0.8");
            std::env::set_var("RIFTWALK_KI", "not-a-number");
            std::env::set_var("RIFTWALK_NAMESPACE", "/hexapod/");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.robot.kp, 0.8);
        assert_eq!(cfg.robot.ki, 0.1);
        assert_eq!(cfg.robot.namespace, "/hexapod/");
        unsafe {
            std::env::remove_var("RIFTWALK_KP");
            std::env::remove_var("RIFTWALK_KI");
            std::env::remove_var("RIFTWALK_NAMESPACE");
        }
    }

    #[test]
    fn sim_rate_without_a_period_is_rejected() {
        let cfg = Config {
            sim: SimConfig {
                pose_hz: 1e10,
                ..SimConfig::default()
            },
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sim.pose_hz"));
    }

    #[test]
    fn sim_offset_outside_corridor_is_rejected() {
        let cfg = Config {
            sim: SimConfig {
                start_offset: 1.5,
                ..SimConfig::default()
            },
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
