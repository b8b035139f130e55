//! Robot configuration surface.
//!
//! Every field has a serde default so a partial TOML file (or none at all)
//! yields a usable configuration.  [`RobotConfig::validate`] is the single
//! gate for configuration errors; [`RobotFacade::new`][crate::facade::RobotFacade::new]
//! refuses to start with an invalid configuration.

use std::f32::consts::PI;
use std::time::Duration;

use riftwalk_hal::wall_follow::{DEFAULT_KI, DEFAULT_KP};
use riftwalk_perception::edges::{DEFAULT_HIGH_THRESHOLD, DEFAULT_KERNEL_SIZE, DEFAULT_LOW_THRESHOLD};
use riftwalk_perception::projector::DEFAULT_HORIZONTAL_FOV;
use riftwalk_perception::range::BucketWindow;
use riftwalk_types::RiftError;
use serde::{Deserialize, Serialize};

/// Half-open scanner bucket window `[lo, hi)`; `lo > hi` wraps through 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub lo: usize,
    pub hi: usize,
}

impl WindowConfig {
    pub const fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    pub fn to_window(self) -> Result<BucketWindow, RiftError> {
        BucketWindow::new(self.lo, self.hi)
    }
}

/// Which pose estimate a camera frame is projected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseLookup {
    /// Most recent transform, whatever its age.
    #[default]
    Latest,
    /// Transform valid at the frame's capture time.
    FrameStamp,
}

/// Closed-loop wall following on every range scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallFollowConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Forward walk speed while following (m/s).
    #[serde(default = "default_linear_speed")]
    pub linear_speed: f32,
    #[serde(default = "default_left_window")]
    pub left_window: WindowConfig,
    #[serde(default = "default_right_window")]
    pub right_window: WindowConfig,
}

impl Default for WallFollowConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            linear_speed: default_linear_speed(),
            left_window: default_left_window(),
            right_window: default_right_window(),
        }
    }
}

/// Full configuration of a [`RobotFacade`][crate::facade::RobotFacade].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Prefix for every output channel, e.g. `"/phantomx/"`.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_world_frame")]
    pub world_frame: String,

    #[serde(default = "default_body_frame")]
    pub body_frame: String,

    /// Camera horizontal field of view (radians).
    #[serde(default = "default_fov")]
    pub horizontal_fov: f32,

    #[serde(default = "default_kp")]
    pub kp: f32,

    #[serde(default = "default_ki")]
    pub ki: f32,

    #[serde(default = "default_low_threshold")]
    pub edge_low_threshold: f32,

    #[serde(default = "default_high_threshold")]
    pub edge_high_threshold: f32,

    /// Gaussian / median kernel size (odd).
    #[serde(default = "default_kernel_size")]
    pub kernel_size: usize,

    /// Sampling rate of interpolated joint motions (Hz).
    #[serde(default = "default_control_rate")]
    pub control_rate_hz: f32,

    #[serde(default)]
    pub pose_lookup: PoseLookup,

    /// Age after which a dynamic transform is considered expired (ms).
    #[serde(default = "default_pose_max_age_ms")]
    pub pose_max_age_ms: i64,

    /// Scanner window whose mean is the camera standoff distance.
    #[serde(default = "default_standoff_window")]
    pub standoff_window: WindowConfig,

    #[serde(default)]
    pub wall_follow: WallFollowConfig,
}

fn default_true() -> bool {
    true
}
fn default_linear_speed() -> f32 {
    0.1
}
fn default_left_window() -> WindowConfig {
    WindowConfig::new(50, 80)
}
fn default_right_window() -> WindowConfig {
    WindowConfig::new(280, 310)
}
fn default_namespace() -> String {
    "/phantomx/".to_string()
}
fn default_world_frame() -> String {
    "map".to_string()
}
fn default_body_frame() -> String {
    "base_link".to_string()
}
fn default_fov() -> f32 {
    DEFAULT_HORIZONTAL_FOV
}
fn default_kp() -> f32 {
    DEFAULT_KP
}
fn default_ki() -> f32 {
    DEFAULT_KI
}
fn default_low_threshold() -> f32 {
    DEFAULT_LOW_THRESHOLD
}
fn default_high_threshold() -> f32 {
    DEFAULT_HIGH_THRESHOLD
}
fn default_kernel_size() -> usize {
    DEFAULT_KERNEL_SIZE
}
fn default_standoff_window() -> WindowConfig {
    WindowConfig::new(80, 110)
}
fn default_control_rate() -> f32 {
    100.0
}
fn default_pose_max_age_ms() -> i64 {
    500
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            world_frame: default_world_frame(),
            body_frame: default_body_frame(),
            horizontal_fov: default_fov(),
            kp: default_kp(),
            ki: default_ki(),
            edge_low_threshold: default_low_threshold(),
            edge_high_threshold: default_high_threshold(),
            kernel_size: default_kernel_size(),
            standoff_window: default_standoff_window(),
            wall_follow: WallFollowConfig::default(),
            control_rate_hz: default_control_rate(),
            pose_lookup: PoseLookup::default(),
            pose_max_age_ms: default_pose_max_age_ms(),
        }
    }
}

impl RobotConfig {
    /// Check every field; the first violation is returned as
    /// [`RiftError::Config`].
    pub fn validate(&self) -> Result<(), RiftError> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(RiftError::Config(format!("{name} must be finite and >= 0, got {gain}")));
            }
        }
        if !(self.horizontal_fov.is_finite() && self.horizontal_fov > 0.0 && self.horizontal_fov < PI) {
            return Err(RiftError::Config(format!(
                "horizontal_fov must lie in (0, π), got {}",
                self.horizontal_fov
            )));
        }
        if !(self.edge_low_threshold >= 0.0 && self.edge_low_threshold <= self.edge_high_threshold)
            || !self.edge_high_threshold.is_finite()
        {
            return Err(RiftError::Config(format!(
                "edge thresholds must satisfy 0 <= low <= high, got low={} high={}",
                self.edge_low_threshold, self.edge_high_threshold
            )));
        }
        if self.kernel_size < 3 || self.kernel_size % 2 == 0 {
            return Err(RiftError::Config(format!(
                "kernel_size must be odd and >= 3, got {}",
                self.kernel_size
            )));
        }
        for (name, window) in [
            ("standoff_window", self.standoff_window),
            ("wall_follow.left_window", self.wall_follow.left_window),
            ("wall_follow.right_window", self.wall_follow.right_window),
        ] {
            window
                .to_window()
                .map_err(|e| RiftError::Config(format!("{name}: {e}")))?;
        }
        if !self.wall_follow.linear_speed.is_finite() {
            return Err(RiftError::Config("wall_follow.linear_speed must be finite".to_string()));
        }
        rate_period("control_rate_hz", self.control_rate_hz)?;
        if self.pose_max_age_ms < 0 {
            return Err(RiftError::Config(format!(
                "pose_max_age_ms must be >= 0, got {}",
                self.pose_max_age_ms
            )));
        }
        Ok(())
    }

    /// Tick period of interpolated joint motions.
    pub fn control_period(&self) -> Result<Duration, RiftError> {
        rate_period("control_rate_hz", self.control_rate_hz)
    }

    /// Channel carrying commands for `joint`.
    pub fn joint_channel(&self, joint: &str) -> String {
        format!("{}{joint}_position_controller/command", self.namespace)
    }

    pub fn velocity_channel(&self) -> String {
        format!("{}cmd_vel", self.namespace)
    }

    pub fn rifts_channel(&self) -> String {
        format!("{}rifts_coord", self.namespace)
    }

    pub fn alerts_channel(&self) -> String {
        format!("{}alerts", self.namespace)
    }
}

/// Period of a `hz` rate, rejecting rates with no usable non-zero period.
pub fn rate_period(name: &str, hz: f32) -> Result<Duration, RiftError> {
    if !(hz.is_finite() && hz > 0.0) {
        return Err(RiftError::Config(format!("{name} must be positive, got {hz}")));
    }
    match Duration::try_from_secs_f32(1.0 / hz) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(RiftError::Config(format!("{name} = {hz} has no representable period"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RobotConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.kp, 0.5);
        assert_eq!(cfg.ki, 0.1);
        assert_eq!(cfg.horizontal_fov, 0.616);
        assert_eq!(cfg.kernel_size, 5);
        assert_eq!(cfg.standoff_window, WindowConfig::new(80, 110));
    }

    #[test]
    fn negative_gain_is_rejected() {
        let cfg = RobotConfig {
            kp: -1.0,
            ..RobotConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(RiftError::Config(_))));
    }

    #[test]
    fn degenerate_window_is_rejected() {
        let mut cfg = RobotConfig::default();
        cfg.wall_follow.left_window = WindowConfig::new(10, 10);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("left_window"));
    }

    #[test]
    fn even_kernel_and_inverted_thresholds_are_rejected() {
        let cfg = RobotConfig {
            kernel_size: 4,
            ..RobotConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = RobotConfig {
            edge_low_threshold: 30.0,
            ..RobotConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_control_rate_is_rejected() {
        let cfg = RobotConfig {
            control_rate_hz: 0.0,
            ..RobotConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rate_too_high_for_a_period_is_rejected() {
        let cfg = RobotConfig {
            control_rate_hz: 1e10,
            ..RobotConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(RiftError::Config(_))));
        assert!(cfg.control_period().is_err());
    }

    #[test]
    fn rate_period_matches_rate() {
        assert_eq!(rate_period("hz", 100.0).unwrap(), Duration::from_millis(10));
        assert!(rate_period("hz", f32::INFINITY).is_err());
        assert!(rate_period("hz", -5.0).is_err());
        // Period longer than Duration can hold.
        assert!(rate_period("hz", 1e-30).is_err());
    }

    #[test]
    fn channel_names_follow_namespace() {
        let cfg = RobotConfig::default();
        assert_eq!(cfg.velocity_channel(), "/phantomx/cmd_vel");
        assert_eq!(cfg.rifts_channel(), "/phantomx/rifts_coord");
        assert_eq!(
            cfg.joint_channel("j_c1_lf"),
            "/phantomx/j_c1_lf_position_controller/command"
        );
    }
}
