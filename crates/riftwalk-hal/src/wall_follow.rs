//! Wall-following PI controller.
//!
//! Converts the asymmetry between the left and right range windows into a
//! bounded turn-rate command.  The integral term is *not* accumulated: every
//! tick it is re-derived as the instantaneous error times the elapsed time
//! since the previous tick (a single rectangle of the integral), so the
//! controller carries no integral memory between ticks.
//!
//! ```text
//! e = left - right
//! z = clamp(KI * e * Δt + KP * e, -0.4, 0.4)
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use riftwalk_hal::wall_follow::WallFollowController;
//!
//! let mut ctrl = WallFollowController::new(0.5, 0.1).unwrap();
//! // First call: Δt = 0, pure proportional response 0.5 * 1.0, saturated.
//! let z = ctrl.update(2.0, 1.0, Utc::now()).unwrap();
//! assert_eq!(z, 0.4);
//! ```

use chrono::{DateTime, Utc};
use riftwalk_types::RiftError;
use tracing::trace;

/// Output saturation of the turn-rate command (rad/s).
pub const SATURATION: f32 = 0.4;
/// Default proportional gain.
pub const DEFAULT_KP: f32 = 0.5;
/// Default integral gain.
pub const DEFAULT_KI: f32 = 0.1;

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No update has happened yet.
    Idle,
    /// At least one update has happened at the contained time.
    Running { last_update: DateTime<Utc> },
}

/// Proportional / single-step-integral wall follower.
#[derive(Debug, Clone)]
pub struct WallFollowController {
    kp: f32,
    ki: f32,
    state: ControllerState,
}

impl WallFollowController {
    /// # Errors
    ///
    /// Returns [`RiftError::Config`] if either gain is negative or non-finite.
    pub fn new(kp: f32, ki: f32) -> Result<Self, RiftError> {
        for (name, gain) in [("KP", kp), ("KI", ki)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(RiftError::Config(format!(
                    "{name} must be a finite, non-negative gain, got {gain}"
                )));
            }
        }
        Ok(Self {
            kp,
            ki,
            state: ControllerState::Idle,
        })
    }

    pub fn gains(&self) -> (f32, f32) {
        (self.kp, self.ki)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Compute the next turn-rate command and move to `Running { now }`.
    ///
    /// - `left_mean` / `right_mean` – windowed range means (metres).
    /// - `now` – time of the range sample the means were computed from.
    ///
    /// The first call uses `Δt = 0`.  A `now` earlier than the previous
    /// update (out-of-order samples) is also treated as `Δt = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::InvalidRange`] without touching the controller
    /// state if either mean is non-finite.
    pub fn update(&mut self, left_mean: f32, right_mean: f32, now: DateTime<Utc>) -> Result<f32, RiftError> {
        if !left_mean.is_finite() || !right_mean.is_finite() {
            return Err(RiftError::InvalidRange(format!(
                "window means must be finite, got left={left_mean} right={right_mean}"
            )));
        }

        let delta_t = match self.state {
            ControllerState::Idle => 0.0,
            ControllerState::Running { last_update } => seconds_between(last_update, now).max(0.0),
        };
        self.state = ControllerState::Running { last_update: now };

        // f64 keeps `e` finite for any pair of finite f32 means.
        let e = f64::from(left_mean) - f64::from(right_mean);
        let p = e;
        let i = e * delta_t;
        let z = f64::from(self.ki) * i + f64::from(self.kp) * p;
        trace!(error = e, delta_t, raw = z, "wall follow update");
        let bound = f64::from(SATURATION);
        Ok(z.clamp(-bound, bound) as f32)
    }
}

fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 * 1e-6,
        None => delta.num_milliseconds() as f64 * 1e-3,
    }
}
