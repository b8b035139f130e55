//! `riftwalk-hal` – sensor seams and low-level control.
//!
//! # Modules
//!
//! - [`camera`] – [`Camera`][camera::Camera] trait for frame sources.
//! - [`scanner`] – [`RangeScanner`][scanner::RangeScanner] trait for rotating
//!   range sensors.
//! - [`wall_follow`] – [`WallFollowController`][wall_follow::WallFollowController]:
//!   bounded PI turn-rate controller driven by left/right range asymmetry.
//! - [`sim`] – simulated corridor scanner and step-edge camera.

pub mod camera;
pub mod scanner;
pub mod sim;
pub mod wall_follow;

pub use wall_follow::{ControllerState, WallFollowController};
