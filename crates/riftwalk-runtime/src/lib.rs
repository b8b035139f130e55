//! `riftwalk-runtime` – orchestration of perception, control and commands.
//!
//! # Modules
//!
//! - [`facade`] – [`RobotFacade`][facade::RobotFacade]: owns the range
//!   buffer, controller timing and joint table, reacts to every sensor
//!   callback and is the only component that publishes on the bus.
//! - [`config`] – [`RobotConfig`][config::RobotConfig]: namespace, frame ids,
//!   gains, detector settings, range windows, control rate.
//! - [`motion`] – joint-map interpolation, the
//!   [`SlowMotion`][motion::SlowMotion] trajectory and the cooperative
//!   [`ShutdownSignal`][motion::ShutdownSignal].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with optional OTLP span export.

pub mod config;
pub mod facade;
pub mod motion;
pub mod telemetry;

pub use config::{PoseLookup, RobotConfig, WallFollowConfig, WindowConfig};
pub use facade::{FrameOutcome, RobotFacade};
pub use motion::{MotionOutcome, ShutdownSignal, interpolate, mean_abs_distance};
pub use telemetry::{TracerProviderGuard, init_tracing};
