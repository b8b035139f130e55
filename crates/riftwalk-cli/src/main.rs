//! `riftwalk` – runs the robot facade against simulated sensors.
//!
//! 1. Loads `~/.riftwalk/config.toml` (writing the defaults on first run).
//! 2. Builds the event bus, the transform tree and the facade.
//! 3. Captures the joint schema and eases the legs into a standing pose.
//! 4. Runs the pose, scan, camera and drive loops until **Ctrl-C**, which
//!    raises the shutdown signal and publishes a `SystemAlerts` notice.

mod config;

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use riftwalk_hal::camera::Camera;
use riftwalk_hal::scanner::RangeScanner;
use riftwalk_hal::sim::{SimCamera, SimCorridor};
use riftwalk_middleware::rosbridge::to_publish_frame;
use riftwalk_middleware::{EventBus, Topic};
use riftwalk_perception::TfEngine;
use riftwalk_perception::transform::{Quaternion, Transform3D, Vec3};
use riftwalk_runtime::config::rate_period;
use riftwalk_runtime::{FrameOutcome, RobotFacade, ShutdownSignal, init_tracing};
use riftwalk_types::{Event, EventPayload, JointAngleMap, RiftError};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

const LEGS: [&str; 6] = ["lf", "lm", "lr", "rf", "rm", "rr"];
const SEGMENTS: [&str; 3] = ["c1", "thigh", "tibia"];

fn main() {
    let _guard = init_tracing("riftwalk");

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => info!(path = %config::config_path().display(), "default config written"),
                Err(e) => warn!(error = %e, "could not write default config"),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            error!(error = %e, "config unreadable, using defaults");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };
    if let Err(e) = cfg.validate() {
        error!(error = %e, "invalid configuration");
        std::process::exit(2);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start tokio runtime");
            std::process::exit(1);
        }
    };

    let bus = EventBus::default();
    let shutdown = ShutdownSignal::new();
    {
        let bus = bus.clone();
        let shutdown = shutdown.clone();
        let channel = cfg.robot.alerts_channel();
        if let Err(e) = ctrlc::set_handler(move || {
            warn!("Ctrl-C received, shutting down");
            bus.publish_to(
                Topic::SystemAlerts,
                Event::new(
                    channel.clone(),
                    EventPayload::Fault {
                        component: "cli".to_string(),
                        message: "shutdown requested by operator".to_string(),
                    },
                ),
            );
            shutdown.trigger();
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    if let Err(e) = runtime.block_on(run(cfg, bus, shutdown)) {
        error!(error = %e, "riftwalk stopped");
        std::process::exit(1);
    }
    info!("riftwalk stopped");
}

async fn run(cfg: config::Config, bus: EventBus, shutdown: ShutdownSignal) -> Result<(), RiftError> {
    let tf = Arc::new(RwLock::new(TfEngine::new(chrono::Duration::milliseconds(
        cfg.robot.pose_max_age_ms,
    ))));
    let robot = Arc::new(RobotFacade::new(cfg.robot.clone(), bus.clone(), tf.clone())?);
    let corridor = Arc::new(Mutex::new(
        SimCorridor::new("base_scan", cfg.sim.corridor_width).with_lateral_offset(cfg.sim.start_offset),
    ));

    let mut tasks = JoinSet::new();
    tasks.spawn(bridge_loop(bus.clone()));
    tasks.spawn(pose_loop(
        tf,
        corridor.clone(),
        cfg.robot.world_frame.clone(),
        cfg.robot.body_frame.clone(),
        cfg.sim.pose_hz,
    ));
    tasks.spawn(drive_loop(bus.clone(), corridor.clone()));
    tasks.spawn(scan_loop(robot.clone(), corridor, cfg.sim.scan_hz));
    tasks.spawn(camera_loop(
        robot.clone(),
        SimCamera::new(
            "front_camera",
            cfg.sim.camera_width,
            cfg.sim.camera_height,
            cfg.sim.camera_width / 2,
        ),
        cfg.sim.camera_hz,
    ));

    stand_up(&robot, &shutdown).await?;

    let mut idle = tokio::time::interval(Duration::from_millis(100));
    while !shutdown.is_triggered() {
        idle.tick().await;
    }
    tasks.shutdown().await;
    Ok(())
}

/// Report an all-zero joint state, then ease into the standing pose.
async fn stand_up(robot: &RobotFacade, shutdown: &ShutdownSignal) -> Result<(), RiftError> {
    let names: Vec<String> = LEGS
        .iter()
        .flat_map(|leg| SEGMENTS.iter().map(move |seg| format!("j_{seg}_{leg}")))
        .collect();
    robot.on_joint_state(&names, &vec![0.0; names.len()])?;

    let standing: JointAngleMap = names
        .into_iter()
        .map(|joint| {
            let angle = if joint.starts_with("j_thigh") {
                -0.4
            } else if joint.starts_with("j_tibia") {
                1.1
            } else {
                0.0
            };
            (joint, angle)
        })
        .collect();
    let outcome = robot
        .set_angles_slow(&standing, Duration::from_secs(1), shutdown)
        .await?;
    info!(?outcome, "stand-up motion finished");
    Ok(())
}

/// Rates were checked by `Config::validate`; a bad one falls back to 1 Hz.
fn ticker(hz: f32) -> tokio::time::Interval {
    let period = rate_period("rate", hz).unwrap_or(Duration::from_secs(1));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

fn yaw_quaternion(yaw: f32) -> Quaternion {
    let (s, c) = (yaw / 2.0).sin_cos();
    Quaternion::new(c, 0.0, 0.0, s)
}

// ────────────────────────────────────────────────────────────────────────────
// Loops
// ────────────────────────────────────────────────────────────────────────────

async fn pose_loop(
    tf: Arc<RwLock<TfEngine>>,
    corridor: Arc<Mutex<SimCorridor>>,
    world_frame: String,
    body_frame: String,
    hz: f32,
) {
    let mut ticker = ticker(hz);
    loop {
        ticker.tick().await;
        let (lateral, heading) = {
            let c = corridor.lock().unwrap_or_else(PoisonError::into_inner);
            (c.lateral(), c.heading())
        };
        let transform = Transform3D::new(Vec3::new(0.0, lateral, 0.0), yaw_quaternion(heading));
        tf.write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_transform(&world_frame, &body_frame, transform, chrono::Utc::now());
    }
}

async fn scan_loop(robot: Arc<RobotFacade>, corridor: Arc<Mutex<SimCorridor>>, hz: f32) {
    let mut ticker = ticker(hz);
    loop {
        ticker.tick().await;
        let scan = corridor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scan();
        let result = scan.and_then(|sample| robot.on_range_scan(sample));
        match result {
            Ok(Some(turn)) => debug!(turn, "wall follow"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "range scan dropped"),
        }
    }
}

async fn camera_loop(robot: Arc<RobotFacade>, mut camera: SimCamera, hz: f32) {
    let mut ticker = ticker(hz);
    loop {
        ticker.tick().await;
        let outcome = camera
            .capture()
            .and_then(|frame| robot.on_camera_frame(&frame));
        match outcome {
            Ok(FrameOutcome::Published { points }) => debug!(camera = camera.id(), points, "rifts published"),
            Ok(FrameOutcome::Skipped { .. }) => {}
            Err(e) => warn!(camera = camera.id(), error = %e, "camera frame dropped"),
        }
    }
}

/// Integrate walk commands into the simulated corridor.
async fn drive_loop(bus: EventBus, corridor: Arc<Mutex<SimCorridor>>) {
    let mut rx = bus.subscribe_to(Topic::Locomotion);
    let mut last = Instant::now();
    while let Some(event) = rx.next().await {
        let EventPayload::Velocity(twist) = event.payload else {
            continue;
        };
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.5);
        last = now;
        corridor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance(twist.linear_x, twist.linear_y, twist.angular_z, dt);
    }
}

/// Log what an external rosbridge would be sent.
async fn bridge_loop(bus: EventBus) {
    let mut rifts = bus.subscribe_to(Topic::Rifts);
    let mut alerts = bus.subscribe_to(Topic::SystemAlerts);
    loop {
        tokio::select! {
            Some(event) = rifts.next() => {
                debug!(frame = %to_publish_frame(&event), "rosbridge publish");
            }
            Some(event) = alerts.next() => {
                info!(frame = %to_publish_frame(&event), "rosbridge alert");
            }
            else => break,
        }
    }
}
