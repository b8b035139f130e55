//! The robot facade: the one component that talks to the transport.
//!
//! [`RobotFacade`] owns the sensor state (latest range scan, controller
//! timing, joint table) behind per-structure mutexes, so each sensor callback
//! may run on its own task.  The algorithmic pieces it drives
//! ([`EdgeDetector`], [`FrameProjector`], [`WallFollowController`]) only see
//! the values handed to them for one call.
//!
//! Per-frame and per-tick failures are logged, reported on
//! [`Topic::SystemAlerts`] where they cost a frame, and never stop the loop.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use riftwalk_hal::WallFollowController;
use riftwalk_middleware::{EventBus, Topic};
use riftwalk_perception::{BucketWindow, EdgeDetector, FrameProjector, PoseProvider, PoseQuery, RangeBuffer};
use riftwalk_types::{
    CameraFrame, Event, EventPayload, JointAngleMap, JointCommand, RangeSample, RiftError, Twist,
};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::config::{PoseLookup, RobotConfig};
use crate::motion::{MotionOutcome, MotionStep, ShutdownSignal, SlowMotion};

/// What happened to one camera frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A rift message was published; `points == 0` means an explicit empty set.
    Published { points: usize },
    /// The frame was dropped; the reason was logged and raised as an alert.
    Skipped { reason: RiftError },
}

/// Joint schema and latest reported angles; the schema is fixed by the first
/// joint-state report.
#[derive(Debug)]
struct JointTable {
    angles: JointAngleMap,
    channels: BTreeMap<String, String>,
}

pub struct RobotFacade {
    config: RobotConfig,
    bus: EventBus,
    poses: Arc<dyn PoseProvider>,
    detector: EdgeDetector,
    projector: FrameProjector,
    standoff_window: BucketWindow,
    left_window: BucketWindow,
    right_window: BucketWindow,
    ranges: Mutex<RangeBuffer>,
    controller: Mutex<WallFollowController>,
    joints: Mutex<Option<JointTable>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RobotFacade {
    /// # Errors
    ///
    /// Any [`RiftError::Config`] from [`RobotConfig::validate`]; this is the
    /// only fatal error path of the facade.
    pub fn new(config: RobotConfig, bus: EventBus, poses: Arc<dyn PoseProvider>) -> Result<Self, RiftError> {
        config.validate()?;
        let detector = EdgeDetector::new(
            config.edge_low_threshold,
            config.edge_high_threshold,
            config.kernel_size,
        )?;
        let projector =
            FrameProjector::new(config.horizontal_fov).map_err(|e| RiftError::Config(e.to_string()))?;
        let controller = WallFollowController::new(config.kp, config.ki)?;
        let standoff_window = config.standoff_window.to_window()?;
        let left_window = config.wall_follow.left_window.to_window()?;
        let right_window = config.wall_follow.right_window.to_window()?;

        info!(
            namespace = %config.namespace,
            fov = config.horizontal_fov,
            kp = config.kp,
            ki = config.ki,
            "robot facade ready"
        );

        Ok(Self {
            config,
            bus,
            poses,
            detector,
            projector,
            standoff_window,
            left_window,
            right_window,
            ranges: Mutex::new(RangeBuffer::new()),
            controller: Mutex::new(controller),
            joints: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ── Range scans ─────────────────────────────────────────────────────────

    /// Store a new scan and, when wall following is enabled, run one
    /// controller tick and publish the resulting walk command.
    ///
    /// Returns the turn rate sent, if any.
    #[instrument(level = "debug", skip_all, fields(stamp = %sample.stamp()))]
    pub fn on_range_scan(&self, sample: RangeSample) -> Result<Option<f32>, RiftError> {
        let stamp = sample.stamp();
        lock(&self.ranges).update(sample);

        if !self.config.wall_follow.enabled {
            return Ok(None);
        }
        let turn = self.follow_wall(stamp)?;
        self.set_walk_velocity(self.config.wall_follow.linear_speed, 0.0, turn);
        Ok(Some(turn))
    }

    /// One controller tick from the current left/right window means.
    pub fn follow_wall(&self, now: DateTime<Utc>) -> Result<f32, RiftError> {
        let (left, right) = {
            let ranges = lock(&self.ranges);
            (
                ranges.windowed_mean(self.left_window)?,
                ranges.windowed_mean(self.right_window)?,
            )
        };
        let turn = lock(&self.controller).update(left, right, now)?;
        debug!(left, right, turn, "wall follow tick");
        Ok(turn)
    }

    // ── Camera frames ───────────────────────────────────────────────────────

    /// Detect edges, project them with the current standoff and pose, and
    /// publish the frame's point set as one message.
    ///
    /// # Errors
    ///
    /// Only a malformed frame is an error.  A missing pose, missing range
    /// data, or bad geometry skips the frame and is reported in the
    /// returned [`FrameOutcome`].
    #[instrument(level = "debug", skip_all, fields(width = frame.width, height = frame.height))]
    pub fn on_camera_frame(&self, frame: &CameraFrame) -> Result<FrameOutcome, RiftError> {
        let edges = self.detector.detect(frame)?;
        let standoff = lock(&self.ranges).windowed_mean(self.standoff_window);

        let query = match self.config.pose_lookup {
            PoseLookup::Latest => PoseQuery::Latest,
            PoseLookup::FrameStamp => PoseQuery::At(frame.stamp),
        };
        let pose = match self
            .poses
            .lookup_pose(&self.config.world_frame, &self.config.body_frame, query)
        {
            Ok(pose) => pose,
            Err(e) => return Ok(self.skip_frame(e)),
        };

        // An empty edge set needs no standoff; publish it even before the
        // first scan arrives.
        let standoff = match standoff {
            Ok(d) => d,
            Err(_) if edges.is_empty() => 0.0,
            Err(e) => return Ok(self.skip_frame(e)),
        };

        let cloud = match self.projector.project(&edges, standoff, &pose, frame.width) {
            Ok(cloud) => cloud,
            Err(e) => return Ok(self.skip_frame(e)),
        };
        let points = cloud.len();
        debug!(edges = edges.len(), points, standoff, "frame projected");

        self.bus.publish_to(
            Topic::Rifts,
            Event::new(
                self.config.rifts_channel(),
                EventPayload::Rifts {
                    frame_stamp: frame.stamp,
                    cloud,
                },
            ),
        );
        Ok(FrameOutcome::Published { points })
    }

    fn skip_frame(&self, reason: RiftError) -> FrameOutcome {
        warn!(error = %reason, "camera frame skipped");
        self.report_fault("projection", &reason);
        FrameOutcome::Skipped { reason }
    }

    fn report_fault(&self, component: &str, error: &RiftError) {
        self.bus.publish_to(
            Topic::SystemAlerts,
            Event::new(
                self.config.alerts_channel(),
                EventPayload::Fault {
                    component: component.to_string(),
                    message: error.to_string(),
                },
            ),
        );
    }

    // ── Joint state ─────────────────────────────────────────────────────────

    /// Ingest one joint-state report.
    ///
    /// The first report fixes the joint schema.  Later reports only update
    /// known joints; unknown names are logged and dropped.  Returns how many
    /// names were dropped.
    ///
    /// # Errors
    ///
    /// [`RiftError::SchemaMismatch`] when `names` and `positions` differ in
    /// length; nothing is updated in that case.
    pub fn on_joint_state(&self, names: &[String], positions: &[f32]) -> Result<usize, RiftError> {
        if names.len() != positions.len() {
            return Err(RiftError::SchemaMismatch {
                names: names.len(),
                positions: positions.len(),
            });
        }

        let mut joints = lock(&self.joints);
        let Some(table) = joints.as_mut() else {
            let angles: JointAngleMap = names.iter().cloned().zip(positions.iter().copied()).collect();
            let channels = angles
                .keys()
                .map(|joint| (joint.clone(), self.config.joint_channel(joint)))
                .collect();
            info!(joints = angles.len(), "joint schema captured");
            *joints = Some(JointTable { angles, channels });
            return Ok(0);
        };

        let mut dropped = 0;
        for (name, &position) in names.iter().zip(positions) {
            match table.angles.get_mut(name) {
                Some(angle) => *angle = position,
                None => {
                    warn!(joint = %name, "joint outside captured schema, report ignored");
                    dropped += 1;
                }
            }
        }
        Ok(dropped)
    }

    /// Latest reported angles, or `None` before the first joint-state report.
    pub fn get_angles(&self) -> Option<JointAngleMap> {
        lock(&self.joints).as_ref().map(|t| t.angles.clone())
    }

    // ── Commands ────────────────────────────────────────────────────────────

    pub fn set_walk_velocity(&self, x: f32, y: f32, turn: f32) {
        self.bus.publish_to(
            Topic::Locomotion,
            Event::new(
                self.config.velocity_channel(),
                EventPayload::Velocity(Twist {
                    linear_x: x,
                    linear_y: y,
                    angular_z: turn,
                }),
            ),
        );
    }

    /// Publish one position command per joint in `angles`.
    ///
    /// Joints outside the schema are logged and dropped.  Returns the number
    /// of commands published.
    ///
    /// # Errors
    ///
    /// [`RiftError::NotInitialized`] before the first joint-state report.
    pub fn set_angles(&self, angles: &JointAngleMap) -> Result<usize, RiftError> {
        let joints = lock(&self.joints);
        let table = joints
            .as_ref()
            .ok_or_else(|| RiftError::NotInitialized("joint schema".to_string()))?;

        let mut sent = 0;
        for (joint, &angle_rad) in angles {
            let Some(channel) = table.channels.get(joint) else {
                warn!(error = %RiftError::UnknownJoint(joint.clone()), "joint command dropped");
                continue;
            };
            self.bus.publish_to(
                Topic::JointCommands,
                Event::new(
                    channel.clone(),
                    EventPayload::JointCommand(JointCommand {
                        channel: channel.clone(),
                        joint: joint.clone(),
                        angle_rad,
                    }),
                ),
            );
            sent += 1;
        }
        Ok(sent)
    }

    /// Move linearly from the current angles to `target` over `duration`,
    /// commanding one blend per control tick, then the exact target.
    ///
    /// The shutdown signal is checked once per tick; when raised the motion
    /// stops where it is and [`MotionOutcome::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// [`RiftError::NotInitialized`] before the first joint-state report.
    #[instrument(level = "debug", skip_all, fields(joints = target.len(), duration_ms = duration.as_millis() as u64))]
    pub async fn set_angles_slow(
        &self,
        target: &JointAngleMap,
        duration: Duration,
        shutdown: &ShutdownSignal,
    ) -> Result<MotionOutcome, RiftError> {
        let start = self
            .get_angles()
            .ok_or_else(|| RiftError::NotInitialized("joint schema".to_string()))?;
        for joint in target.keys().filter(|j| !start.contains_key(*j)) {
            warn!(joint = %joint, "joint outside captured schema, dropped from motion");
        }
        let motion = SlowMotion::new(start, target.clone(), duration);

        let period = self.config.control_period()?;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let began = Instant::now();
        let mut ticks = 0_u32;

        loop {
            ticker.tick().await;
            if shutdown.is_triggered() {
                info!(ticks, "interpolated motion cancelled");
                return Ok(MotionOutcome::Cancelled { ticks });
            }
            match motion.sample(began.elapsed()) {
                MotionStep::Blend(pose) => {
                    self.set_angles(&pose)?;
                    ticks += 1;
                }
                MotionStep::Done => {
                    self.set_angles(motion.target())?;
                    debug!(ticks, "interpolated motion complete");
                    return Ok(MotionOutcome::Completed { ticks });
                }
            }
        }
    }
}
