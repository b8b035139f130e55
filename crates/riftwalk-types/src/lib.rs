use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Joint name → angle in radians.
///
/// Ordered by joint name so that published commands and logged snapshots are
/// deterministic.
pub type JointAngleMap = BTreeMap<String, f32>;

/// Number of angular buckets in one scanner rotation (1° resolution).
pub const SCAN_BUCKETS: usize = 360;

/// One full rotation of the range scanner.
///
/// Always exactly [`SCAN_BUCKETS`] readings long; index `i` is the distance
/// (metres) measured at bearing `i` degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSample {
    ranges: Vec<f32>,
    stamp: DateTime<Utc>,
}

impl RangeSample {
    /// Wrap a raw scan.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::MalformedScan`] when `ranges` does not hold
    /// exactly [`SCAN_BUCKETS`] readings.
    pub fn new(ranges: Vec<f32>, stamp: DateTime<Utc>) -> Result<Self, RiftError> {
        if ranges.len() != SCAN_BUCKETS {
            return Err(RiftError::MalformedScan {
                expected: SCAN_BUCKETS,
                got: ranges.len(),
            });
        }
        Ok(Self { ranges, stamp })
    }

    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp
    }
}

/// A raw RGB24 image frame returned by a camera driver.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row-major, interleaved 3-channel pixel data (`width * height * 3` bytes).
    pub data: Vec<u8>,
    /// Capture time.
    pub stamp: DateTime<Utc>,
}

impl CameraFrame {
    /// Build a frame where every pixel has the same color.
    pub fn uniform(width: u32, height: u32, rgb: [u8; 3], stamp: DateTime<Utc>) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            data: rgb.iter().copied().cycle().take(pixels * 3).collect(),
            stamp,
        }
    }
}

/// A single point expressed in the world frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The world-frame rift points produced from one camera frame.
///
/// `Empty` is a first-class value: "no rifts in this frame" must never be
/// confused with a point at the origin or with "no message sent".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum WorldPointSet {
    Empty,
    /// Build through [`WorldPointSet::from_points`].
    Points(NonEmptyPoints),
}

/// A point list holding at least one point.
///
/// Only [`WorldPointSet::from_points`] constructs one; deserialising an empty
/// list fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WorldPoint>", into = "Vec<WorldPoint>")]
pub struct NonEmptyPoints(Vec<WorldPoint>);

impl TryFrom<Vec<WorldPoint>> for NonEmptyPoints {
    type Error = RiftError;

    fn try_from(points: Vec<WorldPoint>) -> Result<Self, Self::Error> {
        if points.is_empty() {
            Err(RiftError::InvalidGeometry(
                "a non-empty point set needs at least one point".to_string(),
            ))
        } else {
            Ok(Self(points))
        }
    }
}

impl From<NonEmptyPoints> for Vec<WorldPoint> {
    fn from(points: NonEmptyPoints) -> Self {
        points.0
    }
}

impl WorldPointSet {
    /// Wrap `points`, collapsing an empty vector into [`WorldPointSet::Empty`].
    pub fn from_points(points: Vec<WorldPoint>) -> Self {
        NonEmptyPoints::try_from(points).map_or(Self::Empty, Self::Points)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn len(&self) -> usize {
        self.points().len()
    }

    pub fn points(&self) -> &[WorldPoint] {
        match self {
            Self::Empty => &[],
            Self::Points(points) => &points.0,
        }
    }
}

/// Planar locomotion command: linear velocity (m/s) and yaw rate (rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twist {
    pub linear_x: f32,
    pub linear_y: f32,
    pub angular_z: f32,
}

/// A single scalar position command addressed to one joint channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointCommand {
    /// Fully qualified channel, e.g. `"/phantomx/j_c1_lf_position_controller/command"`.
    pub channel: String,
    pub joint: String,
    pub angle_rad: f32,
}

/// Unified event wrapper for the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Channel name the event is addressed to, e.g. `"/phantomx/cmd_vel"`.
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a new event with a fresh id and the current wall-clock time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data that can be routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// One camera frame's worth of projected rift points.
    Rifts {
        frame_stamp: DateTime<Utc>,
        cloud: WorldPointSet,
    },
    JointCommand(JointCommand),
    Velocity(Twist),
    /// A recovered, non-fatal fault (skipped frame, dropped command, ...).
    Fault { component: String, message: String },
}

/// Error type shared by every riftwalk crate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiftError {
    /// Non-positive standoff distance, zero image width, bad field of view or
    /// a non-orthonormal rotation.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Malformed bucket window selection, or a degenerate window mean.
    #[error("Invalid range window: {0}")]
    InvalidRange(String),

    #[error("Pose unavailable ({world_frame} -> {body_frame}): {reason}")]
    PoseUnavailable {
        world_frame: String,
        body_frame: String,
        reason: String,
    },

    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Not initialized: {0}")]
    NotInitialized(String),

    #[error("Malformed scan: expected {expected} buckets, got {got}")]
    MalformedScan { expected: usize, got: usize },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Joint schema mismatch: {names} names but {positions} positions")]
    SchemaMismatch { names: usize, positions: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_sample_rejects_wrong_length() {
        let err = RangeSample::new(vec![1.0; 12], Utc::now()).unwrap_err();
        assert_eq!(
            err,
            RiftError::MalformedScan {
                expected: SCAN_BUCKETS,
                got: 12
            }
        );
        assert!(RangeSample::new(vec![1.0; SCAN_BUCKETS], Utc::now()).is_ok());
    }

    #[test]
    fn uniform_frame_has_rgb_layout() {
        let frame = CameraFrame::uniform(4, 2, [10, 20, 30], Utc::now());
        assert_eq!(frame.data.len(), 4 * 2 * 3);
        assert_eq!(&frame.data[..6], &[10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn world_point_set_from_empty_vec_is_empty() {
        let set = WorldPointSet::from_points(Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set, WorldPointSet::Empty);
    }

    #[test]
    fn world_point_set_keeps_points() {
        let set = WorldPointSet::from_points(vec![WorldPoint::new(0.0, 0.0, 0.0)]);
        assert!(!set.is_empty());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_set_serializes_distinctly_from_origin_point() {
        let empty = serde_json::to_string(&WorldPointSet::Empty).unwrap();
        let origin =
            serde_json::to_string(&WorldPointSet::from_points(vec![WorldPoint::new(0.0, 0.0, 0.0)]))
                .unwrap();
        assert_ne!(empty, origin);
        assert!(empty.contains("empty"));

        let back: WorldPointSet = serde_json::from_str(&empty).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn points_variant_never_holds_an_empty_list() {
        let forged = r#"{"kind":"points","points":[]}"#;
        assert!(serde_json::from_str::<WorldPointSet>(forged).is_err());

        let one = r#"{"kind":"points","points":[{"x":1.0,"y":2.0,"z":3.0}]}"#;
        let set: WorldPointSet = serde_json::from_str(one).unwrap();
        assert_eq!(set.points(), &[WorldPoint::new(1.0, 2.0, 3.0)]);
        assert!(NonEmptyPoints::try_from(Vec::new()).is_err());
    }

    #[test]
    fn event_roundtrip() {
        let event = Event::new(
            "/phantomx/cmd_vel",
            EventPayload::Velocity(Twist {
                linear_x: 0.1,
                linear_y: 0.0,
                angular_z: -0.3,
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(event.source, back.source);
        match back.payload {
            EventPayload::Velocity(twist) => {
                assert!((twist.angular_z - (-0.3)).abs() < f32::EPSILON);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn rift_error_display() {
        let err = RiftError::PoseUnavailable {
            world_frame: "map".to_string(),
            body_frame: "base_link".to_string(),
            reason: "no path".to_string(),
        };
        assert!(err.to_string().contains("base_link"));

        let err2 = RiftError::MalformedScan {
            expected: 360,
            got: 12,
        };
        assert!(err2.to_string().contains("360"));
    }
}
