//! Transform Frame (TF) Engine and pose types.
//!
//! Maintains a directed graph of named reference frames and the timestamped
//! 3-D rigid-body transforms (translation + quaternion rotation) that relate
//! them.  Given any two frame names the engine composes a chain of transforms
//! via BFS and hands it out as a [`Pose`]: a translation plus an orthonormal
//! 3×3 rotation matrix, which is what the projection pipeline consumes.
//!
//! # Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use riftwalk_perception::transform::{
//!     PoseProvider, PoseQuery, Quaternion, TfEngine, Transform3D, Vec3,
//! };
//!
//! let mut tf = TfEngine::new(Duration::milliseconds(500));
//! let now = Utc::now();
//!
//! // base_link is 1 m forward of the map origin, same orientation.
//! tf.set_transform("map", "base_link",
//!     Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()), now);
//!
//! let pose = tf.lookup_pose("map", "base_link", PoseQuery::At(now)).unwrap();
//! assert!((pose.translation().x - 1.0).abs() < 1e-5);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use riftwalk_types::RiftError;

/// Tolerance used when checking that a rotation matrix is orthonormal.
pub const ORTHONORMAL_TOLERANCE: f32 = 1e-4;

// ────────────────────────────────────────────────────────────────────────────
// Primitive types
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1); [`Quaternion::normalized`] repairs drift.
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Scale to unit length.  A zero quaternion becomes the identity.
    pub fn normalized(self) -> Self {
        let n = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if n <= f32::EPSILON || !n.is_finite() {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Static-axis roll/pitch/yaw angles (radians) of this rotation.
    ///
    /// Inverse of [`Rotation3::from_euler`]: the returned triple rebuilds the
    /// same rotation as `Rz(yaw) · Ry(pitch) · Rx(roll)`.
    pub fn to_euler(self) -> (f32, f32, f32) {
        let q = self.normalized();
        let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
        let pitch = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
        (roll, pitch, yaw)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rotation3
// ────────────────────────────────────────────────────────────────────────────

/// A 3×3 rotation matrix, stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation3 {
    pub m: [[f32; 3]; 3],
}

impl Rotation3 {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Build `Rz(yaw) · Ry(pitch) · Rx(roll)`: roll about the fixed X axis is
    /// applied first, then pitch about Y, then yaw about Z.
    pub fn from_euler(roll: f32, pitch: f32, yaw: f32) -> Self {
        let (sr, cr) = roll.sin_cos();
        let (sp, cp) = pitch.sin_cos();
        let (sy, cy) = yaw.sin_cos();
        Self {
            m: [
                [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
                [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
                [-sp, cp * sr, cp * cr],
            ],
        }
    }

    /// Matrix–vector product.
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let r = &self.m;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Matrix product `self · rhs`.
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [[0.0_f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Self { m: out }
    }

    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// `true` when `Rᵀ·R ≈ I` and `det R ≈ 1` within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f32) -> bool {
        let rtr = self.transpose().mul(self);
        let identity = Self::identity();
        let columns_ok = (0..3).all(|i| (0..3).all(|j| (rtr.m[i][j] - identity.m[i][j]).abs() <= tolerance));
        columns_ok && (self.determinant() - 1.0).abs() <= tolerance
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// Position and orientation of a body frame in the world frame.
///
/// The rotation is guaranteed orthonormal with determinant 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    translation: Vec3,
    rotation: Rotation3,
}

impl Pose {
    /// # Errors
    ///
    /// Returns [`RiftError::InvalidGeometry`] if `rotation` is not a proper
    /// rotation (orthonormal, det = 1) or any component is non-finite.
    pub fn new(translation: Vec3, rotation: Rotation3) -> Result<Self, RiftError> {
        let finite = [translation.x, translation.y, translation.z]
            .iter()
            .chain(rotation.m.iter().flatten())
            .all(|v| v.is_finite());
        if !finite {
            return Err(RiftError::InvalidGeometry("pose has non-finite components".to_string()));
        }
        if !rotation.is_orthonormal(ORTHONORMAL_TOLERANCE) {
            return Err(RiftError::InvalidGeometry(format!(
                "rotation is not orthonormal (det = {})",
                rotation.determinant()
            )));
        }
        Ok(Self {
            translation,
            rotation,
        })
    }

    /// Build a pose from roll/pitch/yaw, which is always a proper rotation.
    pub fn from_euler(translation: Vec3, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            translation,
            rotation: Rotation3::from_euler(roll, pitch, yaw),
        }
    }

    pub fn identity() -> Self {
        Self::from_euler(Vec3::zero(), 0.0, 0.0, 0.0)
    }

    /// Convert a quaternion transform via its roll/pitch/yaw angles.
    pub fn from_transform(transform: &Transform3D) -> Self {
        let (roll, pitch, yaw) = transform.rotation.to_euler();
        Self::from_euler(transform.translation, roll, pitch, yaw)
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> &Rotation3 {
        &self.rotation
    }

    /// Map a body-frame point into the world frame: rotate, then translate.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.apply(p).add(self.translation)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
///
/// Represents the pose of frame B relative to frame A: to convert a point
/// expressed in frame B into frame A, rotate it by `rotation` then add
/// `translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Compose two transforms: if `self` = T_A_B and `other` = T_B_C, the
    /// result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation.add(self.rotation.rotate(other.translation));
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose provider seam
// ────────────────────────────────────────────────────────────────────────────

/// Which transform estimate a lookup should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseQuery {
    /// The most recent estimate, however old.
    Latest,
    /// An estimate valid at the given instant; stale estimates are rejected.
    At(DateTime<Utc>),
}

/// Supplies the pose of a body frame in a world frame on demand.
pub trait PoseProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RiftError::PoseUnavailable`] when the transform is unknown or
    /// has expired for the requested time.
    fn lookup_pose(
        &self,
        world_frame: &str,
        body_frame: &str,
        at: PoseQuery,
    ) -> Result<Pose, RiftError>;
}

// ────────────────────────────────────────────────────────────────────────────
// TfEngine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct StampedTransform {
    transform: Transform3D,
    /// `None` for static transforms, which never expire.
    stamp: Option<DateTime<Utc>>,
}

/// A directed graph of named reference frames and the timestamped
/// [`Transform3D`]s that relate them.
///
/// Edges are directional: adding `"A" → "B"` does not create the inverse.
/// A dynamic edge is usable for a [`PoseQuery::At`] lookup only while the
/// query time lies within `max_age` of the edge's stamp.
#[derive(Debug)]
pub struct TfEngine {
    /// `edges[from][to] = StampedTransform`
    edges: HashMap<String, HashMap<String, StampedTransform>>,
    max_age: Duration,
}

impl Default for TfEngine {
    fn default() -> Self {
        Self::new(Duration::seconds(1))
    }
}

impl TfEngine {
    pub fn new(max_age: Duration) -> Self {
        Self {
            edges: HashMap::new(),
            max_age,
        }
    }

    /// Register or update the dynamic transform from `parent_frame` to
    /// `child_frame`, measured at `stamp`.
    pub fn set_transform(
        &mut self,
        parent_frame: &str,
        child_frame: &str,
        transform: Transform3D,
        stamp: DateTime<Utc>,
    ) {
        self.insert(parent_frame, child_frame, transform, Some(stamp));
    }

    /// Register a transform that never expires (sensor mounts and the like).
    pub fn set_static_transform(&mut self, parent_frame: &str, child_frame: &str, transform: Transform3D) {
        self.insert(parent_frame, child_frame, transform, None);
    }

    fn insert(
        &mut self,
        parent_frame: &str,
        child_frame: &str,
        transform: Transform3D,
        stamp: Option<DateTime<Utc>>,
    ) {
        self.edges
            .entry(parent_frame.to_string())
            .or_default()
            .insert(child_frame.to_string(), StampedTransform { transform, stamp });
    }

    /// Compute the composed [`Transform3D`] that maps points in
    /// `target_frame` into `source_frame`, ignoring transform age.
    ///
    /// Returns `None` if no path exists between the two frames.
    pub fn lookup(&self, source_frame: &str, target_frame: &str) -> Option<Transform3D> {
        self.lookup_at(source_frame, target_frame, PoseQuery::Latest).ok()
    }

    /// Like [`TfEngine::lookup`] but honouring the staleness rule of `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::PoseUnavailable`] when no path exists, or when
    /// the only paths run through expired transforms.
    pub fn lookup_at(
        &self,
        source_frame: &str,
        target_frame: &str,
        query: PoseQuery,
    ) -> Result<Transform3D, RiftError> {
        if source_frame == target_frame {
            return Ok(Transform3D::identity());
        }

        // BFS over the directed graph; each queue item carries the composed
        // transform accumulated from source_frame to the current node.
        let mut queue: VecDeque<(String, Transform3D)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut saw_expired = false;

        queue.push_back((source_frame.to_string(), Transform3D::identity()));
        visited.insert(source_frame.to_string());

        while let Some((current, accumulated)) = queue.pop_front() {
            let Some(neighbours) = self.edges.get(&current) else {
                continue;
            };
            for (next, edge) in neighbours {
                if visited.contains(next) {
                    continue;
                }
                if !self.is_fresh(edge, query) {
                    saw_expired = true;
                    continue;
                }
                let composed = accumulated.compose(edge.transform);
                if next == target_frame {
                    return Ok(composed);
                }
                visited.insert(next.clone());
                queue.push_back((next.clone(), composed));
            }
        }

        let reason = if saw_expired {
            "transform expired"
        } else {
            "no transform path"
        };
        Err(RiftError::PoseUnavailable {
            world_frame: source_frame.to_string(),
            body_frame: target_frame.to_string(),
            reason: reason.to_string(),
        })
    }

    fn is_fresh(&self, edge: &StampedTransform, query: PoseQuery) -> bool {
        match (edge.stamp, query) {
            (None, _) | (_, PoseQuery::Latest) => true,
            (Some(stamp), PoseQuery::At(at)) => {
                let offset = at - stamp;
                offset <= self.max_age && -offset <= self.max_age
            }
        }
    }
}

impl PoseProvider for TfEngine {
    fn lookup_pose(
        &self,
        world_frame: &str,
        body_frame: &str,
        at: PoseQuery,
    ) -> Result<Pose, RiftError> {
        self.lookup_at(world_frame, body_frame, at)
            .map(|t| Pose::from_transform(&t))
    }
}

/// Lets a transform tree be shared between the writer feeding it and the
/// facade reading it.
impl PoseProvider for RwLock<TfEngine> {
    fn lookup_pose(
        &self,
        world_frame: &str,
        body_frame: &str,
        at: PoseQuery,
    ) -> Result<Pose, RiftError> {
        let tf = self.read().map_err(|_| RiftError::PoseUnavailable {
            world_frame: world_frame.to_string(),
            body_frame: body_frame.to_string(),
            reason: "transform tree lock poisoned".to_string(),
        })?;
        tf.lookup_pose(world_frame, body_frame, at)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5 && (a.z - b.z).abs() < 1e-5
    }

    // ── Quaternion ──────────────────────────────────────────────────────────

    #[test]
    fn quaternion_90deg_yaw_rotates_x_to_y() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let r = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(r, Vec3::new(0.0, 1.0, 0.0)), "got {r:?}");
    }

    #[test]
    fn quaternion_to_euler_recovers_yaw() {
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let (roll, pitch, yaw) = q.to_euler();
        assert!(roll.abs() < 1e-5);
        assert!(pitch.abs() < 1e-5);
        assert!((yaw - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn zero_quaternion_normalizes_to_identity() {
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(), Quaternion::identity());
    }

    // ── Rotation3 ───────────────────────────────────────────────────────────

    #[test]
    fn euler_matrix_matches_quaternion_rotation() {
        // Arbitrary attitude: compare matrix path against quaternion path.
        let (roll, pitch, yaw) = (0.3_f32, -0.2_f32, 1.1_f32);
        let half = |a: f32| (a / 2.0).sin_cos();
        let (sr, cr) = half(roll);
        let (sp, cp) = half(pitch);
        let (sy, cy) = half(yaw);
        let qx = Quaternion::new(cr, sr, 0.0, 0.0);
        let qy = Quaternion::new(cp, 0.0, sp, 0.0);
        let qz = Quaternion::new(cy, 0.0, 0.0, sy);
        let q = qz.mul(qy).mul(qx);

        let m = Rotation3::from_euler(roll, pitch, yaw);
        let v = Vec3::new(0.4, -1.2, 2.5);
        assert!(approx(m.apply(v), q.rotate(v)));

        let (r2, p2, y2) = q.to_euler();
        assert!((r2 - roll).abs() < 1e-4);
        assert!((p2 - pitch).abs() < 1e-4);
        assert!((y2 - yaw).abs() < 1e-4);
    }

    #[test]
    fn euler_matrix_is_orthonormal() {
        let m = Rotation3::from_euler(0.7, -1.3, 2.9);
        assert!(m.is_orthonormal(ORTHONORMAL_TOLERANCE));
        assert!((m.determinant() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pose_rejects_reflection() {
        let mut m = Rotation3::identity();
        m.m[2][2] = -1.0;
        assert!(matches!(
            Pose::new(Vec3::zero(), m),
            Err(RiftError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn pose_rejects_scaled_matrix() {
        let mut m = Rotation3::identity();
        m.m[0][0] = 2.0;
        assert!(Pose::new(Vec3::zero(), m).is_err());
    }

    #[test]
    fn pose_transform_point_rotates_then_translates() {
        let pose = Pose::from_euler(Vec3::new(1.0, 2.0, 3.0), 0.0, 0.0, FRAC_PI_2);
        let p = pose.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(p, Vec3::new(1.0, 3.0, 3.0)), "got {p:?}");
    }

    // ── TfEngine ────────────────────────────────────────────────────────────

    #[test]
    fn lookup_same_frame_returns_identity() {
        let tf = TfEngine::default();
        assert_eq!(tf.lookup("map", "map"), Some(Transform3D::identity()));
    }

    #[test]
    fn lookup_composed_chain_with_static_mount() {
        let now = Utc::now();
        let mut tf = TfEngine::default();
        tf.set_transform(
            "map",
            "base_link",
            Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
            now,
        );
        tf.set_static_transform(
            "base_link",
            "camera",
            Transform3D::new(Vec3::new(0.5, 0.0, 0.0), Quaternion::identity()),
        );

        let pose = tf.lookup_pose("map", "camera", PoseQuery::At(now)).unwrap();
        assert!((pose.translation().x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn lookup_respects_rotation_in_chain() {
        let q90z = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let now = Utc::now();
        let mut tf = TfEngine::default();
        tf.set_transform("map", "base_link", Transform3D::new(Vec3::zero(), q90z), now);
        tf.set_static_transform(
            "base_link",
            "camera",
            Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
        );

        let t = tf.lookup("map", "camera").unwrap();
        assert!(approx(t.translation, Vec3::new(0.0, 1.0, 0.0)), "got {:?}", t.translation);
    }

    #[test]
    fn lookup_no_path_is_unavailable() {
        let tf = TfEngine::default();
        let err = tf
            .lookup_pose("map", "ghost", PoseQuery::Latest)
            .unwrap_err();
        match err {
            RiftError::PoseUnavailable { reason, .. } => assert_eq!(reason, "no transform path"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn expired_transform_is_unavailable_but_latest_still_works() {
        let stamp = Utc::now();
        let mut tf = TfEngine::new(Duration::milliseconds(100));
        tf.set_transform("map", "base_link", Transform3D::identity(), stamp);

        let later = stamp + Duration::seconds(2);
        let err = tf
            .lookup_pose("map", "base_link", PoseQuery::At(later))
            .unwrap_err();
        match err {
            RiftError::PoseUnavailable { reason, .. } => assert_eq!(reason, "transform expired"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(tf.lookup_pose("map", "base_link", PoseQuery::Latest).is_ok());
    }

    #[test]
    fn static_transform_never_expires() {
        let mut tf = TfEngine::new(Duration::milliseconds(1));
        tf.set_static_transform("map", "base_link", Transform3D::identity());
        let far_future = Utc::now() + Duration::days(30);
        assert!(tf.lookup_pose("map", "base_link", PoseQuery::At(far_future)).is_ok());
    }

    #[test]
    fn set_transform_overrides_previous() {
        let now = Utc::now();
        let mut tf = TfEngine::default();
        tf.set_transform(
            "map",
            "base_link",
            Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
            now,
        );
        tf.set_transform(
            "map",
            "base_link",
            Transform3D::new(Vec3::new(5.0, 0.0, 0.0), Quaternion::identity()),
            now,
        );
        let t = tf.lookup("map", "base_link").unwrap();
        assert!((t.translation.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn rwlock_wrapped_engine_is_a_pose_provider() {
        let now = Utc::now();
        let shared = RwLock::new(TfEngine::default());
        shared.write().unwrap().set_transform(
            "map",
            "base_link",
            Transform3D::new(Vec3::new(0.0, 2.0, 0.0), Quaternion::identity()),
            now,
        );
        let provider: &dyn PoseProvider = &shared;
        let pose = provider.lookup_pose("map", "base_link", PoseQuery::At(now)).unwrap();
        assert!((pose.translation().y - 2.0).abs() < 1e-5);
    }
}
