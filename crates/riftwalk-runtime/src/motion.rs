//! Joint-space motion helpers.
//!
//! [`interpolate`] blends two joint maps; [`SlowMotion`] turns a start/target
//! pair and a duration into a time-parameterised trajectory that the facade
//! samples at its control rate.  [`ShutdownSignal`] lets a long motion stop
//! cooperatively between ticks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use riftwalk_types::JointAngleMap;

/// `a * coef_a + b * (1 - coef_a)` for every joint of `a`.
///
/// Joints of `a` missing from `b` keep their value from `a`; joints only in
/// `b` are ignored.
pub fn interpolate(a: &JointAngleMap, b: &JointAngleMap, coef_a: f32) -> JointAngleMap {
    a.iter()
        .map(|(joint, &va)| {
            let vb = b.get(joint).copied().unwrap_or(va);
            (joint.clone(), va * coef_a + vb * (1.0 - coef_a))
        })
        .collect()
}

/// Mean absolute per-joint difference over the joints `a` and `b` share.
///
/// Returns `0.0` when they share none.
pub fn mean_abs_distance(a: &JointAngleMap, b: &JointAngleMap) -> f32 {
    let (sum, count) = a
        .iter()
        .filter_map(|(joint, va)| b.get(joint).map(|vb| (vb - va).abs()))
        .fold((0.0_f32, 0_usize), |(s, n), d| (s + d, n + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

/// One sample of a [`SlowMotion`].
#[derive(Debug, Clone, PartialEq)]
pub enum MotionStep {
    /// Intermediate pose to command now.
    Blend(JointAngleMap),
    /// The duration has elapsed; command the target itself.
    Done,
}

/// How an interpolated motion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The target was published after `ticks` intermediate commands.
    Completed { ticks: u32 },
    /// Shutdown was requested after `ticks` intermediate commands.
    Cancelled { ticks: u32 },
}

/// Linear joint-space trajectory from `start` to `target` over `duration`.
#[derive(Debug, Clone)]
pub struct SlowMotion {
    start: JointAngleMap,
    target: JointAngleMap,
    duration: Duration,
}

impl SlowMotion {
    /// Joints of `target` that `start` does not know are left out.
    pub fn new(start: JointAngleMap, target: JointAngleMap, duration: Duration) -> Self {
        let target = target
            .into_iter()
            .filter(|(joint, _)| start.contains_key(joint))
            .collect();
        Self {
            start,
            target,
            duration,
        }
    }

    pub fn target(&self) -> &JointAngleMap {
        &self.target
    }

    /// Pose at `elapsed` since the motion began.
    ///
    /// A zero duration is done immediately.
    pub fn sample(&self, elapsed: Duration) -> MotionStep {
        if elapsed >= self.duration {
            return MotionStep::Done;
        }
        let ratio = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        MotionStep::Blend(interpolate(&self.target, &self.start, ratio))
    }
}

/// Cloneable, cooperative stop flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f32)]) -> JointAngleMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn interpolate_endpoints_and_midpoint() {
        let a = map(&[("j1", 1.0), ("j2", -1.0)]);
        let b = map(&[("j1", 0.0), ("j2", 1.0)]);
        assert_eq!(interpolate(&a, &b, 1.0), a);
        assert_eq!(interpolate(&a, &b, 0.0), b);
        let mid = interpolate(&a, &b, 0.5);
        assert!((mid["j1"] - 0.5).abs() < 1e-6);
        assert!(mid["j2"].abs() < 1e-6);
    }

    #[test]
    fn interpolate_keeps_joints_missing_from_b() {
        let a = map(&[("j1", 1.0), ("j2", 2.0)]);
        let b = map(&[("j1", 0.0), ("j9", 5.0)]);
        let out = interpolate(&a, &b, 0.25);
        assert_eq!(out.len(), 2);
        assert!((out["j1"] - 0.25).abs() < 1e-6);
        assert_eq!(out["j2"], 2.0);
    }

    #[test]
    fn distance_is_mean_absolute_difference() {
        let a = map(&[("j1", 0.0), ("j2", 1.0)]);
        let b = map(&[("j1", 0.5), ("j2", 0.0)]);
        assert!((mean_abs_distance(&a, &b) - 0.75).abs() < 1e-6);
        assert_eq!(mean_abs_distance(&a, &JointAngleMap::new()), 0.0);
    }

    #[test]
    fn slow_motion_progresses_towards_target() {
        let start = map(&[("j1", 0.0)]);
        let target = map(&[("j1", 1.0), ("ghost", 3.0)]);
        let motion = SlowMotion::new(start, target, Duration::from_secs(2));
        assert_eq!(motion.target().len(), 1);

        match motion.sample(Duration::from_millis(500)) {
            MotionStep::Blend(pose) => assert!((pose["j1"] - 0.25).abs() < 1e-5),
            MotionStep::Done => panic!("motion finished early"),
        }
        assert_eq!(motion.sample(Duration::from_secs(2)), MotionStep::Done);
    }

    #[test]
    fn zero_duration_is_immediately_done() {
        let motion = SlowMotion::new(map(&[("j1", 0.0)]), map(&[("j1", 1.0)]), Duration::ZERO);
        assert_eq!(motion.sample(Duration::ZERO), MotionStep::Done);
    }

    #[test]
    fn shutdown_signal_is_shared_between_clones() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        assert!(!other.is_triggered());
        signal.trigger();
        assert!(other.is_triggered());
    }
}
