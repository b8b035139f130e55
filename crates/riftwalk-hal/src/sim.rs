//! In-process simulated sensors for tests and the demo binary.
//!
//! [`SimCorridor`] is a planar robot standing between two parallel walls.
//! It answers range scans by ray-casting against the walls and can be
//! advanced with walk velocity commands, so a closed wall-following loop runs
//! without any hardware.  [`SimCamera`] returns frames containing a single
//! vertical step edge.
//!
//! # Example
//!
//! ```rust
//! use riftwalk_hal::scanner::RangeScanner;
//! use riftwalk_hal::sim::SimCorridor;
//!
//! let mut corridor = SimCorridor::new("base_scan", 2.0).with_lateral_offset(0.25);
//! let scan = corridor.scan().unwrap();
//! // Bearing 90° looks straight at the left wall.
//! assert!((scan.ranges()[90] - 0.75).abs() < 1e-3);
//! ```

use chrono::Utc;
use riftwalk_types::{CameraFrame, RangeSample, RiftError, SCAN_BUCKETS};

use crate::camera::Camera;
use crate::scanner::RangeScanner;

/// Readings beyond this distance are reported as `f32::INFINITY`.
pub const SIM_MAX_RANGE: f32 = 12.0;

// ────────────────────────────────────────────────────────────────────────────
// Corridor scanner
// ────────────────────────────────────────────────────────────────────────────

/// A robot inside an infinite straight corridor running along +X.
///
/// `lateral` is the robot's Y position (0 = corridor centre, positive
/// towards the left wall); `heading` is its yaw relative to the corridor
/// axis, counter-clockwise positive.  Bucket `i` of a scan looks `i` degrees
/// counter-clockwise from the robot's forward axis.
#[derive(Debug, Clone)]
pub struct SimCorridor {
    id: String,
    width: f32,
    lateral: f32,
    heading: f32,
}

impl SimCorridor {
    pub fn new(id: impl Into<String>, width: f32) -> Self {
        Self {
            id: id.into(),
            width,
            lateral: 0.0,
            heading: 0.0,
        }
    }

    pub fn with_lateral_offset(mut self, lateral: f32) -> Self {
        self.lateral = lateral;
        self
    }

    pub fn with_heading(mut self, heading: f32) -> Self {
        self.heading = heading;
        self
    }

    pub fn lateral(&self) -> f32 {
        self.lateral
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Integrate a body-frame walk command over `dt` seconds.
    pub fn advance(&mut self, linear_x: f32, linear_y: f32, angular_z: f32, dt: f32) {
        let (s, c) = self.heading.sin_cos();
        self.lateral += (linear_x * s + linear_y * c) * dt;
        self.heading += angular_z * dt;
        let half = self.width / 2.0;
        self.lateral = self.lateral.clamp(-half + 0.01, half - 0.01);
    }

    fn range_at(&self, bearing_deg: usize) -> f32 {
        let angle = (bearing_deg as f32).to_radians() + self.heading;
        let dy = angle.sin();
        let half = self.width / 2.0;
        let distance = if dy > 1e-6 {
            (half - self.lateral) / dy
        } else if dy < -1e-6 {
            (half + self.lateral) / -dy
        } else {
            f32::INFINITY
        };
        if distance > SIM_MAX_RANGE {
            f32::INFINITY
        } else {
            distance
        }
    }
}

impl RangeScanner for SimCorridor {
    fn id(&self) -> &str {
        &self.id
    }

    fn scan(&mut self) -> Result<RangeSample, RiftError> {
        let ranges = (0..SCAN_BUCKETS).map(|i| self.range_at(i)).collect();
        RangeSample::new(ranges, Utc::now())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera whose frames contain one vertical dark/bright step at
/// column `split`; with `split == 0` the frames are uniform.
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    split: u32,
}

impl SimCamera {
    pub fn new(id: impl Into<String>, width: u32, height: u32, split: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            split,
        }
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, RiftError> {
        let mut frame = CameraFrame::uniform(self.width, self.height, [40, 40, 40], Utc::now());
        let split = self.split.min(self.width) as usize;
        if split > 0 {
            let width = self.width as usize;
            for row in 0..self.height as usize {
                for col in split..width {
                    let i = (row * width + col) * 3;
                    frame.data[i..i + 3].copy_from_slice(&[220, 220, 220]);
                }
            }
        }
        Ok(frame)
    }
}
