//! `riftwalk-perception` – from raw sensor data to world-frame rift points.
//!
//! # Modules
//!
//! - [`range`] – [`RangeBuffer`][range::RangeBuffer]: the latest scanner
//!   rotation with staleness tracking and windowed means.
//! - [`edges`] – [`EdgeDetector`][edges::EdgeDetector]: smoothing, median
//!   filtering and hysteresis-thresholded gradients that turn a color frame
//!   into edge pixels.
//! - [`projector`] – [`FrameProjector`][projector::FrameProjector]: pinhole
//!   projection of edge pixels onto the standoff plane and into the world
//!   frame.
//! - [`transform`] – [`TfEngine`][transform::TfEngine] and the
//!   [`PoseProvider`][transform::PoseProvider] seam: timestamped frame graph
//!   and the [`Pose`][transform::Pose] type consumed by the projector.

pub mod edges;
pub mod projector;
pub mod range;
pub mod transform;

pub use edges::{EdgeDetector, EdgePixel, EdgePixelSet};
pub use projector::FrameProjector;
pub use range::{BucketWindow, RangeBuffer};
pub use transform::{Pose, PoseProvider, PoseQuery, TfEngine};
