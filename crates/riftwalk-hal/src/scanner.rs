//! Generic `RangeScanner` trait for rotating range sensors.

use riftwalk_types::{RangeSample, RiftError};

/// A rotating range scanner delivering one full rotation per call.
pub trait RangeScanner: Send {
    /// Stable identifier for this scanner, e.g. `"base_scan"`.
    fn id(&self) -> &str;

    /// Return the most recent complete rotation.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::MalformedScan`] if the device delivered a
    /// rotation with the wrong number of buckets.
    fn scan(&mut self) -> Result<RangeSample, RiftError>;
}
