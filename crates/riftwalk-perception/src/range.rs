//! [`RangeBuffer`] – latest scanner rotation with staleness tracking.
//!
//! The buffer always holds exactly [`SCAN_BUCKETS`] readings.  A reading that
//! arrives as NaN or ±∞ (no return, out of range) is replaced by the value
//! the buffer already held for that bucket, so gaps are filled with prior
//! data rather than poisoning every mean that touches them.
//!
//! Window selection is explicit through [`BucketWindow`]: a plain half-open
//! window `[lo, hi)`, a window that wraps through bucket 0 (`lo > hi`), or a
//! full turn.  `lo == hi` is rejected because it is ambiguous between "empty"
//! and "everything".

use chrono::{DateTime, Duration, Utc};
use riftwalk_types::{RangeSample, RiftError, SCAN_BUCKETS};
use tracing::debug;

/// A contiguous (possibly wrapping) run of scanner buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWindow {
    start: usize,
    len: usize,
}

impl BucketWindow {
    /// The half-open bucket window `[lo, hi)`.
    ///
    /// `lo > hi` selects the window that wraps through bucket 0, e.g.
    /// `BucketWindow::new(350, 10)` covers buckets 350..360 and 0..10.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::InvalidRange`] if `lo == hi`, `lo >= 360`, or
    /// `hi > 360`.
    pub fn new(lo: usize, hi: usize) -> Result<Self, RiftError> {
        if lo >= SCAN_BUCKETS || hi > SCAN_BUCKETS {
            return Err(RiftError::InvalidRange(format!(
                "window [{lo}, {hi}) exceeds the {SCAN_BUCKETS} scanner buckets"
            )));
        }
        if lo == hi {
            return Err(RiftError::InvalidRange(format!(
                "window [{lo}, {hi}) is empty; use BucketWindow::full_turn for a whole rotation"
            )));
        }
        let len = if lo < hi { hi - lo } else { SCAN_BUCKETS - lo + hi };
        Ok(Self { start: lo, len })
    }

    /// Every bucket, starting at `start` and wrapping once around.
    pub fn full_turn(start: usize) -> Result<Self, RiftError> {
        if start >= SCAN_BUCKETS {
            return Err(RiftError::InvalidRange(format!(
                "start bucket {start} exceeds the {SCAN_BUCKETS} scanner buckets"
            )));
        }
        Ok(Self {
            start,
            len: SCAN_BUCKETS,
        })
    }

    /// Number of buckets covered; at least 1.
    pub fn bucket_count(&self) -> usize {
        self.len
    }

    /// Bucket indices covered by this window, in angular order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |i| (self.start + i) % SCAN_BUCKETS)
    }
}

/// The latest full rotation of range samples.
#[derive(Debug, Clone)]
pub struct RangeBuffer {
    ranges: Vec<f32>,
    stamp: Option<DateTime<Utc>>,
}

impl Default for RangeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeBuffer {
    /// An empty buffer.  Means are unavailable until the first
    /// [`RangeBuffer::update`].
    pub fn new() -> Self {
        Self {
            ranges: vec![0.0; SCAN_BUCKETS],
            stamp: None,
        }
    }

    /// Replace the held rotation and timestamp with `sample`.
    ///
    /// Returns how many non-finite readings were filled from prior values.
    pub fn update(&mut self, sample: RangeSample) -> usize {
        let stamp = sample.stamp();
        let mut patched = 0;
        let next: Vec<f32> = sample
            .ranges()
            .iter()
            .zip(&self.ranges)
            .map(|(&reading, &prior)| {
                if reading.is_finite() {
                    reading
                } else {
                    patched += 1;
                    prior
                }
            })
            .collect();
        self.ranges = next;
        self.stamp = Some(stamp);
        if patched > 0 {
            debug!(patched, %stamp, "filled non-finite range readings from prior scan");
        }
        patched
    }

    /// Arithmetic mean of the buckets covered by `window`.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::NotInitialized`] before the first scan.
    pub fn windowed_mean(&self, window: BucketWindow) -> Result<f32, RiftError> {
        if self.stamp.is_none() {
            return Err(RiftError::NotInitialized(
                "range buffer has not received a scan".to_string(),
            ));
        }
        let sum: f64 = window.indices().map(|i| f64::from(self.ranges[i])).sum();
        let mean = (sum / window.bucket_count() as f64) as f32;
        if !mean.is_finite() {
            return Err(RiftError::InvalidRange(format!(
                "window mean over {window:?} is not finite"
            )));
        }
        Ok(mean)
    }

    /// Capture time of the held scan.
    pub fn stamp(&self) -> Option<DateTime<Utc>> {
        self.stamp
    }

    /// How old the held scan is at `now`; `None` before the first scan.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.stamp.map(|stamp| now - stamp)
    }

    /// `true` if no scan has arrived yet or the held one is older than
    /// `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now).is_none_or(|age| age > max_age)
    }

    /// The held readings, one per bucket.
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_with(f: impl Fn(usize) -> f32, stamp: DateTime<Utc>) -> RangeSample {
        RangeSample::new((0..SCAN_BUCKETS).map(f).collect(), stamp).unwrap()
    }

    #[test]
    fn window_rejects_equal_bounds() {
        assert!(matches!(
            BucketWindow::new(42, 42),
            Err(RiftError::InvalidRange(_))
        ));
    }

    #[test]
    fn window_rejects_out_of_range_bounds() {
        assert!(BucketWindow::new(360, 10).is_err());
        assert!(BucketWindow::new(10, 361).is_err());
        assert!(BucketWindow::full_turn(360).is_err());
    }

    #[test]
    fn wrapping_window_covers_both_ends() {
        let w = BucketWindow::new(358, 2).unwrap();
        assert_eq!(w.bucket_count(), 4);
        assert_eq!(w.indices().collect::<Vec<_>>(), vec![358, 359, 0, 1]);
    }

    #[test]
    fn upper_bound_of_360_reaches_last_bucket() {
        let w = BucketWindow::new(350, 360).unwrap();
        assert_eq!(w.indices().last(), Some(359));
    }

    #[test]
    fn mean_before_first_scan_is_not_initialized() {
        let buf = RangeBuffer::new();
        let w = BucketWindow::new(80, 110).unwrap();
        assert!(matches!(
            buf.windowed_mean(w),
            Err(RiftError::NotInitialized(_))
        ));
    }

    #[test]
    fn mean_of_equal_values_is_exact() {
        let mut buf = RangeBuffer::new();
        buf.update(sample_with(|_| 0.7, Utc::now()));
        let w = BucketWindow::new(80, 110).unwrap();
        assert_eq!(buf.windowed_mean(w).unwrap(), 0.7);
        assert_eq!(buf.windowed_mean(BucketWindow::full_turn(0).unwrap()).unwrap(), 0.7);
    }

    #[test]
    fn mean_over_plain_and_wrapped_windows() {
        let mut buf = RangeBuffer::new();
        buf.update(sample_with(|i| i as f32, Utc::now()));

        let plain = BucketWindow::new(10, 20).unwrap();
        assert!((buf.windowed_mean(plain).unwrap() - 14.5).abs() < 1e-5);

        // 358, 359, 0, 1 → (358 + 359 + 0 + 1) / 4
        let wrapped = BucketWindow::new(358, 2).unwrap();
        assert!((buf.windowed_mean(wrapped).unwrap() - 179.5).abs() < 1e-4);
    }

    #[test]
    fn non_finite_readings_keep_prior_value() {
        let mut buf = RangeBuffer::new();
        buf.update(sample_with(|_| 2.0, Utc::now()));
        let patched = buf.update(sample_with(
            |i| match i {
                5 => f32::INFINITY,
                6 => f32::NAN,
                _ => 3.0,
            },
            Utc::now(),
        ));
        assert_eq!(patched, 2);
        assert_eq!(buf.ranges()[5], 2.0);
        assert_eq!(buf.ranges()[6], 2.0);
        assert_eq!(buf.ranges()[7], 3.0);
    }

    #[test]
    fn staleness_tracks_latest_stamp() {
        let mut buf = RangeBuffer::new();
        let t0 = Utc::now();
        assert!(buf.is_stale(t0, Duration::seconds(1)));

        buf.update(sample_with(|_| 1.0, t0));
        assert_eq!(buf.stamp(), Some(t0));
        assert!(!buf.is_stale(t0 + Duration::milliseconds(500), Duration::seconds(1)));
        assert!(buf.is_stale(t0 + Duration::seconds(2), Duration::seconds(1)));
        assert_eq!(buf.age(t0 + Duration::seconds(3)), Some(Duration::seconds(3)));
    }
}
