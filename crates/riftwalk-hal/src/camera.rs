//! Generic `Camera` trait for image-capture hardware.

use riftwalk_types::{CameraFrame, RiftError};

/// A camera or image-capture device.
///
/// Drivers implement this trait; the facade only ever sees the produced
/// [`CameraFrame`]s, so drivers can be swapped without touching perception.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"`.
    fn id(&self) -> &str;

    /// Capture and return the next available frame.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::MalformedFrame`] if the frame cannot be captured
    /// (e.g. the device is disconnected or the buffer is unavailable).
    fn capture(&mut self) -> Result<CameraFrame, RiftError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// Replays a fixed number of grey frames 100 ms apart, then fails.
    struct ReplayCamera {
        remaining: u32,
        next_stamp: chrono::DateTime<Utc>,
    }

    impl Camera for ReplayCamera {
        fn id(&self) -> &str {
            "replay"
        }

        fn capture(&mut self) -> Result<CameraFrame, RiftError> {
            if self.remaining == 0 {
                return Err(RiftError::MalformedFrame("replay exhausted".to_string()));
            }
            self.remaining -= 1;
            let frame = CameraFrame::uniform(4, 3, [128, 128, 128], self.next_stamp);
            self.next_stamp += Duration::milliseconds(100);
            Ok(frame)
        }
    }

    #[test]
    fn drivers_are_usable_behind_a_trait_object() {
        let t0 = Utc::now();
        let mut cam: Box<dyn Camera> = Box::new(ReplayCamera {
            remaining: 2,
            next_stamp: t0,
        });
        let a = cam.capture().unwrap();
        let b = cam.capture().unwrap();
        assert_eq!(a.data.len(), 4 * 3 * 3);
        assert_eq!(b.stamp - a.stamp, Duration::milliseconds(100));
        assert!(matches!(cam.capture(), Err(RiftError::MalformedFrame(_))));
    }
}
