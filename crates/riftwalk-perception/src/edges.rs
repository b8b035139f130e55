//! Edge detection on raw RGB camera frames.
//!
//! [`EdgeDetector::detect`] runs the following pipeline with `imageproc`:
//!
//! 1. Separable Gaussian low-pass (`kernel_size` taps) to remove speckle.
//! 2. Median filter over a `kernel_size × kernel_size` window to remove
//!    impulse noise.
//! 3. 3×3 Sobel gradients per color channel; the per-pixel magnitude is
//!    `|gx| + |gy|`, and the strongest channel wins.
//! 4. Hysteresis: a pixel is an edge if its magnitude exceeds `high`, or
//!    exceeds `low` and is 8-connected to an edge pixel.
//!
//! The filters work on 8-bit channels with replicated borders.  The result is
//! reported in row-major scan order.

use image::{GrayImage, RgbImage};
use imageproc::filter::{median_filter, separable_filter_equal};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use riftwalk_types::{CameraFrame, RiftError};
use tracing::trace;

/// Default lower hysteresis threshold.
pub const DEFAULT_LOW_THRESHOLD: f32 = 6.0;
/// Default upper hysteresis threshold.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 16.0;
/// Default smoothing / median kernel size.
pub const DEFAULT_KERNEL_SIZE: usize = 5;

const CHANNELS: usize = 3;

/// Image coordinate of a detected edge pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgePixel {
    pub row: u32,
    pub col: u32,
}

/// Edge pixels of one frame, in row-major order.  May be empty.
pub type EdgePixelSet = Vec<EdgePixel>;

/// Stateless edge detector; holds only its tuning parameters.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    low: f32,
    high: f32,
    kernel_size: usize,
    gaussian: Vec<f32>,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
            kernel_size: DEFAULT_KERNEL_SIZE,
            gaussian: gaussian_kernel(DEFAULT_KERNEL_SIZE),
        }
    }
}

impl EdgeDetector {
    /// # Errors
    ///
    /// Returns [`RiftError::Config`] if the thresholds are negative,
    /// non-finite or inverted, or if `kernel_size` is not an odd number ≥ 3.
    pub fn new(low: f32, high: f32, kernel_size: usize) -> Result<Self, RiftError> {
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(RiftError::Config(format!(
                "edge thresholds must satisfy 0 <= low <= high, got low={low} high={high}"
            )));
        }
        if kernel_size < 3 || kernel_size % 2 == 0 {
            return Err(RiftError::Config(format!(
                "kernel size must be odd and >= 3, got {kernel_size}"
            )));
        }
        Ok(Self {
            low,
            high,
            kernel_size,
            gaussian: gaussian_kernel(kernel_size),
        })
    }

    pub fn thresholds(&self) -> (f32, f32) {
        (self.low, self.high)
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Detect edge pixels in `frame`.
    ///
    /// An edge-free or zero-sized frame yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`RiftError::MalformedFrame`] if the pixel buffer does not hold
    /// `width * height * 3` bytes.
    pub fn detect(&self, frame: &CameraFrame) -> Result<EdgePixelSet, RiftError> {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let expected = width * height * CHANNELS;
        if frame.data.len() != expected {
            return Err(RiftError::MalformedFrame(format!(
                "{}x{} RGB frame needs {expected} bytes, got {}",
                frame.width,
                frame.height,
                frame.data.len()
            )));
        }
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }
        let rgb = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(|| {
            RiftError::MalformedFrame(format!("{}x{} RGB buffer rejected", frame.width, frame.height))
        })?;

        let denoised = self.denoise(&rgb);
        let magnitude = gradient_magnitude(&denoised);
        let edges = hysteresis(&magnitude, width, height, self.low, self.high);
        let pixels: EdgePixelSet = edges
            .iter()
            .enumerate()
            .filter(|(_, is_edge)| **is_edge)
            .map(|(i, _)| EdgePixel {
                row: (i / width) as u32,
                col: (i % width) as u32,
            })
            .collect();
        trace!(width, height, edges = pixels.len(), "edge detection finished");
        Ok(pixels)
    }

    /// Gaussian blur followed by the median filter.
    fn denoise(&self, rgb: &RgbImage) -> RgbImage {
        let blurred = separable_filter_equal(rgb, &self.gaussian);
        let radius = (self.kernel_size / 2) as u32;
        median_filter(&blurred, radius, radius)
    }
}

/// Per-pixel `|gx| + |gy|`, maximised over the color channels.
fn gradient_magnitude(rgb: &RgbImage) -> Vec<f32> {
    let (width, height) = rgb.dimensions();
    let mut magnitude = vec![0.0_f32; width as usize * height as usize];
    for channel in 0..CHANNELS {
        let plane = GrayImage::from_fn(width, height, |x, y| image::Luma([rgb.get_pixel(x, y)[channel]]));
        let gx = horizontal_sobel(&plane);
        let gy = vertical_sobel(&plane);
        for ((acc, dx), dy) in magnitude.iter_mut().zip(gx.pixels()).zip(gy.pixels()) {
            let m = f32::from(dx[0]).abs() + f32::from(dy[0]).abs();
            *acc = acc.max(m);
        }
    }
    magnitude
}

/// Normalised 1-D Gaussian taps; σ follows the usual kernel-size heuristic.
fn gaussian_kernel(size: usize) -> Vec<f32> {
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (size / 2) as f32;
    let taps: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - radius;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / total).collect()
}

/// Two-threshold hysteresis over a magnitude image.
fn hysteresis(magnitude: &[f32], width: usize, height: usize, low: f32, high: f32) -> Vec<bool> {
    let mut edge = vec![false; magnitude.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, &m) in magnitude.iter().enumerate() {
        if m > high {
            edge[i] = true;
            stack.push(i);
        }
    }

    while let Some(i) = stack.pop() {
        let (row, col) = ((i / width) as isize, (i % width) as isize);
        for dr in -1..=1 {
            for dc in -1..=1 {
                let (nr, nc) = (row + dr, col + dc);
                if nr < 0 || nc < 0 || nr >= height as isize || nc >= width as isize {
                    continue;
                }
                let j = nr as usize * width + nc as usize;
                if !edge[j] && magnitude[j] > low {
                    edge[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    edge
}
