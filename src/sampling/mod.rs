//! Supersampled pixel-to-observation iteration.
//!
//! Binning walks raster tiles pixel by pixel, optionally visiting several
//! sub-pixel offsets per pixel to reduce aliasing against the target
//! grid. This module provides the sampling-point construction, the
//! deterministic [`SamplePointer`] cursor and the lazy
//! [`ObservationIterator`] that turns tiles plus a validity mask into a
//! finite observation sequence.

pub mod iterator;
pub mod pointer;

pub use iterator::{GeoCoding, ObservationIterator};
pub use pointer::{PixelWindow, SamplePointer};

/// A fractional sub-pixel offset in `[0, 1) x [0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Offset along the x (column) axis
    pub x: f32,
    /// Offset along the y (row) axis
    pub y: f32,
}

/// Expand a super-sampling factor into centered sub-pixel steps.
///
/// Factor `n` yields the n steps `(2i + 1) / 2n`, e.g. 3 -> `[1/6, 3/6,
/// 5/6]`. Factor 1 degenerates to the pixel center.
pub fn create_sampling_steps(super_sampling: usize) -> Vec<f32> {
    (0..super_sampling)
        .map(|i| (2 * i + 1) as f32 / (2 * super_sampling) as f32)
        .collect()
}

/// Build the full n x n grid of sampling points from n steps.
///
/// Points are ordered row-major with the second (y) step index outer and
/// the first (x) step index inner: point `k = j*n + i` has coordinates
/// `(steps[i], steps[j])`.
pub fn create_sampling_points(steps: &[f32]) -> Vec<SamplePoint> {
    let mut points = Vec::with_capacity(steps.len() * steps.len());
    for &y in steps {
        for &x in steps {
            points.push(SamplePoint { x, y });
        }
    }
    points
}
