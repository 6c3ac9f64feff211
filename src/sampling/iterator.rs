//! The lazy pixel-to-observation sequence.

use ndarray::ArrayView2;

use super::{PixelWindow, SamplePoint, SamplePointer};
use crate::error::{GridbinError, Result};
use crate::observation::Observation;

/// Geocoding capability resolving a fractional pixel position to a
/// geographic position, as `(lat, lon)` in degrees.
///
/// Implementations live outside this crate (mission-specific coordinate
/// transforms); tests use simple affine mappings.
pub trait GeoCoding {
    /// Geographic position of the given fractional raster coordinates.
    fn geo_pos(&self, x: f64, y: f64) -> (f64, f64);
}

/// Lazily turns raster tiles plus a validity mask into [`Observation`]s.
///
/// The iterator advances a [`SamplePointer`] over the pixel window; at
/// every position where the mask marks the pixel valid (nonzero) it
/// resolves the sub-pixel geographic position and emits one observation
/// carrying all band values at that pixel. Masked pixels are skipped but
/// still advanced past. Once exhausted the sequence stays empty; build a
/// fresh iterator to re-scan.
pub struct ObservationIterator<'a> {
    bands: Vec<ArrayView2<'a, f32>>,
    mask: ArrayView2<'a, u8>,
    pointer: SamplePointer<'a>,
    geo_coding: &'a dyn GeoCoding,
    mjd: f64,
}

impl<'a> ObservationIterator<'a> {
    /// Create an iterator over co-registered bands.
    ///
    /// Fails if no band is given, if band and mask shapes differ, or if
    /// the window reaches outside the rasters.
    pub fn new(
        bands: Vec<ArrayView2<'a, f32>>,
        mask: ArrayView2<'a, u8>,
        window: PixelWindow,
        points: &'a [SamplePoint],
        geo_coding: &'a dyn GeoCoding,
        mjd: f64,
    ) -> Result<Self> {
        if bands.is_empty() {
            return Err(GridbinError::InvalidParameter {
                param: "bands".to_string(),
                message: "at least one band is required".to_string(),
            });
        }
        let (rows, cols) = mask.dim();
        for (i, band) in bands.iter().enumerate() {
            if band.dim() != (rows, cols) {
                return Err(GridbinError::InvalidParameter {
                    param: "bands".to_string(),
                    message: format!(
                        "band {} has shape {:?}, mask has shape {:?}",
                        i,
                        band.dim(),
                        (rows, cols)
                    ),
                });
            }
        }
        if window.x + window.width > cols || window.y + window.height > rows {
            return Err(GridbinError::InvalidParameter {
                param: "window".to_string(),
                message: format!(
                    "window {:?} reaches outside the {}x{} raster",
                    window, cols, rows
                ),
            });
        }

        Ok(Self {
            bands,
            mask,
            pointer: SamplePointer::new(window, points),
            geo_coding,
            mjd,
        })
    }
}

impl Iterator for ObservationIterator<'_> {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        while self.pointer.can_advance() {
            self.pointer.advance();
            let (x, y) = (self.pointer.x(), self.pointer.y());
            if self.mask[[y, x]] == 0 {
                continue;
            }
            let point = self.pointer.sample_point();
            let (lat, lon) = self
                .geo_coding
                .geo_pos(x as f64 + point.x as f64, y as f64 + point.y as f64);
            let values = self.bands.iter().map(|band| band[[y, x]]).collect();
            return Some(Observation::new(self.mjd, lat, lon, values));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    /// Maps pixel (x, y) to (lat, lon) = (-y, x).
    struct FlatGeoCoding;

    impl GeoCoding for FlatGeoCoding {
        fn geo_pos(&self, x: f64, y: f64) -> (f64, f64) {
            (-y, x)
        }
    }

    const CENTER: [SamplePoint; 1] = [SamplePoint { x: 0.5, y: 0.5 }];

    #[test]
    fn test_emits_valid_pixels_in_order() {
        let band: Array2<f32> = array![[1.0, 2.0], [3.0, 4.0]];
        let mask: Array2<u8> = array![[1, 1], [1, 1]];

        let iter = ObservationIterator::new(
            vec![band.view()],
            mask.view(),
            PixelWindow::sized(2, 2),
            &CENTER,
            &FlatGeoCoding,
            53005.0,
        )
        .unwrap();

        let observations: Vec<Observation> = iter.collect();
        assert_eq!(observations.len(), 4);
        assert_eq!(observations[0].values(), &[1.0]);
        assert_eq!(observations[1].values(), &[2.0]);
        assert_eq!(observations[2].values(), &[3.0]);
        assert_eq!(observations[3].values(), &[4.0]);

        // sub-pixel center of pixel (1, 0)
        assert_eq!(observations[1].lon, 1.5);
        assert_eq!(observations[1].lat, -0.5);
        assert_eq!(observations[1].mjd, 53005.0);
    }

    #[test]
    fn test_masked_pixels_skipped() {
        let band: Array2<f32> = array![[1.0, 2.0], [3.0, 4.0]];
        let mask: Array2<u8> = array![[1, 0], [0, 1]];

        let iter = ObservationIterator::new(
            vec![band.view()],
            mask.view(),
            PixelWindow::sized(2, 2),
            &CENTER,
            &FlatGeoCoding,
            0.0,
        )
        .unwrap();

        let values: Vec<f32> = iter.map(|obs| obs.value(0)).collect();
        assert_eq!(values, vec![1.0, 4.0]);
    }

    #[test]
    fn test_multiple_bands() {
        let sst: Array2<f32> = array![[10.0, 11.0]];
        let chl: Array2<f32> = array![[0.1, 0.2]];
        let mask: Array2<u8> = array![[1, 1]];

        let iter = ObservationIterator::new(
            vec![sst.view(), chl.view()],
            mask.view(),
            PixelWindow::sized(2, 1),
            &CENTER,
            &FlatGeoCoding,
            0.0,
        )
        .unwrap();

        let observations: Vec<Observation> = iter.collect();
        assert_eq!(observations[0].values(), &[10.0, 0.1]);
        assert_eq!(observations[1].values(), &[11.0, 0.2]);
    }

    #[test]
    fn test_supersampling_multiplies_observations() {
        let band: Array2<f32> = array![[5.0]];
        let mask: Array2<u8> = array![[1]];
        let points = [
            SamplePoint { x: 0.25, y: 0.25 },
            SamplePoint { x: 0.75, y: 0.25 },
            SamplePoint { x: 0.25, y: 0.75 },
            SamplePoint { x: 0.75, y: 0.75 },
        ];

        let iter = ObservationIterator::new(
            vec![band.view()],
            mask.view(),
            PixelWindow::sized(1, 1),
            &points,
            &FlatGeoCoding,
            0.0,
        )
        .unwrap();

        let observations: Vec<Observation> = iter.collect();
        assert_eq!(observations.len(), 4);
        assert_eq!(observations[0].lon, 0.25);
        assert_eq!(observations[1].lon, 0.75);
        assert!(observations.iter().all(|o| o.value(0) == 5.0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let band: Array2<f32> = Array2::zeros((2, 2));
        let mask: Array2<u8> = Array2::ones((2, 3));

        let result = ObservationIterator::new(
            vec![band.view()],
            mask.view(),
            PixelWindow::sized(2, 2),
            &CENTER,
            &FlatGeoCoding,
            0.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_window_out_of_bounds_rejected() {
        let band: Array2<f32> = Array2::zeros((2, 2));
        let mask: Array2<u8> = Array2::ones((2, 2));

        let result = ObservationIterator::new(
            vec![band.view()],
            mask.view(),
            PixelWindow::sized(3, 2),
            &CENTER,
            &FlatGeoCoding,
            0.0,
        );
        assert!(result.is_err());
    }
}
