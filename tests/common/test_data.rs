//! Synthetic rasters, geocodings and grids for testing.

use ndarray::Array2;

use gridbin::{BinningGrid, GeoCoding};

/// Affine pixel-to-geo mapping: pixel (x, y) maps to
/// `(lat0 - y * step, lon0 + x * step)`.
pub struct LinearGeoCoding {
    pub lat0: f64,
    pub lon0: f64,
    pub step: f64,
}

impl LinearGeoCoding {
    pub fn new(lat0: f64, lon0: f64, step: f64) -> Self {
        Self { lat0, lon0, step }
    }
}

impl GeoCoding for LinearGeoCoding {
    fn geo_pos(&self, x: f64, y: f64) -> (f64, f64) {
        (self.lat0 - y * self.step, self.lon0 + x * self.step)
    }
}

/// Equal-angle grid with one-degree cells, numbered row-major from the
/// north-west corner.
pub struct OneDegreeGrid;

impl BinningGrid for OneDegreeGrid {
    fn bin_index(&self, lat: f64, lon: f64) -> i64 {
        let row = (90.0 - lat).floor().clamp(0.0, 179.0) as i64;
        let col = (lon + 180.0).floor().clamp(0.0, 359.0) as i64;
        row * 360 + col
    }

    fn num_bins(&self) -> i64 {
        180 * 360
    }
}

/// Build a band where each pixel carries `f(x, y)`.
pub fn make_band<F>(width: usize, height: usize, f: F) -> Array2<f32>
where
    F: Fn(usize, usize) -> f32,
{
    Array2::from_shape_fn((height, width), |(y, x)| f(x, y))
}

/// A mask marking every pixel valid.
pub fn full_mask(width: usize, height: usize) -> Array2<u8> {
    Array2::ones((height, width))
}

/// A typical run configuration exercising several aggregator types.
pub fn test_config_json() -> &'static str {
    r#"{
        "variables": ["sst", "chl"],
        "aggregators": [
            {"type": "AVG", "var_name": "sst"},
            {"type": "MIN_MAX", "var_name": "sst"},
            {"type": "AVG_ML", "var_name": "chl"}
        ],
        "super_sampling": 1
    }"#
}
