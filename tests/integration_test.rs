//! Integration tests for the gridbin binning core.
//!
//! These tests drive the full pipeline end-to-end: configuration,
//! observation iteration over synthetic rasters, spatial binning,
//! serialization and the temporal merge.

mod common;

use std::io::Write;
use std::sync::Arc;

use common::assertions::{assert_approx_eq, assert_array_approx_eq};
use common::test_data::{full_mask, make_band, test_config_json, LinearGeoCoding, OneDegreeGrid};

use gridbin::{
    create_sampling_points, Aggregator, AggregatorConfig, AggregatorDescriptor,
    AggregatorRegistry, BinContext, BinningConfig, ObservationIterator, PixelWindow, Scratch,
    SpatialBin, SpatialBinner, TemporalBinner, VariableContext,
};

fn one_cell_geo_coding() -> LinearGeoCoding {
    // all pixels of a small tile land in the one-degree cell at
    // row 44, column 190
    LinearGeoCoding::new(45.95, 10.05, 0.01)
}

#[test]
fn test_spatial_binning_pipeline() {
    let config = BinningConfig::from_json(test_config_json()).unwrap();
    config.validate().unwrap();

    let registry = AggregatorRegistry::with_defaults();
    let manager = config.create_bin_manager(&registry).unwrap();
    assert_eq!(manager.spatial_feature_count(), 6);

    let sst = make_band(2, 2, |x, y| (y * 2 + x) as f32 + 1.0);
    let chl = make_band(2, 2, |_, _| 1.0);
    let mask = full_mask(2, 2);
    let points = create_sampling_points(&config.sampling_steps());
    let geo_coding = one_cell_geo_coding();

    let observations = ObservationIterator::new(
        vec![sst.view(), chl.view()],
        mask.view(),
        PixelWindow::sized(2, 2),
        &points,
        &geo_coding,
        53005.0,
    )
    .unwrap();

    let grid = OneDegreeGrid;
    let mut binner = SpatialBinner::new(&manager, &grid);
    let consumed = binner.process_observations(observations);
    assert_eq!(consumed, 4);
    assert_eq!(binner.bin_count(), 1);

    let bins = binner.complete();
    let bin = &bins[0];
    assert_eq!(bin.index, 44 * 360 + 190);
    assert_eq!(bin.num_obs, 4);

    // sst values 1, 2, 3, 4: mean 2.5, mean square 7.5, min 1, max 4
    assert_array_approx_eq(manager.spatial_vector(bin, 0), &[2.5, 7.5], None);
    assert_array_approx_eq(manager.spatial_vector(bin, 1), &[1.0, 4.0], None);
    // constant chl of 1.0 accumulates to zero in the log domain
    assert_array_approx_eq(manager.spatial_vector(bin, 2), &[0.0, 0.0], None);
}

#[test]
fn test_masked_pixels_do_not_contribute() {
    let config = BinningConfig::from_json(test_config_json()).unwrap();
    let registry = AggregatorRegistry::with_defaults();
    let manager = config.create_bin_manager(&registry).unwrap();

    let sst = make_band(2, 2, |x, y| (y * 2 + x) as f32 + 1.0);
    let chl = make_band(2, 2, |_, _| 1.0);
    let mut mask = full_mask(2, 2);
    mask[[0, 1]] = 0;
    mask[[1, 0]] = 0;

    let points = create_sampling_points(&[0.5]);
    let geo_coding = one_cell_geo_coding();
    let observations = ObservationIterator::new(
        vec![sst.view(), chl.view()],
        mask.view(),
        PixelWindow::sized(2, 2),
        &points,
        &geo_coding,
        0.0,
    )
    .unwrap();

    let grid = OneDegreeGrid;
    let mut binner = SpatialBinner::new(&manager, &grid);
    binner.process_observations(observations);

    let bins = binner.complete();
    assert_eq!(bins[0].num_obs, 2);
    // surviving sst values are 1 and 4
    assert_array_approx_eq(manager.spatial_vector(&bins[0], 1), &[1.0, 4.0], None);
    assert_approx_eq(manager.spatial_vector(&bins[0], 0)[0], 2.5, None);
}

#[test]
fn test_supersampling_multiplies_observation_count() {
    let config = BinningConfig {
        super_sampling: 2,
        ..BinningConfig::from_json(test_config_json()).unwrap()
    };
    let registry = AggregatorRegistry::with_defaults();
    let manager = config.create_bin_manager(&registry).unwrap();

    let sst = make_band(1, 1, |_, _| 3.0);
    let chl = make_band(1, 1, |_, _| 1.0);
    let mask = full_mask(1, 1);
    let points = create_sampling_points(&config.sampling_steps());
    assert_eq!(points.len(), 4);

    let geo_coding = one_cell_geo_coding();
    let observations = ObservationIterator::new(
        vec![sst.view(), chl.view()],
        mask.view(),
        PixelWindow::sized(1, 1),
        &points,
        &geo_coding,
        0.0,
    )
    .unwrap();

    let grid = OneDegreeGrid;
    let mut binner = SpatialBinner::new(&manager, &grid);
    assert_eq!(binner.process_observations(observations), 4);

    let bins = binner.complete();
    assert_eq!(bins[0].num_obs, 4);
    assert_approx_eq(manager.spatial_vector(&bins[0], 0)[0], 3.0, None);
}

#[test]
fn test_bin_stream_round_trip_through_disk() {
    let config = BinningConfig::from_json(test_config_json()).unwrap();
    let registry = AggregatorRegistry::with_defaults();
    let manager = config.create_bin_manager(&registry).unwrap();

    // one finalized bin per pass over two synthetic passes
    let mut encoded = Vec::new();
    let mut expected = Vec::new();
    for pass in 0..2 {
        let sst = make_band(2, 2, |x, y| (pass * 4 + y * 2 + x) as f32);
        let chl = make_band(2, 2, |_, _| 2.0);
        let mask = full_mask(2, 2);
        let points = create_sampling_points(&[0.5]);
        let geo_coding = one_cell_geo_coding();
        let observations = ObservationIterator::new(
            vec![sst.view(), chl.view()],
            mask.view(),
            PixelWindow::sized(2, 2),
            &points,
            &geo_coding,
            0.0,
        )
        .unwrap();

        let grid = OneDegreeGrid;
        let mut binner = SpatialBinner::new(&manager, &grid);
        binner.process_observations(observations);
        for bin in binner.complete() {
            bin.write_to(&mut encoded);
            expected.push(bin);
        }
    }

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&encoded).unwrap();
    file.flush().unwrap();

    let data = std::fs::read(file.path()).unwrap();
    let mut buf = data.as_slice();
    for original in &expected {
        let read = SpatialBin::read_from_indexed(&mut buf, original.index).unwrap();
        assert_eq!(read.index, original.index);
        assert_eq!(read.num_obs, original.num_obs);
        assert_eq!(read.features, original.features);
    }
    assert!(buf.is_empty());
}

#[test]
fn test_temporal_merge_is_commutative() {
    let config = BinningConfig::from_json(test_config_json()).unwrap();
    let registry = AggregatorRegistry::with_defaults();
    let manager = config.create_bin_manager(&registry).unwrap();

    let make_pass = |values: &[f32]| -> SpatialBin {
        let mut bin = manager.create_spatial_bin(7);
        let mut ctx = manager.create_spatial_context();
        for &value in values {
            let observation = gridbin::Observation::new(0.0, 45.5, 10.5, vec![value, 1.0]);
            manager.aggregate_spatial_bin(&observation, &mut bin, &mut ctx);
        }
        manager.complete_spatial_bin(&mut bin, &mut ctx);
        bin
    };

    let pass_a = make_pass(&[1.0, 3.0]);
    let pass_b = make_pass(&[5.0]);

    let binner = TemporalBinner::new(&manager);
    let forward = binner.process_spatial_bins(7, [&pass_a, &pass_b]);
    let backward = binner.process_spatial_bins(7, [&pass_b, &pass_a]);

    assert_eq!(forward.num_obs, 3);
    assert_eq!(forward.features, backward.features);

    // weighted sst mean: (2*2 + 5*1) / 3
    assert_approx_eq(manager.temporal_vector(&forward, 0)[0], 3.0, None);
    assert_array_approx_eq(manager.temporal_vector(&forward, 1), &[1.0, 5.0], None);
}

/// A mission-specific plugin statistic: counts the passes that touched
/// the cell.
struct PassCount {
    names: Vec<String>,
}

impl Aggregator for PassCount {
    fn name(&self) -> &str {
        "PASS_COUNT"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.names
    }

    fn init_spatial(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = 0.0;
    }

    fn aggregate_spatial(
        &self,
        _scratch: &mut Scratch,
        _observation: &gridbin::Observation,
        vector: &mut [f32],
    ) {
        vector[0] = 1.0;
    }

    fn complete_spatial(&self, _scratch: &mut Scratch, _num_obs: u32, _vector: &mut [f32]) {}

    fn init_temporal(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = 0.0;
    }

    fn aggregate_temporal(
        &self,
        _scratch: &mut Scratch,
        spatial_vector: &[f32],
        _spatial_num_obs: u32,
        vector: &mut [f32],
    ) {
        vector[0] += spatial_vector[0];
    }

    fn complete_temporal(&self, _scratch: &mut Scratch, _num_obs: u32, _vector: &mut [f32]) {}
}

struct PassCountDescriptor;

impl AggregatorDescriptor for PassCountDescriptor {
    fn type_tag(&self) -> &str {
        "PASS_COUNT"
    }

    fn create_aggregator(
        &self,
        _ctx: &VariableContext,
        _config: &AggregatorConfig,
    ) -> gridbin::Result<Box<dyn Aggregator>> {
        Ok(Box::new(PassCount {
            names: vec!["pass_count".to_string()],
        }))
    }
}

#[test]
fn test_third_party_aggregator_registration() {
    let mut registry = AggregatorRegistry::with_defaults();
    assert!(registry.descriptor("PASS_COUNT").is_none());
    registry.register(Arc::new(PassCountDescriptor));

    let config = BinningConfig {
        variables: vec!["sst".to_string()],
        aggregators: vec![
            AggregatorConfig::new("AVG", serde_json::json!({"var_name": "sst"})),
            AggregatorConfig::new("PASS_COUNT", serde_json::Value::Null),
        ],
        ..Default::default()
    };
    let manager = config.create_bin_manager(&registry).unwrap();
    assert_eq!(manager.spatial_feature_count(), 3);

    let make_pass = |value: f32| -> SpatialBin {
        let mut bin = manager.create_spatial_bin(1);
        let mut ctx: BinContext = manager.create_spatial_context();
        let observation = gridbin::Observation::new(0.0, 0.0, 0.0, vec![value]);
        manager.aggregate_spatial_bin(&observation, &mut bin, &mut ctx);
        manager.complete_spatial_bin(&mut bin, &mut ctx);
        bin
    };

    let binner = TemporalBinner::new(&manager);
    let passes = [make_pass(1.0), make_pass(2.0), make_pass(3.0)];
    let record = binner.process_spatial_bins(1, passes.iter());

    assert_approx_eq(manager.temporal_vector(&record, 1)[0], 3.0, None);
}
