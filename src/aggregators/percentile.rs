//! Order statistic of the per-pass means of one variable.
//!
//! Spatially the aggregator reduces to the per-pass mean. Temporally it
//! collects one value per pass in its scratch slot and flattens the
//! collection to the requested percentile at finalization, interpolating
//! between neighboring ranks.

use serde::{Deserialize, Serialize};

use super::{feature_names, is_no_data, Aggregator, AggregatorDescriptor};
use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::{GridbinError, Result};
use crate::observation::Observation;
use crate::variable::VariableContext;

fn default_percentage() -> u32 {
    90
}

/// Parameters for the [`Percentile`] aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileConfig {
    /// Name of the variable to rank
    pub var_name: String,
    /// Requested percentile, 0 to 100
    #[serde(default = "default_percentage")]
    pub percentage: u32,
    /// Optional no-data sentinel; matching values are excluded
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Percentile statistic over the per-pass means of one variable.
pub struct Percentile {
    var_index: usize,
    percentage: u32,
    fill_value: Option<f32>,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
}

impl Percentile {
    /// Build the aggregator against a resolved variable context.
    pub fn new(ctx: &VariableContext, config: &PercentileConfig) -> Result<Self> {
        if config.percentage > 100 {
            return Err(GridbinError::InvalidParameter {
                param: "percentage".to_string(),
                message: format!("must be in [0, 100], got {}", config.percentage),
            });
        }
        let var_index = ctx.require_index(&config.var_name)?;
        Ok(Self {
            var_index,
            percentage: config.percentage,
            fill_value: config.fill_value,
            spatial_names: feature_names(&config.var_name, &["sum"]),
            temporal_names: vec![format!("{}_p{}", config.var_name, config.percentage)],
        })
    }
}

impl Aggregator for Percentile {
    fn name(&self) -> &str {
        "PERCENTILE"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_names
    }

    fn new_temporal_scratch(&self) -> Scratch {
        Scratch::Measurements(Vec::new())
    }

    fn init_spatial(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = 0.0;
    }

    fn aggregate_spatial(
        &self,
        _scratch: &mut Scratch,
        observation: &Observation,
        vector: &mut [f32],
    ) {
        let value = observation.value(self.var_index);
        if is_no_data(self.fill_value, value) {
            return;
        }
        vector[0] += value;
    }

    fn complete_spatial(&self, _scratch: &mut Scratch, num_obs: u32, vector: &mut [f32]) {
        if num_obs == 0 {
            return;
        }
        vector[0] /= num_obs as f32;
    }

    fn init_temporal(&self, scratch: &mut Scratch, vector: &mut [f32]) {
        let measurements = match scratch {
            Scratch::Measurements(measurements) => measurements,
            _ => unreachable!("percentile temporal scratch slot missing"),
        };
        measurements.clear();
        vector[0] = 0.0;
    }

    fn aggregate_temporal(
        &self,
        scratch: &mut Scratch,
        spatial_vector: &[f32],
        _spatial_num_obs: u32,
        _vector: &mut [f32],
    ) {
        let measurements = match scratch {
            Scratch::Measurements(measurements) => measurements,
            _ => unreachable!("percentile temporal scratch slot missing"),
        };
        let value = spatial_vector[0];
        if !value.is_nan() {
            measurements.push(value);
        }
    }

    fn complete_temporal(&self, scratch: &mut Scratch, _num_obs: u32, vector: &mut [f32]) {
        let measurements = match scratch {
            Scratch::Measurements(measurements) => measurements,
            _ => unreachable!("percentile temporal scratch slot missing"),
        };
        if measurements.is_empty() {
            vector[0] = f32::NAN;
            return;
        }
        measurements.sort_by(f32::total_cmp);
        vector[0] = compute_percentile(self.percentage, measurements);
    }
}

/// Interpolated percentile of a sorted, non-empty measurement list.
pub fn compute_percentile(percentage: u32, sorted: &[f32]) -> f32 {
    let n = sorted.len();
    let rank = (percentage as f32 / 100.0) * (n + 1) as f32;
    let k = rank.floor() as usize;
    let d = rank - k as f32;
    if k == 0 {
        return sorted[0];
    }
    if k >= n {
        return sorted[n - 1];
    }
    sorted[k - 1] + d * (sorted[k] - sorted[k - 1])
}

/// Descriptor for the `PERCENTILE` type tag.
pub struct PercentileDescriptor;

impl AggregatorDescriptor for PercentileDescriptor {
    fn type_tag(&self) -> &str {
        "PERCENTILE"
    }

    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>> {
        let params: PercentileConfig = config.params()?;
        Ok(Box::new(Percentile::new(ctx, &params)?))
    }
}
