//! Arithmetic mean and second moment of one variable.
//!
//! Spatially the aggregator keeps the running sum and sum of squares and
//! finalizes them to the per-pass mean and mean square. Temporally it
//! accumulates those per-pass results weighted by their observation
//! counts and finalizes to mean, standard deviation and total weight.

use serde::{Deserialize, Serialize};

use super::{feature_names, is_no_data, Aggregator, AggregatorDescriptor};
use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::observation::Observation;
use crate::variable::VariableContext;

/// Parameters for the [`Average`] aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageConfig {
    /// Name of the variable to average
    pub var_name: String,
    /// Optional no-data sentinel; matching values are excluded
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Mean/second-moment statistic over one variable.
pub struct Average {
    var_index: usize,
    fill_value: Option<f32>,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
}

impl Average {
    /// Build the aggregator against a resolved variable context.
    pub fn new(ctx: &VariableContext, config: &AverageConfig) -> Result<Self> {
        let var_index = ctx.require_index(&config.var_name)?;
        Ok(Self {
            var_index,
            fill_value: config.fill_value,
            spatial_names: feature_names(&config.var_name, &["sum", "sum_sq"]),
            temporal_names: feature_names(&config.var_name, &["mean", "sigma", "weights"]),
        })
    }
}

impl Aggregator for Average {
    fn name(&self) -> &str {
        "AVG"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_names
    }

    fn init_spatial(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = 0.0;
        vector[1] = 0.0;
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
        vector[1] += value * value;
    }

    fn complete_spatial(&self, _scratch: &mut Scratch, num_obs: u32, vector: &mut [f32]) {
        // an untouched bin keeps its neutral state
        if num_obs == 0 {
            return;
        }
        let n = num_obs as f32;
        vector[0] /= n;
        vector[1] /= n;
    }

    fn init_temporal(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = 0.0;
        vector[1] = 0.0;
        vector[2] = 0.0;
    }

    fn aggregate_temporal(
        &self,
        _scratch: &mut Scratch,
        spatial_vector: &[f32],
        spatial_num_obs: u32,
        vector: &mut [f32],
    ) {
        let weight = spatial_num_obs as f32;
        vector[0] += spatial_vector[0] * weight;
        vector[1] += spatial_vector[1] * weight;
        vector[2] += weight;
    }

    fn complete_temporal(&self, _scratch: &mut Scratch, _num_obs: u32, vector: &mut [f32]) {
        let weight = vector[2];
        if weight == 0.0 {
            return;
        }
        let mean = vector[0] / weight;
        let second_moment = vector[1] / weight;
        let variance = (second_moment - mean * mean).max(0.0);
        vector[0] = mean;
        vector[1] = variance.sqrt();
    }
}

/// Descriptor for the `AVG` type tag.
pub struct AverageDescriptor;

impl AggregatorDescriptor for AverageDescriptor {
    fn type_tag(&self) -> &str {
        "AVG"
    }

    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>> {
        let params: AverageConfig = config.params()?;
        Ok(Box::new(Average::new(ctx, &params)?))
    }
}
