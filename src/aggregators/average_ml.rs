//! Maximum-likelihood average for log-normally distributed variables.
//!
//! Ocean-color quantities such as chlorophyll concentration are
//! log-normally distributed, so the accumulation happens in the log
//! domain: spatially the aggregator sums ln(x) and ln²(x) and normalizes
//! the per-pass result by the square root of the observation count.
//! The temporal fold then sums those scaled log means against the
//! accumulated sqrt weights, which yields the sqrt(n)-weighted mean of
//! the per-pass log means, finalized to the log-normal mean
//! `exp(mu + var/2)` and deviation `mean * sqrt(exp(var) - 1)`.

use serde::{Deserialize, Serialize};

use super::{feature_names, is_no_data, Aggregator, AggregatorDescriptor};
use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::observation::Observation;
use crate::variable::VariableContext;

/// Parameters for the [`AverageML`] aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AverageMLConfig {
    /// Name of the variable to average
    pub var_name: String,
    /// Optional no-data sentinel; matching values are excluded
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Log-domain mean statistic over one variable.
pub struct AverageML {
    var_index: usize,
    fill_value: Option<f32>,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
}

impl AverageML {
    /// Build the aggregator against a resolved variable context.
    pub fn new(ctx: &VariableContext, config: &AverageMLConfig) -> Result<Self> {
        let var_index = ctx.require_index(&config.var_name)?;
        Ok(Self {
            var_index,
            fill_value: config.fill_value,
            spatial_names: feature_names(&config.var_name, &["sum", "sum_sq"]),
            temporal_names: feature_names(&config.var_name, &["mean", "sigma", "weights"]),
        })
    }
}

impl Aggregator for AverageML {
    fn name(&self) -> &str {
        "AVG_ML"
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
        let log_value = value.ln();
        vector[0] += log_value;
        vector[1] += log_value * log_value;
    }

    fn complete_spatial(&self, _scratch: &mut Scratch, num_obs: u32, vector: &mut [f32]) {
        if num_obs == 0 {
            return;
        }
        let weight = (num_obs as f32).sqrt();
        vector[0] /= weight;
        vector[1] /= weight;
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
        // the spatial slice is already scaled by 1/sqrt(n); summing it
        // against sqrt(n) weights yields the weighted mean of log means
        vector[0] += spatial_vector[0];
        vector[1] += spatial_vector[1];
        vector[2] += (spatial_num_obs as f32).sqrt();
    }

    fn complete_temporal(&self, _scratch: &mut Scratch, _num_obs: u32, vector: &mut [f32]) {
        let weight = vector[2];
        if weight == 0.0 {
            return;
        }
        let av_logs = vector[0] / weight;
        let vr_logs = (vector[1] / weight - av_logs * av_logs).max(0.0);
        let mean = (av_logs + 0.5 * vr_logs).exp();
        let sigma = mean * vr_logs.exp_m1().max(0.0).sqrt();
        vector[0] = mean;
        vector[1] = sigma;
    }
}

/// Descriptor for the `AVG_ML` type tag.
pub struct AverageMLDescriptor;

impl AggregatorDescriptor for AverageMLDescriptor {
    fn type_tag(&self) -> &str {
        "AVG_ML"
    }

    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>> {
        let params: AverageMLConfig = config.params()?;
        Ok(Box::new(AverageML::new(ctx, &params)?))
    }
}
