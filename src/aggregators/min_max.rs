//! Minimum and maximum of one variable.
//!
//! Both phases carry `[min, max]`; finalization is the identity and the
//! temporal merge takes the min of mins and the max of maxes, so bins can
//! be folded in any order.

use serde::{Deserialize, Serialize};

use super::{feature_names, is_no_data, Aggregator, AggregatorDescriptor};
use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::observation::Observation;
use crate::variable::VariableContext;

/// Parameters for the [`MinMax`] aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxConfig {
    /// Name of the variable to track
    pub var_name: String,
    /// Optional no-data sentinel; matching values are excluded
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Min/max statistic over one variable.
pub struct MinMax {
    var_index: usize,
    fill_value: Option<f32>,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
}

impl MinMax {
    /// Build the aggregator against a resolved variable context.
    pub fn new(ctx: &VariableContext, config: &MinMaxConfig) -> Result<Self> {
        let var_index = ctx.require_index(&config.var_name)?;
        let names = feature_names(&config.var_name, &["min", "max"]);
        Ok(Self {
            var_index,
            fill_value: config.fill_value,
            spatial_names: names.clone(),
            temporal_names: names,
        })
    }
}

impl Aggregator for MinMax {
    fn name(&self) -> &str {
        "MIN_MAX"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_names
    }

    fn init_spatial(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = f32::INFINITY;
        vector[1] = f32::NEG_INFINITY;
    }

    fn aggregate_spatial(
        &self,
        _scratch: &mut Scratch,
        observation: &Observation,
        vector: &mut [f32],
    ) {
        let value = observation.value(self.var_index);
        if is_no_data(self.fill_value, value) || value.is_nan() {
            return;
        }
        if value < vector[0] {
            vector[0] = value;
        }
        if value > vector[1] {
            vector[1] = value;
        }
    }

    fn complete_spatial(&self, _scratch: &mut Scratch, _num_obs: u32, _vector: &mut [f32]) {
        // raw and finalized representations coincide
    }

    fn init_temporal(&self, scratch: &mut Scratch, vector: &mut [f32]) {
        self.init_spatial(scratch, vector);
    }

    fn aggregate_temporal(
        &self,
        _scratch: &mut Scratch,
        spatial_vector: &[f32],
        _spatial_num_obs: u32,
        vector: &mut [f32],
    ) {
        if spatial_vector[0] < vector[0] {
            vector[0] = spatial_vector[0];
        }
        if spatial_vector[1] > vector[1] {
            vector[1] = spatial_vector[1];
        }
    }

    fn complete_temporal(&self, _scratch: &mut Scratch, _num_obs: u32, _vector: &mut [f32]) {}
}

/// Descriptor for the `MIN_MAX` type tag.
pub struct MinMaxDescriptor;

impl AggregatorDescriptor for MinMaxDescriptor {
    fn type_tag(&self) -> &str {
        "MIN_MAX"
    }

    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>> {
        let params: MinMaxConfig = config.params()?;
        Ok(Box::new(MinMax::new(ctx, &params)?))
    }
}
