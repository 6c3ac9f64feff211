//! Values of a variable set captured at the maximum of a driver variable.
//!
//! The aggregator tracks the running maximum of one "driver" variable and
//! the values of the associated variables observed concurrently with that
//! maximum. The comparison is strict, so ties keep the first-observed
//! tuple. Finalization is the identity in both phases; the temporal merge
//! selects across passes by the same maximum rule.

use serde::{Deserialize, Serialize};

use super::{is_no_data, Aggregator, AggregatorDescriptor};
use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::observation::Observation;
use crate::variable::VariableContext;

/// Parameters for the [`OnMaxSet`] aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnMaxSetConfig {
    /// Name of the driver variable whose maximum selects the tuple
    pub on_max_var_name: String,
    /// Names of the variables captured alongside the maximum
    #[serde(default)]
    pub set_var_names: Vec<String>,
    /// Optional no-data sentinel for the driver; matching values are
    /// excluded
    #[serde(default)]
    pub fill_value: Option<f32>,
}

/// Selection-by-maximum statistic.
pub struct OnMaxSet {
    on_max_index: usize,
    set_indexes: Vec<usize>,
    fill_value: Option<f32>,
    feature_names: Vec<String>,
}

impl OnMaxSet {
    /// Build the aggregator against a resolved variable context.
    pub fn new(ctx: &VariableContext, config: &OnMaxSetConfig) -> Result<Self> {
        let on_max_index = ctx.require_index(&config.on_max_var_name)?;
        let set_indexes = config
            .set_var_names
            .iter()
            .map(|name| ctx.require_index(name))
            .collect::<Result<Vec<_>>>()?;

        let mut feature_names = vec![format!("{}_max", config.on_max_var_name)];
        feature_names.extend(config.set_var_names.iter().cloned());

        Ok(Self {
            on_max_index,
            set_indexes,
            fill_value: config.fill_value,
            feature_names,
        })
    }
}

impl Aggregator for OnMaxSet {
    fn name(&self) -> &str {
        "ON_MAX_SET"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn init_spatial(&self, _scratch: &mut Scratch, vector: &mut [f32]) {
        vector[0] = f32::NEG_INFINITY;
        for slot in vector[1..].iter_mut() {
            *slot = f32::NAN;
        }
    }

    fn aggregate_spatial(
        &self,
        _scratch: &mut Scratch,
        observation: &Observation,
        vector: &mut [f32],
    ) {
        let value = observation.value(self.on_max_index);
        if is_no_data(self.fill_value, value) || value.is_nan() {
            return;
        }
        // strict comparison: the first-observed tuple wins a tie
        if value > vector[0] {
            vector[0] = value;
            for (slot, &set_index) in vector[1..].iter_mut().zip(&self.set_indexes) {
                *slot = observation.value(set_index);
            }
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
        if spatial_vector[0] > vector[0] {
            vector.copy_from_slice(spatial_vector);
        }
    }

    fn complete_temporal(&self, _scratch: &mut Scratch, _num_obs: u32, _vector: &mut [f32]) {}
}

/// Descriptor for the `ON_MAX_SET` type tag.
pub struct OnMaxSetDescriptor;

impl AggregatorDescriptor for OnMaxSetDescriptor {
    fn type_tag(&self) -> &str {
        "ON_MAX_SET"
    }

    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>> {
        let params: OnMaxSetConfig = config.params()?;
        Ok(Box::new(OnMaxSet::new(ctx, &params)?))
    }
}
