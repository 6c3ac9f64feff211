//! The aggregation algebra: pluggable per-cell statistics.
//!
//! An [`Aggregator`] defines one statistic over one or more variables. It
//! contributes a fixed-width slice to the spatial and temporal feature
//! vectors of every bin and implements the three-phase update protocol
//! (init, accumulate, finalize) for both binning levels.
//!
//! New statistic types are plugged in through the
//! [`AggregatorRegistry`]: a string type tag mapped to an
//! [`AggregatorDescriptor`] that builds the aggregator from a
//! [`VariableContext`](crate::VariableContext) and a type-tagged
//! configuration. Mission-specific plugins register their descriptors at
//! process startup, before any binning run begins.

pub mod average;
pub mod average_ml;
pub mod min_max;
pub mod on_max_set;
pub mod percentile;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::bins::Scratch;
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::observation::Observation;
use crate::variable::VariableContext;

pub use average::{Average, AverageDescriptor};
pub use average_ml::{AverageML, AverageMLDescriptor};
pub use min_max::{MinMax, MinMaxDescriptor};
pub use on_max_set::{OnMaxSet, OnMaxSetDescriptor};
pub use percentile::{Percentile, PercentileDescriptor};

/// A pluggable per-cell statistic.
///
/// Implementations are pure functions of their configuration: all mutable
/// state lives in the bin's feature slice and the per-bin [`Scratch`]
/// slot handed to each call. The feature counts are constant for the
/// lifetime of the aggregator.
pub trait Aggregator: Send + Sync {
    /// The type tag of this aggregator, e.g. `"AVG"`.
    fn name(&self) -> &str;

    /// Names of the spatial features, in vector order.
    fn spatial_feature_names(&self) -> &[String];

    /// Names of the temporal features, in vector order.
    fn temporal_feature_names(&self) -> &[String];

    /// Width of this aggregator's slice of the spatial feature vector.
    fn spatial_feature_count(&self) -> usize {
        self.spatial_feature_names().len()
    }

    /// Width of this aggregator's slice of the temporal feature vector.
    fn temporal_feature_count(&self) -> usize {
        self.temporal_feature_names().len()
    }

    /// Scratch slot needed during spatial accumulation.
    fn new_spatial_scratch(&self) -> Scratch {
        Scratch::None
    }

    /// Scratch slot needed during temporal accumulation.
    fn new_temporal_scratch(&self) -> Scratch {
        Scratch::None
    }

    /// Write the neutral raw state into the spatial slice.
    fn init_spatial(&self, scratch: &mut Scratch, vector: &mut [f32]);

    /// Fold one observation into the raw spatial state.
    fn aggregate_spatial(
        &self,
        scratch: &mut Scratch,
        observation: &Observation,
        vector: &mut [f32],
    );

    /// Convert the raw spatial state into its finalized representation.
    fn complete_spatial(&self, scratch: &mut Scratch, num_obs: u32, vector: &mut [f32]);

    /// Write the neutral raw state into the temporal slice.
    fn init_temporal(&self, scratch: &mut Scratch, vector: &mut [f32]);

    /// Fold one finalized spatial slice, weighted by its observation
    /// count, into the raw temporal state.
    fn aggregate_temporal(
        &self,
        scratch: &mut Scratch,
        spatial_vector: &[f32],
        spatial_num_obs: u32,
        vector: &mut [f32],
    );

    /// Convert the raw temporal state into its finalized representation.
    fn complete_temporal(&self, scratch: &mut Scratch, num_obs: u32, vector: &mut [f32]);
}

/// Factory for one aggregator type, keyed by its string type tag.
pub trait AggregatorDescriptor: Send + Sync {
    /// The type tag this descriptor answers to, e.g. `"MIN_MAX"`.
    fn type_tag(&self) -> &str;

    /// Build an aggregator from a type-tagged configuration, resolving
    /// every referenced variable name against the context.
    fn create_aggregator(
        &self,
        ctx: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>>;
}

/// Catalog of aggregator descriptors, keyed by type tag.
///
/// The registry is an explicit value: binning runs receive the catalog
/// they should resolve against rather than reaching for a hidden global.
/// [`default_registry`] provides the shared process-wide catalog for
/// callers that want the conventional plugin behavior.
#[derive(Default, Clone)]
pub struct AggregatorRegistry {
    descriptors: HashMap<String, Arc<dyn AggregatorDescriptor>>,
}

impl AggregatorRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry populated with the built-in descriptors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(AverageDescriptor));
        registry.register(Arc::new(AverageMLDescriptor));
        registry.register(Arc::new(MinMaxDescriptor));
        registry.register(Arc::new(PercentileDescriptor));
        registry.register(Arc::new(OnMaxSetDescriptor));
        registry
    }

    /// Register a descriptor. A later registration for the same tag
    /// replaces the earlier one.
    pub fn register(&mut self, descriptor: Arc<dyn AggregatorDescriptor>) {
        let tag = descriptor.type_tag().to_string();
        if self.descriptors.insert(tag.clone(), descriptor).is_some() {
            tracing::warn!(type_tag = %tag, "Replacing previously registered aggregator descriptor");
        }
    }

    /// Look up the descriptor for a type tag.
    ///
    /// A miss is an expected condition ("this type is not supported"),
    /// not an error.
    pub fn descriptor(&self, type_tag: &str) -> Option<Arc<dyn AggregatorDescriptor>> {
        self.descriptors.get(type_tag).cloned()
    }

    /// All registered descriptors.
    pub fn descriptors(&self) -> Vec<Arc<dyn AggregatorDescriptor>> {
        self.descriptors.values().cloned().collect()
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the registry has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The process-wide descriptor catalog, initialized with the built-in
/// types on first use.
///
/// Plugins extend it during process startup; binning runs only read it.
/// Tests that need isolation should build their own
/// [`AggregatorRegistry`] instead.
pub fn default_registry() -> &'static RwLock<AggregatorRegistry> {
    static REGISTRY: Lazy<RwLock<AggregatorRegistry>> =
        Lazy::new(|| RwLock::new(AggregatorRegistry::with_defaults()));
    &REGISTRY
}

/// Build feature names from a variable name and per-feature suffixes,
/// e.g. `("sst", ["sum", "sum_sq"])` -> `["sst_sum", "sst_sum_sq"]`.
pub(crate) fn feature_names(var_name: &str, suffixes: &[&str]) -> Vec<String> {
    suffixes
        .iter()
        .map(|suffix| format!("{}_{}", var_name, suffix))
        .collect()
}

/// Whether a value matches the configured no-data sentinel.
pub(crate) fn is_no_data(fill_value: Option<f32>, value: f32) -> bool {
    match fill_value {
        Some(fill) => value == fill || (fill.is_nan() && value.is_nan()),
        None => false,
    }
}
