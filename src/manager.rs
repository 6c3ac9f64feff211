//! The bin lifecycle: composition of aggregators over a fixed layout.
//!
//! A [`BinManager`] owns an ordered list of aggregators and computes,
//! once, where each aggregator's slice lives inside the spatial and
//! temporal feature vectors. Every bin it creates shares that layout for
//! the manager's lifetime. The manager is stateless after construction
//! and may be shared read-only across workers; the bins and contexts it
//! hands out have exactly one owner at a time.

use tracing::debug;

use crate::aggregators::Aggregator;
use crate::bins::{BinContext, SpatialBin, TemporalBin};
use crate::error::{GridbinError, Result};
use crate::observation::Observation;

#[derive(Debug, Clone, Copy)]
struct Span {
    offset: usize,
    len: usize,
}

impl Span {
    fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Composes aggregators into the per-cell bin lifecycle.
impl std::fmt::Debug for BinManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinManager")
            .field("aggregators", &self.aggregators.len())
            .field("spatial_spans", &self.spatial_spans)
            .field("temporal_spans", &self.temporal_spans)
            .field("spatial_feature_count", &self.spatial_feature_count)
            .field("temporal_feature_count", &self.temporal_feature_count)
            .field("spatial_feature_names", &self.spatial_feature_names)
            .field("temporal_feature_names", &self.temporal_feature_names)
            .finish()
    }
}

pub struct BinManager {
    aggregators: Vec<Box<dyn Aggregator>>,
    spatial_spans: Vec<Span>,
    temporal_spans: Vec<Span>,
    spatial_feature_count: usize,
    temporal_feature_count: usize,
    spatial_feature_names: Vec<String>,
    temporal_feature_names: Vec<String>,
}

impl BinManager {
    /// Create a manager over an ordered, non-empty aggregator list.
    pub fn new(aggregators: Vec<Box<dyn Aggregator>>) -> Result<Self> {
        if aggregators.is_empty() {
            return Err(GridbinError::Config {
                message: "At least one aggregator is required".to_string(),
            });
        }

        let mut spatial_spans = Vec::with_capacity(aggregators.len());
        let mut temporal_spans = Vec::with_capacity(aggregators.len());
        let mut spatial_feature_names = Vec::new();
        let mut temporal_feature_names = Vec::new();
        let mut spatial_offset = 0;
        let mut temporal_offset = 0;

        for aggregator in &aggregators {
            let spatial_len = aggregator.spatial_feature_count();
            spatial_spans.push(Span {
                offset: spatial_offset,
                len: spatial_len,
            });
            spatial_offset += spatial_len;
            spatial_feature_names.extend_from_slice(aggregator.spatial_feature_names());

            let temporal_len = aggregator.temporal_feature_count();
            temporal_spans.push(Span {
                offset: temporal_offset,
                len: temporal_len,
            });
            temporal_offset += temporal_len;
            temporal_feature_names.extend_from_slice(aggregator.temporal_feature_names());
        }

        debug!(
            aggregator_count = aggregators.len(),
            spatial_feature_count = spatial_offset,
            temporal_feature_count = temporal_offset,
            "Computed bin vector layout"
        );

        Ok(Self {
            aggregators,
            spatial_spans,
            temporal_spans,
            spatial_feature_count: spatial_offset,
            temporal_feature_count: temporal_offset,
            spatial_feature_names,
            temporal_feature_names,
        })
    }

    /// Number of composed aggregators.
    pub fn aggregator_count(&self) -> usize {
        self.aggregators.len()
    }

    /// The composed aggregators, in registration order.
    pub fn aggregators(&self) -> &[Box<dyn Aggregator>] {
        &self.aggregators
    }

    /// Total width of the spatial feature vector.
    pub fn spatial_feature_count(&self) -> usize {
        self.spatial_feature_count
    }

    /// Total width of the temporal feature vector.
    pub fn temporal_feature_count(&self) -> usize {
        self.temporal_feature_count
    }

    /// Concatenated spatial feature names, in vector order.
    pub fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_feature_names
    }

    /// Concatenated temporal feature names, in vector order.
    pub fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_feature_names
    }

    /// Create an empty spatial bin sized to the manager's layout.
    pub fn create_spatial_bin(&self, index: i64) -> SpatialBin {
        SpatialBin::new(index, self.spatial_feature_count)
    }

    /// Create an empty temporal bin sized to the manager's layout.
    pub fn create_temporal_bin(&self, index: i64) -> TemporalBin {
        TemporalBin::new(index, self.temporal_feature_count)
    }

    /// Create the scratch context for one spatial bin.
    pub fn create_spatial_context(&self) -> BinContext {
        BinContext::new(
            self.aggregators
                .iter()
                .map(|a| a.new_spatial_scratch())
                .collect(),
        )
    }

    /// Create the scratch context for one temporal bin.
    pub fn create_temporal_context(&self) -> BinContext {
        BinContext::new(
            self.aggregators
                .iter()
                .map(|a| a.new_temporal_scratch())
                .collect(),
        )
    }

    /// Fold one observation into a spatial bin.
    ///
    /// The first call for a bin writes each aggregator's neutral state
    /// before accumulating.
    ///
    /// # Panics
    ///
    /// Panics if the bin or context does not match the manager's layout.
    pub fn aggregate_spatial_bin(
        &self,
        observation: &Observation,
        bin: &mut SpatialBin,
        ctx: &mut BinContext,
    ) {
        self.check_spatial_layout(bin, ctx);
        if !ctx.is_initialized() {
            for (i, aggregator) in self.aggregators.iter().enumerate() {
                let span = self.spatial_spans[i];
                aggregator.init_spatial(ctx.slot_mut(i), &mut bin.features[span.range()]);
            }
            ctx.mark_initialized();
        }
        for (i, aggregator) in self.aggregators.iter().enumerate() {
            let span = self.spatial_spans[i];
            aggregator.aggregate_spatial(
                ctx.slot_mut(i),
                observation,
                &mut bin.features[span.range()],
            );
        }
        bin.num_obs += 1;
    }

    /// Finalize a spatial bin once accumulation for its cell is done.
    ///
    /// # Panics
    ///
    /// Panics if the bin or context does not match the manager's layout.
    pub fn complete_spatial_bin(&self, bin: &mut SpatialBin, ctx: &mut BinContext) {
        self.check_spatial_layout(bin, ctx);
        for (i, aggregator) in self.aggregators.iter().enumerate() {
            let span = self.spatial_spans[i];
            aggregator.complete_spatial(
                ctx.slot_mut(i),
                bin.num_obs,
                &mut bin.features[span.range()],
            );
        }
    }

    /// Fold one finalized spatial bin into a temporal bin.
    ///
    /// # Panics
    ///
    /// Panics if either bin or the context does not match the manager's
    /// layout.
    pub fn aggregate_temporal_bin(
        &self,
        spatial_bin: &SpatialBin,
        temporal_bin: &mut TemporalBin,
        ctx: &mut BinContext,
    ) {
        assert_eq!(
            spatial_bin.features.len(),
            self.spatial_feature_count,
            "spatial bin feature width does not match manager layout"
        );
        self.check_temporal_layout(temporal_bin, ctx);
        if !ctx.is_initialized() {
            for (i, aggregator) in self.aggregators.iter().enumerate() {
                let span = self.temporal_spans[i];
                aggregator.init_temporal(ctx.slot_mut(i), &mut temporal_bin.features[span.range()]);
            }
            ctx.mark_initialized();
        }
        for (i, aggregator) in self.aggregators.iter().enumerate() {
            let spatial_span = self.spatial_spans[i];
            let temporal_span = self.temporal_spans[i];
            aggregator.aggregate_temporal(
                ctx.slot_mut(i),
                &spatial_bin.features[spatial_span.range()],
                spatial_bin.num_obs,
                &mut temporal_bin.features[temporal_span.range()],
            );
        }
        temporal_bin.num_obs += spatial_bin.num_obs;
    }

    /// Finalize a temporal bin once all passes have been folded in.
    ///
    /// # Panics
    ///
    /// Panics if the bin or context does not match the manager's layout.
    pub fn complete_temporal_bin(&self, bin: &mut TemporalBin, ctx: &mut BinContext) {
        self.check_temporal_layout(bin, ctx);
        for (i, aggregator) in self.aggregators.iter().enumerate() {
            let span = self.temporal_spans[i];
            aggregator.complete_temporal(
                ctx.slot_mut(i),
                bin.num_obs,
                &mut bin.features[span.range()],
            );
        }
    }

    /// The sub-slice of a spatial bin belonging to one aggregator.
    ///
    /// # Panics
    ///
    /// Panics if the bin does not match the manager's layout or the
    /// aggregator index is out of bounds.
    pub fn spatial_vector<'a>(&self, bin: &'a SpatialBin, aggregator_index: usize) -> &'a [f32] {
        assert_eq!(
            bin.features.len(),
            self.spatial_feature_count,
            "spatial bin feature width does not match manager layout"
        );
        &bin.features[self.spatial_spans[aggregator_index].range()]
    }

    /// The sub-slice of a temporal bin belonging to one aggregator.
    ///
    /// # Panics
    ///
    /// Panics if the bin does not match the manager's layout or the
    /// aggregator index is out of bounds.
    pub fn temporal_vector<'a>(&self, bin: &'a TemporalBin, aggregator_index: usize) -> &'a [f32] {
        assert_eq!(
            bin.features.len(),
            self.temporal_feature_count,
            "temporal bin feature width does not match manager layout"
        );
        &bin.features[self.temporal_spans[aggregator_index].range()]
    }

    fn check_spatial_layout(&self, bin: &SpatialBin, ctx: &BinContext) {
        assert_eq!(
            bin.features.len(),
            self.spatial_feature_count,
            "spatial bin feature width does not match manager layout"
        );
        assert_eq!(
            ctx.slot_count(),
            self.aggregators.len(),
            "bin context slot count does not match manager layout"
        );
    }

    fn check_temporal_layout(&self, bin: &TemporalBin, ctx: &BinContext) {
        assert_eq!(
            bin.features.len(),
            self.temporal_feature_count,
            "temporal bin feature width does not match manager layout"
        );
        assert_eq!(
            ctx.slot_count(),
            self.aggregators.len(),
            "bin context slot count does not match manager layout"
        );
    }
}
