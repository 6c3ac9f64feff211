//! Driver layer folding observation streams into per-cell bins.
//!
//! The [`SpatialBinner`] consumes the observations of one pass, keeps one
//! active bin per touched grid cell and finalizes them all at the end of
//! the pass. The [`TemporalBinner`] folds the completed spatial bins of
//! one cell, possibly gathered from many passes, into the final temporal
//! record. Parallel callers partition work by grid index: each bin is
//! owned by one binner, and independently produced spatial bins merge
//! associatively on the temporal side.

use std::collections::HashMap;

use tracing::info;

use crate::bins::{BinContext, SpatialBin, TemporalBin};
use crate::manager::BinManager;
use crate::observation::Observation;

/// The target grid: maps a geographic position to its grid cell number
/// (a plane-filling-curve index).
///
/// Implementations live outside this crate; tests use simple equal-angle
/// grids.
pub trait BinningGrid {
    /// Cell number for a geographic position, in degrees.
    fn bin_index(&self, lat: f64, lon: f64) -> i64;

    /// Total number of cells in the grid.
    fn num_bins(&self) -> i64;
}

/// Accumulates the observations of one pass into per-cell spatial bins.
pub struct SpatialBinner<'a> {
    manager: &'a BinManager,
    grid: &'a dyn BinningGrid,
    active: HashMap<i64, (SpatialBin, BinContext)>,
    num_obs: u64,
}

impl<'a> SpatialBinner<'a> {
    /// Create a binner for one pass.
    pub fn new(manager: &'a BinManager, grid: &'a dyn BinningGrid) -> Self {
        Self {
            manager,
            grid,
            active: HashMap::new(),
            num_obs: 0,
        }
    }

    /// Fold a stream of observations, creating bins for cells touched
    /// for the first time. Returns the number of observations consumed
    /// by this call.
    pub fn process_observations<I>(&mut self, observations: I) -> u64
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut consumed = 0;
        for observation in observations {
            let index = self.grid.bin_index(observation.lat, observation.lon);
            let (bin, ctx) = self.active.entry(index).or_insert_with(|| {
                (
                    self.manager.create_spatial_bin(index),
                    self.manager.create_spatial_context(),
                )
            });
            self.manager.aggregate_spatial_bin(&observation, bin, ctx);
            consumed += 1;
        }
        self.num_obs += consumed;
        consumed
    }

    /// Number of grid cells touched so far.
    pub fn bin_count(&self) -> usize {
        self.active.len()
    }

    /// Finalize every active bin and return them sorted by grid index.
    pub fn complete(self) -> Vec<SpatialBin> {
        let manager = self.manager;
        let num_obs = self.num_obs;
        let mut bins: Vec<SpatialBin> = self
            .active
            .into_values()
            .map(|(mut bin, mut ctx)| {
                manager.complete_spatial_bin(&mut bin, &mut ctx);
                bin
            })
            .collect();
        bins.sort_by_key(|bin| bin.index);

        info!(
            num_obs = num_obs,
            bin_count = bins.len(),
            "Spatial binning pass done"
        );
        bins
    }
}

/// Folds completed spatial bins into per-cell temporal records.
pub struct TemporalBinner<'a> {
    manager: &'a BinManager,
}

impl<'a> TemporalBinner<'a> {
    /// Create a temporal binner over the same manager that produced the
    /// spatial bins.
    pub fn new(manager: &'a BinManager) -> Self {
        Self { manager }
    }

    /// Aggregate all spatial bins of one grid cell into its finalized
    /// temporal record.
    pub fn process_spatial_bins<'b, I>(&self, index: i64, spatial_bins: I) -> TemporalBin
    where
        I: IntoIterator<Item = &'b SpatialBin>,
    {
        let mut temporal_bin = self.manager.create_temporal_bin(index);
        let mut ctx = self.manager.create_temporal_context();
        for spatial_bin in spatial_bins {
            self.manager
                .aggregate_temporal_bin(spatial_bin, &mut temporal_bin, &mut ctx);
        }
        self.manager.complete_temporal_bin(&mut temporal_bin, &mut ctx);
        temporal_bin
    }
}
