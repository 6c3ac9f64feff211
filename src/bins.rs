//! Bin entities: the per-grid-cell aggregation state.
//!
//! A [`SpatialBin`] accumulates observations from the pixels of one pass
//! that fall into one grid cell; a [`TemporalBin`] accumulates finalized
//! spatial bins for the same cell across passes. Both carry a flat `f32`
//! feature vector whose layout is fixed by the
//! [`BinManager`](crate::BinManager) that created them.
//!
//! The binary wire format is shared by both bin kinds: `num_obs` (u32,
//! big-endian), the feature count (u32, big-endian), then one IEEE-754
//! 32-bit float per feature. The grid cell index is intentionally not part
//! of the payload; the surrounding container supplies it (or leaves it
//! unset).

use bytes::{Buf, BufMut};

use crate::error::{GridbinError, Result};

/// Sentinel index for a bin whose grid cell is supplied by the
/// surrounding context.
pub const UNSET_BIN_INDEX: i64 = -1;

/// Per-aggregator working state used only during accumulation.
///
/// The original design kept this in an untyped string-keyed map; here each
/// aggregator declares its slot type up front so no runtime casts are
/// needed.
#[derive(Debug, Clone, Default)]
pub enum Scratch {
    /// No working state between calls
    #[default]
    None,
    /// Growable list of per-pass values for order statistics
    Measurements(Vec<f32>),
}

/// Transient scratch storage for one bin, one slot per aggregator.
///
/// Not serialized. A context belongs to exactly one bin for one
/// accumulation phase (spatial or temporal) and must be created by the
/// same manager that created the bin.
#[derive(Debug, Clone)]
pub struct BinContext {
    initialized: bool,
    slots: Vec<Scratch>,
}

impl BinContext {
    pub(crate) fn new(slots: Vec<Scratch>) -> Self {
        Self {
            initialized: false,
            slots,
        }
    }

    /// Whether the owning bin has been touched by an aggregate call yet.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// Number of scratch slots (one per aggregator).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Scratch {
        &mut self.slots[index]
    }
}

/// The spatial aggregation record for one grid cell within one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBin {
    /// Grid cell number (plane-filling-curve index), or
    /// [`UNSET_BIN_INDEX`] when supplied by the surrounding context
    pub index: i64,
    /// Number of observations folded into this bin
    pub num_obs: u32,
    /// Raw or finalized feature vector, layout fixed by the manager
    pub features: Vec<f32>,
}

impl SpatialBin {
    /// Create an empty bin with the given feature vector width.
    pub fn new(index: i64, feature_count: usize) -> Self {
        Self {
            index,
            num_obs: 0,
            features: vec![0.0; feature_count],
        }
    }

    /// Write the bin payload to a byte sink.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        write_payload(self.num_obs, &self.features, buf);
    }

    /// Read a bin payload, leaving the grid index unset.
    pub fn read_from<B: Buf>(buf: &mut B) -> Result<Self> {
        let (num_obs, features) = read_payload(buf)?;
        Ok(Self {
            index: UNSET_BIN_INDEX,
            num_obs,
            features,
        })
    }

    /// Read a bin payload and stamp the out-of-band grid index onto it.
    pub fn read_from_indexed<B: Buf>(buf: &mut B, index: i64) -> Result<Self> {
        let mut bin = Self::read_from(buf)?;
        bin.index = index;
        Ok(bin)
    }
}

/// The temporal aggregation record for one grid cell across passes.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalBin {
    /// Grid cell number, or [`UNSET_BIN_INDEX`]
    pub index: i64,
    /// Total number of observations across all folded spatial bins
    pub num_obs: u32,
    /// Raw or finalized feature vector, layout fixed by the manager
    pub features: Vec<f32>,
}

impl TemporalBin {
    /// Create an empty bin with the given feature vector width.
    pub fn new(index: i64, feature_count: usize) -> Self {
        Self {
            index,
            num_obs: 0,
            features: vec![0.0; feature_count],
        }
    }

    /// Write the bin payload to a byte sink.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        write_payload(self.num_obs, &self.features, buf);
    }

    /// Read a bin payload, leaving the grid index unset.
    pub fn read_from<B: Buf>(buf: &mut B) -> Result<Self> {
        let (num_obs, features) = read_payload(buf)?;
        Ok(Self {
            index: UNSET_BIN_INDEX,
            num_obs,
            features,
        })
    }

    /// Read a bin payload and stamp the out-of-band grid index onto it.
    pub fn read_from_indexed<B: Buf>(buf: &mut B, index: i64) -> Result<Self> {
        let mut bin = Self::read_from(buf)?;
        bin.index = index;
        Ok(bin)
    }
}

fn write_payload<B: BufMut>(num_obs: u32, features: &[f32], buf: &mut B) {
    buf.put_u32(num_obs);
    buf.put_u32(features.len() as u32);
    for &value in features {
        buf.put_f32(value);
    }
}

fn read_payload<B: Buf>(buf: &mut B) -> Result<(u32, Vec<f32>)> {
    if buf.remaining() < 8 {
        return Err(GridbinError::Decode {
            message: format!(
                "Truncated bin header: {} bytes remaining, need 8",
                buf.remaining()
            ),
        });
    }
    let num_obs = buf.get_u32();
    let feature_count = buf.get_u32() as usize;

    if buf.remaining() < feature_count * 4 {
        return Err(GridbinError::Decode {
            message: format!(
                "Truncated bin payload: {} features announced, {} bytes remaining",
                feature_count,
                buf.remaining()
            ),
        });
    }
    let mut features = Vec::with_capacity(feature_count);
    for _ in 0..feature_count {
        features.push(buf.get_f32());
    }
    Ok((num_obs, features))
}
