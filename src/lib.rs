//! # gridbin
//!
//! A fast spatial/temporal statistical binning core for satellite
//! observations.
//!
//! This library reduces streams of per-pixel observations into a fixed
//! spatial grid of statistical summaries, and further reduces those
//! per-pass summaries across time into a single record per grid cell.
//!
//! ## Key Features
//!
//! - **Pluggable aggregation algebra**: average, log-domain average,
//!   min/max, percentile and selection-by-maximum statistics, extensible
//!   through a descriptor registry
//! - **Two-phase merge protocol**: spatial accumulation per pass, then an
//!   associative temporal merge across passes
//! - **Compact binary bin format**: partial aggregates serialize to a
//!   fixed big-endian layout for sharding and distribution
//! - **Supersampled observation iteration**: deterministic sub-pixel
//!   sampling over raster tiles with exact ordering semantics
//!
//! ## Architecture
//!
//! - **Aggregation Layer**: aggregators, descriptors and the registry
//! - **Bin Layer**: bin entities, vector layout and serialization
//! - **Iteration Layer**: supersampling cursor and observation iterator
//! - **Driver Layer**: spatial and temporal binners folding streams into
//!   per-cell records

pub mod aggregators;
pub mod binner;
pub mod bins;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod observation;
pub mod sampling;
pub mod variable;

pub use aggregators::{
    default_registry, Aggregator, AggregatorDescriptor, AggregatorRegistry,
};
pub use binner::{BinningGrid, SpatialBinner, TemporalBinner};
pub use bins::{BinContext, Scratch, SpatialBin, TemporalBin, UNSET_BIN_INDEX};
pub use config::{AggregatorConfig, BinningConfig};
pub use error::{GridbinError, Result};
pub use logging::{init_tracing, log_binning_stats, log_error};
pub use manager::BinManager;
pub use observation::Observation;
pub use sampling::{
    create_sampling_points, create_sampling_steps, GeoCoding, ObservationIterator, PixelWindow,
    SamplePoint, SamplePointer,
};
pub use variable::VariableContext;
