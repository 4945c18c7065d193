//! Soilseg - color segmentation and region statistics for soil photographs.
//!
//! Each input image feeds two independent halves:
//! - Histograms of the raw and HSV channels, reduced to a 6-value feature vector
//! - A blur, range-threshold, erode, dilate chain whose mask is traced into
//!   regions with area and centroid, filtered by an area range
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use soilseg::{load_image, Analyzer, PipelineConfig};
//!
//! let image = load_image("samples/soil_07.jpg".as_ref())?;
//! let config = PipelineConfig::load("soil.yaml".as_ref())?;
//!
//! let analysis = Analyzer::default().analyze(&image, &config)?;
//! println!("{} regions, features {:?}", analysis.region_count(), analysis.features());
//! ```

pub mod analysis;
pub mod batch;
pub mod color;
pub mod config;
mod error;
pub mod histogram;
pub mod io;
pub mod segmentation;
pub mod session;
pub mod tracking;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use color::ColorSpace;
pub use config::{ChannelBounds, ParamLimits, PipelineConfig};
pub use error::{Error, Result};

// ============================================================================
// Pipeline
// ============================================================================

pub use analysis::{Analysis, Analyzer, HistogramSummary, PassOutput};
pub use histogram::{ColorHistogram, FeatureVector, Histogram, MeanSource};
pub use segmentation::{segment, segment_stages, SegmentationStages};
pub use tracking::{track, Region, TrackingResult};

// ============================================================================
// Drivers
// ============================================================================

pub use batch::{run_batch, BatchOptions, BatchReport};
pub use io::load_image;
pub use session::{CalibrationSession, ConfigSnapshot, SharedConfig, StopToken};
