//! Click-density heatmap: clustering, grid binning and color mapping.
//!
//! All three transforms are pure functions of one point snapshot and a
//! [`HeatmapConfig`](crate::config::HeatmapConfig). Nothing is cached between
//! calls; every new snapshot is processed from scratch.

pub mod cluster;
pub mod color;
pub mod density;
pub mod render;

pub use cluster::{Cluster, cluster_points};
pub use color::Rgb;
pub use density::{CellIntensity, DensityGrid, GridCell};
pub use render::{Hotspot, Overlay, Surface, SvgSurface};
