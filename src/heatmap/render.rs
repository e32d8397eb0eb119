//! Overlay assembly and the drawing boundary.
//!
//! `Overlay::build` runs the clusterer, the density grid and the color mapper
//! over one snapshot. Drawing goes through [`Surface`], so any 2-D backend can
//! consume the result; [`SvgSurface`] is the one the dashboard uses.

use crate::config::HeatmapConfig;
use crate::models::ClickPoint;
use serde::Serialize;
use std::fmt::Write;

use super::cluster::cluster_points;
use super::color::Rgb;
use super::density::{CellIntensity, DensityGrid};

/// Radial gradient stops as `(offset, alpha)`.
pub const HOTSPOT_STOPS: [(f64, f64); 3] = [(0.0, 0.6), (0.5, 0.3), (1.0, 0.0)];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hotspot {
    pub x: f64,
    pub y: f64,
    pub count: u32,
    pub value: f64,
    pub color: Rgb,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
    pub intensity: u32,
    pub rows: usize,
    pub cols: usize,
    pub max_density: u32,
    pub cells: Vec<CellIntensity>,
    pub hotspots: Vec<Hotspot>,
}

pub trait Surface {
    fn draw_grid_cell(&mut self, x: f64, y: f64, size: f64, color: Rgb, alpha: f64);
    fn draw_radial_blob(&mut self, hotspot: &Hotspot);
}

impl Overlay {
    pub fn build(points: &[ClickPoint], config: &HeatmapConfig) -> Self {
        let grid = DensityGrid::from_points(points, config.width, config.height, config.cell_size);
        let clusters = cluster_points(points, config.threshold);
        let max_count = clusters.iter().map(|c| c.count).max().unwrap_or(0);
        let radius = f64::from(config.intensity);

        let hotspots = clusters
            .iter()
            .map(|cluster| {
                let value = if max_count == 0 {
                    0.0
                } else {
                    f64::from(cluster.count) / f64::from(max_count)
                };
                Hotspot {
                    x: cluster.x,
                    y: cluster.y,
                    count: cluster.count,
                    value,
                    color: Rgb::from_value(value),
                    radius,
                }
            })
            .collect();

        Self {
            width: config.width,
            height: config.height,
            cell_size: grid.cell_size(),
            intensity: config.intensity,
            rows: grid.rows(),
            cols: grid.cols(),
            max_density: grid.max_density(),
            cells: grid.intensities(),
            hotspots,
        }
    }

    /// Cells first, hotspots on top. Cell opacity scales with both the
    /// normalized density and the intensity setting.
    pub fn paint<S: Surface>(&self, surface: &mut S) {
        let size = f64::from(self.cell_size);
        let scale = f64::from(self.intensity) / 100.0;
        for cell in &self.cells {
            surface.draw_grid_cell(
                cell.col as f64 * size,
                cell.row as f64 * size,
                size,
                cell.color,
                cell.value * scale,
            );
        }
        for hotspot in &self.hotspots {
            surface.draw_radial_blob(hotspot);
        }
    }

    pub fn to_svg(&self) -> String {
        let mut surface = SvgSurface::new(self.width, self.height);
        self.paint(&mut surface);
        surface.finish()
    }
}

pub struct SvgSurface {
    width: u32,
    height: u32,
    defs: String,
    body: String,
    gradients: usize,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            defs: String::new(),
            body: String::new(),
            gradients: 0,
        }
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}\" height=\"{h}\">\
<defs>{defs}</defs><rect width=\"{w}\" height=\"{h}\" fill=\"#f8f9fa\"/>{body}</svg>",
            w = self.width,
            h = self.height,
            defs = self.defs,
            body = self.body,
        )
    }
}

impl Surface for SvgSurface {
    fn draw_grid_cell(&mut self, x: f64, y: f64, size: f64, color: Rgb, alpha: f64) {
        let _ = write!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{size}\" height=\"{size}\" fill=\"{}\" fill-opacity=\"{alpha:.3}\"/>",
            color.to_hex()
        );
    }

    fn draw_radial_blob(&mut self, hotspot: &Hotspot) {
        let id = format!("hs{}", self.gradients);
        self.gradients += 1;

        let _ = write!(self.defs, "<radialGradient id=\"{id}\">");
        for (offset, alpha) in HOTSPOT_STOPS {
            let _ = write!(
                self.defs,
                "<stop offset=\"{offset}\" stop-color=\"{}\" stop-opacity=\"{alpha}\"/>",
                hotspot.color.to_hex()
            );
        }
        self.defs.push_str("</radialGradient>");

        let _ = write!(
            self.body,
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"url(#{id})\"/>",
            hotspot.x, hotspot.y, hotspot.radius
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        cells: Vec<(f64, f64, f64, Rgb, f64)>,
        blobs: Vec<Hotspot>,
    }

    impl Surface for Recorder {
        fn draw_grid_cell(&mut self, x: f64, y: f64, size: f64, color: Rgb, alpha: f64) {
            self.cells.push((x, y, size, color, alpha));
        }

        fn draw_radial_blob(&mut self, hotspot: &Hotspot) {
            self.blobs.push(*hotspot);
        }
    }

    #[test]
    fn build_and_paint_pipeline() {
        let mut points = vec![ClickPoint::at(10.0, 10.0), ClickPoint::at(12.0, 11.0)];
        points.push(ClickPoint::at(500.0, 500.0));
        let config = HeatmapConfig {
            intensity: 50,
            ..HeatmapConfig::default()
        };

        let overlay = Overlay::build(&points, &config);
        assert_eq!(overlay.max_density, 2);
        assert_eq!(overlay.cells.len(), 2);
        assert_eq!(overlay.hotspots.len(), 2);
        assert_eq!(overlay.hotspots[0].value, 1.0);
        assert_eq!(overlay.hotspots[0].color, Rgb::new(255, 0, 0));
        assert_eq!(overlay.hotspots[1].value, 0.5);
        assert_eq!(overlay.hotspots[1].radius, 50.0);

        let mut recorder = Recorder::default();
        overlay.paint(&mut recorder);
        assert_eq!(recorder.blobs.len(), 2);
        let (x, y, size, color, alpha) = recorder.cells[0];
        assert_eq!((x, y, size), (0.0, 0.0, 20.0));
        assert_eq!(color, Rgb::new(255, 0, 0));
        assert!((alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_snapshot_paints_nothing() {
        let overlay = Overlay::build(&[], &HeatmapConfig::default());
        assert_eq!(overlay.rows, 54);
        assert_eq!(overlay.cols, 96);
        assert!(overlay.cells.is_empty());
        assert!(overlay.hotspots.is_empty());

        let svg = overlay.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<circle"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn svg_contains_one_gradient_per_hotspot() {
        let points = vec![ClickPoint::at(10.0, 10.0), ClickPoint::at(300.0, 300.0)];
        let svg = Overlay::build(&points, &HeatmapConfig::default()).to_svg();
        assert_eq!(svg.matches("<radialGradient").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("url(#hs1)"));
    }
}
