//! Greedy radius merge of nearby points into weighted centroids.
//!
//! Each unconsumed point seeds a cluster; every later unconsumed point that is
//! closer than `threshold` to the cluster's *running* centroid is folded in.
//! The result depends on input order and may chain points that are further
//! apart than `threshold`. That is the expected behavior for hotspot drawing.

use crate::models::ClickPoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cluster {
    pub x: f64,
    pub y: f64,
    pub count: u32,
}

impl Cluster {
    fn seed(point: &ClickPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            count: 1,
        }
    }

    fn distance_to(&self, point: &ClickPoint) -> f64 {
        (self.x - point.x).hypot(self.y - point.y)
    }

    fn absorb(&mut self, point: &ClickPoint) {
        let n = f64::from(self.count);
        self.x = (self.x * n + point.x) / (n + 1.0);
        self.y = (self.y * n + point.y) / (n + 1.0);
        self.count += 1;
    }
}

/// O(n²) in the number of points. Non-finite points are ignored.
pub fn cluster_points(points: &[ClickPoint], threshold: f64) -> Vec<Cluster> {
    let points: Vec<&ClickPoint> = points.iter().filter(|p| p.is_finite()).collect();
    let mut consumed = vec![false; points.len()];
    let mut clusters = Vec::new();

    for i in 0..points.len() {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;
        let mut cluster = Cluster::seed(points[i]);

        for j in (i + 1)..points.len() {
            if !consumed[j] && cluster.distance_to(points[j]) < threshold {
                cluster.absorb(points[j]);
                consumed[j] = true;
            }
        }

        clusters.push(cluster);
    }

    clusters
}
