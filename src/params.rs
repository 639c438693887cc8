//! Decomposition parameters (§6), with defaults and range validation.
//!
//! A plain struct with public fields and no builder: `Params { concavity:
//! 0.01, ..Params::default() }` covers every caller this crate has.

use serde::{Deserialize, Serialize};

use crate::callback::Logger;

/// Which primitive-set representation the decomposer rasterizes into
/// (§6 `mode`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Voxel,
    Tetra,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub max_convex_hulls: u32,
    pub resolution: u32,
    pub min_volume_per_hull: f64,
    pub concavity: f64,
    pub plane_downsampling: u32,
    pub convexhull_downsampling: u32,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub pca: bool,
    pub mode: Mode,
    pub max_vertices_per_hull: u32,
    pub convexhull_approximation: bool,
    pub max_plane_count_per_side: u32,
    /// Hard ceiling on recursive split iterations (§4.5 "Terminate the
    /// outer loop when ... `depth` iterations have been performed").
    pub depth: u32,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_convex_hulls: 64,
            resolution: 100_000,
            min_volume_per_hull: 0.0001,
            concavity: 0.0025,
            plane_downsampling: 4,
            convexhull_downsampling: 4,
            alpha: 0.05,
            beta: 0.05,
            gamma: 0.00125,
            pca: false,
            mode: Mode::Voxel,
            max_vertices_per_hull: 64,
            convexhull_approximation: true,
            max_plane_count_per_side: 16,
            depth: 10_000,
        }
    }
}

impl Params {
    /// Clamp out-of-range fields to their valid domain, logging each clamp
    /// through `logger` (§7 "Parameter out of range").
    pub fn validate(&mut self, logger: &mut dyn Logger) {
        clamp_u32(&mut self.max_convex_hulls, 1, u32::MAX, "max_convex_hulls", logger);
        clamp_u32(&mut self.resolution, 1_000, 64_000_000, "resolution", logger);
        clamp_f64(&mut self.min_volume_per_hull, 0.0, 1.0, "min_volume_per_hull", logger);
        clamp_f64(&mut self.concavity, 0.0, 1.0, "concavity", logger);
        clamp_u32(&mut self.plane_downsampling, 1, 16, "plane_downsampling", logger);
        clamp_u32(&mut self.convexhull_downsampling, 1, 16, "convexhull_downsampling", logger);
        clamp_f64(&mut self.alpha, 0.0, 1.0, "alpha", logger);
        clamp_f64(&mut self.beta, 0.0, 1.0, "beta", logger);
        clamp_f64(&mut self.gamma, 0.0, 1.0, "gamma", logger);
        clamp_u32(&mut self.max_vertices_per_hull, 4, 4096, "max_vertices_per_hull", logger);
        clamp_u32(&mut self.depth, 1, 1_000_000, "depth", logger);
    }
}

fn clamp_u32(field: &mut u32, lo: u32, hi: u32, name: &str, logger: &mut dyn Logger) {
    let clamped = (*field).clamp(lo, hi);
    if clamped != *field {
        logger.log(&format!("{name} = {} out of range [{lo}, {hi}], clamped to {clamped}", *field));
        *field = clamped;
    }
}

fn clamp_f64(field: &mut f64, lo: f64, hi: f64, name: &str, logger: &mut dyn Logger) {
    let clamped = field.clamp(lo, hi);
    if clamped != *field {
        logger.log(&format!("{name} = {} out of range [{lo}, {hi}], clamped to {clamped}", *field));
        *field = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::VecLogger;

    #[test]
    fn defaults_match_documented_values() {
        let p = Params::default();
        assert_eq!(p.max_convex_hulls, 64);
        assert_eq!(p.resolution, 100_000);
        assert_eq!(p.max_vertices_per_hull, 64);
        assert!(p.convexhull_approximation);
        assert!(!p.pca);
        assert_eq!(p.mode, Mode::Voxel);
    }

    #[test]
    fn validate_clamps_and_logs_out_of_range_fields() {
        let mut p = Params { concavity: 5.0, max_vertices_per_hull: 1, ..Params::default() };
        let mut logger = VecLogger::default();
        p.validate(&mut logger);
        assert_eq!(p.concavity, 1.0);
        assert_eq!(p.max_vertices_per_hull, 4);
        assert_eq!(logger.lines.len(), 2);
    }
}
