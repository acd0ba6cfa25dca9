use crate::constants::GRID_NODE_COUNT;
use crate::math_utils::mean;
use crate::sim::{Exhaustion, Integrator, RunPolicy};
use crate::soil::SoilProfile;
use std::ops::Range;

/// Mapping of profile layers onto a uniform 1-D node grid.
///
/// Each layer owns `floor(depth / dx)` consecutive nodes in profile order.
/// Truncation can leave trailing nodes that belong to no layer; those nodes
/// carry zero concentration and zero diffusivity and are not averaged into
/// any layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGrid {
    dx: f64,
    node_count: usize,
    ranges: Vec<Range<usize>>,
}

impl LayerGrid {
    pub fn new(depths: &[f64], node_count: usize) -> Self {
        let total_depth: f64 = depths.iter().sum();
        let dx = total_depth / node_count as f64;

        let mut ranges = Vec::with_capacity(depths.len());
        let mut start = 0usize;
        for depth in depths {
            // `as` truncates toward zero and maps NaN/negatives to 0
            let points = (depth / dx) as usize;
            let begin = start.min(node_count);
            let end = start.saturating_add(points).min(node_count);
            ranges.push(begin..end);
            start = start.saturating_add(points);
        }

        Self {
            dx,
            node_count,
            ranges,
        }
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Nodes past the last painted layer.
    pub fn unassigned(&self) -> Range<usize> {
        let painted_end = self.ranges.last().map_or(0, |r| r.end);
        painted_end..self.node_count
    }

    /// Spread one value per layer over that layer's nodes; other nodes stay zero.
    pub fn paint(&self, per_layer: &[f64]) -> Vec<f64> {
        let mut field = vec![0.0; self.node_count];
        for (range, value) in self.ranges.iter().zip(per_layer) {
            field[range.clone()].fill(*value);
        }
        field
    }

    /// Mean of `field` over each layer's node range.
    pub fn layer_means(&self, field: &[f64]) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|range| mean(&field[range.clone()]))
            .collect()
    }
}

/// Model 2: explicit finite-difference diffusion over the layer grid
///
/// Interior nodes follow
/// `C'[i] = C[i] + dt/dx² * (D⁺ (C[i+1] - C[i]) - D⁻ (C[i] - C[i-1]))`
/// with `D±` the mean of the node's and its neighbour's coefficient. The two
/// end nodes are never updated. No stability bound is enforced; an unstable
/// `dt`/`dx` pair simply diverges.
#[derive(Debug, Clone)]
pub struct ContinuumDiffusion {
    grid: LayerGrid,
    concentration: Vec<f64>,
    diffusivity: Vec<f64>,
    scratch: Vec<f64>,
}

impl ContinuumDiffusion {
    pub fn new(grid: LayerGrid, initial_conc: &[f64], coefficients: &[f64]) -> Self {
        let concentration = grid.paint(initial_conc);
        let diffusivity = grid.paint(coefficients);
        let scratch = concentration.clone();
        Self {
            grid,
            concentration,
            diffusivity,
            scratch,
        }
    }

    pub fn from_profile(profile: &SoilProfile) -> Self {
        Self::with_node_count(profile, GRID_NODE_COUNT)
    }

    pub fn with_node_count(profile: &SoilProfile, node_count: usize) -> Self {
        let grid = LayerGrid::new(&profile.depths(), node_count);
        Self::new(
            grid,
            &profile.initial_concentrations(),
            &profile.transport_values(),
        )
    }

    pub fn grid(&self) -> &LayerGrid {
        &self.grid
    }

    pub fn concentration(&self) -> &[f64] {
        &self.concentration
    }

    pub fn diffusivity(&self) -> &[f64] {
        &self.diffusivity
    }
}

impl Integrator for ContinuumDiffusion {
    fn name(&self) -> &str {
        "ContinuumDiffusion"
    }

    fn step(&mut self, dt: f64) {
        let c = &self.concentration;
        let d = &self.diffusivity;
        let factor = dt / (self.grid.dx * self.grid.dx);

        self.scratch.copy_from_slice(c);
        let n = c.len();
        for i in 1..n.saturating_sub(1) {
            let d_ip = (d[i] + d[i + 1]) / 2.0;
            let d_im = (d[i] + d[i - 1]) / 2.0;
            self.scratch[i] = c[i] + factor * (d_ip * (c[i + 1] - c[i]) - d_im * (c[i] - c[i - 1]));
        }
        std::mem::swap(&mut self.concentration, &mut self.scratch);
    }

    fn layer_values(&self) -> Vec<f64> {
        self.grid.layer_means(&self.concentration)
    }

    fn total_mass(&self) -> f64 {
        self.concentration.iter().sum::<f64>() * self.grid.dx
    }

    fn policy(&self) -> RunPolicy {
        RunPolicy {
            record_initial: false,
            on_exhausted: Exhaustion::ReturnHistory,
        }
    }

    /// The requested `dt` is spread over the whole iteration budget.
    fn effective_dt(&self, requested_dt: f64, max_iter: usize) -> f64 {
        requested_dt / max_iter as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn even_split_paints_every_node() {
        let grid = LayerGrid::new(&[50.0, 50.0], 100);
        assert_eq!(grid.dx(), 1.0);
        assert_eq!(grid.ranges(), &[0..50, 50..100]);
        assert!(grid.unassigned().is_empty());
    }

    #[test]
    fn uneven_split_leaves_trailing_nodes_unpainted() {
        let grid = LayerGrid::new(&[10.0, 10.0, 10.0], 100);
        assert_eq!(grid.ranges(), &[0..33, 33..66, 66..99]);
        assert_eq!(grid.unassigned(), 99..100);

        let field = grid.paint(&[1.0, 2.0, 3.0]);
        assert_eq!(field[98], 3.0);
        assert_eq!(field[99], 0.0);
    }

    #[test]
    fn thin_layer_gets_no_nodes_and_nan_mean() {
        let grid = LayerGrid::new(&[99.5, 0.5], 100);
        assert_eq!(grid.ranges()[1].len(), 0);
        let means = grid.layer_means(&grid.paint(&[1.0, 2.0]));
        assert_eq!(means[0], 1.0);
        assert!(means[1].is_nan());
    }

    #[test]
    fn boundary_nodes_never_change() {
        let grid = LayerGrid::new(&[5.0, 5.0], 10);
        let mut model = ContinuumDiffusion::new(grid, &[10.0, 0.0], &[0.1, 0.1]);
        for _ in 0..50 {
            model.step(0.5);
        }
        assert_eq!(model.concentration()[0], 10.0);
        assert_eq!(model.concentration()[9], 0.0);
    }

    #[test]
    fn single_step_matches_stencil() {
        let grid = LayerGrid::new(&[2.0, 2.0], 4);
        let mut model = ContinuumDiffusion::new(grid, &[1.0, 0.0], &[1.0, 3.0]);
        // dx = 1, C = [1, 1, 0, 0], D = [1, 1, 3, 3]
        model.step(0.1);
        let c = model.concentration();
        // i = 1: D+ = 2, D- = 1 -> 1 + 0.1 * (2 * -1 - 0) = 0.8
        assert_abs_diff_eq!(c[1], 0.8, epsilon = 1e-15);
        // i = 2: D+ = 3, D- = 2 -> 0 + 0.1 * (0 - 2 * -1) = 0.2
        assert_abs_diff_eq!(c[2], 0.2, epsilon = 1e-15);
        let means = model.layer_values();
        assert_abs_diff_eq!(means[0], 0.9, epsilon = 1e-15);
        assert_abs_diff_eq!(means[1], 0.1, epsilon = 1e-15);
    }

    #[test]
    fn effective_dt_spreads_over_budget() {
        let grid = LayerGrid::new(&[1.0], 10);
        let model = ContinuumDiffusion::new(grid, &[1.0], &[1.0]);
        assert_eq!(model.effective_dt(86_400.0, 10_000), 8.64);
    }

    #[test]
    fn interior_mass_moves_without_loss_away_from_edges() {
        let grid = LayerGrid::new(&[10.0, 10.0, 10.0], 30);
        let mut model = ContinuumDiffusion::new(grid, &[0.0, 6.0, 0.0], &[0.01, 0.01, 0.01]);
        let before = model.total_mass();
        model.step(1.0);
        assert_abs_diff_eq!(model.total_mass(), before, epsilon = 1e-9);
    }
}
