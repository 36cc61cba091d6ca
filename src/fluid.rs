//! # Water Surface Simulation
//!
//! A 1-D chain of mass-spring-damper nodes, one per LED, that chases a binary
//! water line. Nodes below `floor(level * N)` are pulled toward 1, the rest
//! toward 0; neighbor springs and two diffusion passes turn that hard step into
//! a soft, rippling surface. Wind perturbations are injected from outside with
//! [`FluidSimulator::disturb`].
//!
//! ## Stability
//! The integrator is explicit. It stays bounded for `tension ≤ 0.1`,
//! `damping ≤ 0.1` and `spread ≤ 0.5` (see [`FluidParams::STABLE`]); larger
//! values can diverge and are clamped at the configuration boundary, not here.

use serde::{Deserialize, Serialize};

/// Weak corrective pull toward the target water line.
pub const PUSH_GAIN: f32 = 0.02;

/// Diffusion passes run after every force step.
pub const DIFFUSION_PASSES: usize = 2;

/// Spring/damper constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidParams {
    /// Neighbor spring stiffness
    pub tension: f32,
    /// Fraction of velocity lost per step
    pub damping: f32,
    /// Neighbor smoothing per diffusion pass
    pub spread: f32,
}

impl FluidParams {
    /// Upper bounds of the range with known bounded behavior.
    pub const STABLE: FluidParams = FluidParams {
        tension: 0.1,
        damping: 0.1,
        spread: 0.5,
    };

    /// Smallest accepted value for every parameter.
    pub const MIN: f32 = 1e-4;

    /// Clamp every parameter into `[MIN, STABLE]`.
    pub fn clamped(self) -> Self {
        let fit = |value: f32, max: f32| {
            if value.is_finite() {
                value.clamp(Self::MIN, max)
            } else {
                max
            }
        };
        Self {
            tension: fit(self.tension, Self::STABLE.tension),
            damping: fit(self.damping, Self::STABLE.damping),
            spread: fit(self.spread, Self::STABLE.spread),
        }
    }

    pub fn is_stable(&self) -> bool {
        *self == self.clamped()
    }
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            tension: 0.025,
            damping: 0.02,
            spread: 0.1,
        }
    }
}

/// Per-LED node state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FluidNode {
    pub position: f32,
    pub velocity: f32,
}

#[derive(Clone, Debug, Default)]
pub struct FluidSimulator {
    nodes: Vec<FluidNode>,
    // Diffusion reads from a snapshot so every node sees the same neighbors
    scratch: Vec<f32>,
}

impl FluidSimulator {
    pub fn new(count: usize) -> Self {
        Self {
            nodes: vec![FluidNode::default(); count],
            scratch: vec![0.0; count],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[FluidNode] {
        &self.nodes
    }

    /// Reallocate for `count` nodes if the count changed. Wave state is
    /// discarded rather than resampled.
    pub fn resize(&mut self, count: usize) {
        if count != self.nodes.len() {
            *self = Self::new(count);
        }
    }

    /// Node position, 0 for an out-of-range index.
    pub fn node_height(&self, index: usize) -> f32 {
        self.nodes.get(index).map_or(0.0, |node| node.position)
    }

    /// Add `amount` to one node's velocity. Out-of-range indices are ignored.
    pub fn disturb(&mut self, index: usize, amount: f32) {
        if let Some(node) = self.nodes.get_mut(index) {
            if amount.is_finite() {
                node.velocity += amount;
            }
        }
    }

    /// Advance one step toward `target_level` (0–1).
    pub fn update(&mut self, target_level: f32, params: &FluidParams) {
        let n = self.nodes.len();
        if n == 0 {
            return;
        }
        let level = if target_level.is_finite() {
            target_level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let filled = (level * n as f32).floor() as usize;

        for (slot, node) in self.scratch.iter_mut().zip(&self.nodes) {
            *slot = node.position;
        }
        for i in 0..n {
            let here = self.scratch[i];
            let left = if i > 0 { self.scratch[i - 1] } else { here };
            let right = if i + 1 < n { self.scratch[i + 1] } else { here };
            let target = if i < filled { 1.0 } else { 0.0 };

            let spring = params.tension * (left + right - 2.0 * here);
            let push = (target - here) * PUSH_GAIN;

            let node = &mut self.nodes[i];
            node.velocity = (node.velocity + spring + push) * (1.0 - params.damping);
            node.position += node.velocity;
        }

        for _ in 0..DIFFUSION_PASSES {
            self.diffuse(params.spread);
        }
    }

    fn diffuse(&mut self, spread: f32) {
        let n = self.nodes.len();
        for (slot, node) in self.scratch.iter_mut().zip(&self.nodes) {
            *slot = node.position;
        }
        for i in 0..n {
            let here = self.scratch[i];
            let left = if i > 0 { self.scratch[i - 1] } else { here };
            let right = if i + 1 < n { self.scratch[i + 1] } else { here };
            self.nodes[i].position += spread * ((left + right) / 2.0 - here);
        }
    }

    /// Largest absolute node position.
    pub fn peak(&self) -> f32 {
        self.nodes
            .iter()
            .fold(0.0f32, |peak, node| peak.max(node.position.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_under_documented_parameters() {
        let params = FluidParams {
            tension: 0.025,
            damping: 0.02,
            spread: 0.1,
        };
        let mut fluid = FluidSimulator::new(60);
        for _ in 0..10_000 {
            fluid.update(0.5, &params);
        }
        assert!(fluid.peak() < 2.0, "peak {}", fluid.peak());
    }

    #[test]
    fn test_bounded_at_stable_limits_after_disturbance() {
        let mut fluid = FluidSimulator::new(30);
        fluid.disturb(15, 5.0);
        for _ in 0..5_000 {
            fluid.update(0.3, &FluidParams::STABLE);
        }
        assert!(fluid.peak().is_finite());
        assert!(fluid.peak() < 2.0, "peak {}", fluid.peak());
    }

    #[test]
    fn test_settles_toward_water_line() {
        let params = FluidParams::default();
        let mut fluid = FluidSimulator::new(40);
        for _ in 0..5_000 {
            fluid.update(0.5, &params);
        }
        assert!(fluid.node_height(2) > 0.8, "{}", fluid.node_height(2));
        assert!(fluid.node_height(37) < 0.2, "{}", fluid.node_height(37));
    }

    #[test]
    fn test_disturb_moves_only_that_node() {
        let mut fluid = FluidSimulator::new(5);
        fluid.disturb(2, 0.5);
        fluid.disturb(99, 1.0);
        assert_eq!(fluid.nodes()[2].velocity, 0.5);
        assert_eq!(fluid.nodes()[0].velocity, 0.0);
    }

    #[test]
    fn test_resize_resets_state() {
        let mut fluid = FluidSimulator::new(10);
        fluid.update(1.0, &FluidParams::default());
        assert!(fluid.node_height(0) != 0.0);

        fluid.resize(10);
        assert!(fluid.node_height(0) != 0.0);

        fluid.resize(12);
        assert_eq!(fluid.len(), 12);
        assert!(fluid.nodes().iter().all(|n| *n == FluidNode::default()));
    }

    #[test]
    fn test_params_clamped_into_stable_range() {
        let wild = FluidParams {
            tension: 3.0,
            damping: -1.0,
            spread: f32::NAN,
        };
        assert!(!wild.is_stable());
        let tamed = wild.clamped();
        assert!(tamed.is_stable());
        assert_eq!(tamed.tension, 0.1);
        assert_eq!(tamed.damping, FluidParams::MIN);
        assert_eq!(tamed.spread, 0.5);
        assert!(FluidParams::default().is_stable());
    }

    #[test]
    fn test_empty_chain_is_a_no_op() {
        let mut fluid = FluidSimulator::new(0);
        fluid.update(0.5, &FluidParams::default());
        fluid.disturb(0, 1.0);
        assert_eq!(fluid.node_height(0), 0.0);
    }
}
