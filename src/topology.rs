//! # LED Topology
//!
//! Maps an LED's position in the data chain to layout coordinates.
//!
//! Coordinates are screen-style (y grows downward) in "LED pitch" units:
//! - **Strip**: one column, index 0 at the bottom (`y = N - 1 - index`).
//! - **Matrix**: `width × height` cells, row 0 at the bottom, optionally
//!   serpentine (odd rows run right to left).
//! - **Ring**: evenly spaced on a circle of circumference `N`, index 0 at the
//!   top, advancing clockwise on screen.
//!
//! Animation modes mostly need the normalized [`TopologyMapper::vertical`]
//! position (0 at the bottom, 1 at the top), which lets a rising tide read the
//! same on every layout.

use core::f32::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Strip,
    Matrix,
    Ring,
}

/// Physical arrangement of the LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub kind: LayoutKind,
    pub width: usize,
    pub height: usize,
    pub serpentine: bool,
}

impl Topology {
    pub const fn strip() -> Self {
        Self {
            kind: LayoutKind::Strip,
            width: 1,
            height: 1,
            serpentine: false,
        }
    }

    pub const fn ring() -> Self {
        Self {
            kind: LayoutKind::Ring,
            ..Self::strip()
        }
    }

    pub const fn matrix(width: usize, height: usize, serpentine: bool) -> Self {
        Self {
            kind: LayoutKind::Matrix,
            width,
            height,
            serpentine,
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::strip()
    }
}

/// A point in layout coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Index ↔ coordinate mapping for one topology and LED count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TopologyMapper {
    topology: Topology,
    count: usize,
}

impl TopologyMapper {
    /// Build a mapper. A matrix too small for `count` grows extra rows, and a
    /// zero width is treated as one column.
    pub fn new(topology: Topology, count: usize) -> Self {
        let mut topology = topology;
        if topology.kind == LayoutKind::Matrix {
            topology.width = topology.width.max(1);
            topology.height = topology.height.max(count.div_ceil(topology.width)).max(1);
        }
        Self { topology, count }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Layout extent `(width, height)` in pitch units; every point returned by
    /// [`locate`](Self::locate) lies within `[0, width] × [0, height]`.
    pub fn extent(&self) -> (f32, f32) {
        match self.topology.kind {
            LayoutKind::Strip => (0.0, self.count.saturating_sub(1) as f32),
            LayoutKind::Matrix => (
                (self.topology.width - 1) as f32,
                (self.topology.height - 1) as f32,
            ),
            LayoutKind::Ring => {
                let diameter = 2.0 * self.ring_radius();
                (diameter, diameter)
            }
        }
    }

    fn ring_radius(&self) -> f32 {
        (self.count as f32 / TAU).max(1.0)
    }

    /// Matrix cell `(column, row)` for an index, row 0 at the bottom.
    pub fn cell(&self, index: usize) -> Option<(usize, usize)> {
        if self.topology.kind != LayoutKind::Matrix || index >= self.count {
            return None;
        }
        let width = self.topology.width;
        let row = index / width;
        let mut col = index % width;
        if self.topology.serpentine && row % 2 == 1 {
            col = width - 1 - col;
        }
        Some((col, row))
    }

    /// Layout position of an LED.
    pub fn locate(&self, index: usize) -> Point {
        match self.topology.kind {
            LayoutKind::Strip => Point {
                x: 0.0,
                y: self.count.saturating_sub(1).saturating_sub(index) as f32,
            },
            LayoutKind::Matrix => {
                let width = self.topology.width;
                let (col, row) = self
                    .cell(index)
                    .unwrap_or((index % width, index / width));
                Point {
                    x: col as f32,
                    y: self.topology.height.saturating_sub(1 + row) as f32,
                }
            }
            LayoutKind::Ring => {
                let radius = self.ring_radius();
                let angle = -FRAC_PI_2 + index as f32 * (TAU / self.count.max(1) as f32);
                Point {
                    x: radius + radius * angle.cos(),
                    y: radius + radius * angle.sin(),
                }
            }
        }
    }

    /// LED index at matrix coordinates `(x, y)` as returned by
    /// [`locate`](Self::locate); `None` off the grid, past the LED count, or
    /// for non-matrix layouts.
    pub fn index(&self, x: usize, y: usize) -> Option<usize> {
        if self.topology.kind != LayoutKind::Matrix {
            return None;
        }
        let (width, height) = (self.topology.width, self.topology.height);
        if x >= width || y >= height {
            return None;
        }
        let row = height - 1 - y;
        let col = if self.topology.serpentine && row % 2 == 1 {
            width - 1 - x
        } else {
            x
        };
        let index = row * width + col;
        (index < self.count).then_some(index)
    }

    /// Height of an LED as a fraction of the layout, 0 at the bottom.
    pub fn vertical(&self, index: usize) -> f32 {
        let (_, height) = self.extent();
        if height <= 0.0 {
            return 0.0;
        }
        (1.0 - self.locate(index).y / height).clamp(0.0, 1.0)
    }

    /// Horizontal position as a fraction of the layout, 0 at the left. Strips
    /// have no width and use their chain position instead.
    pub fn horizontal(&self, index: usize) -> f32 {
        let (width, _) = self.extent();
        if width <= 0.0 {
            return if self.count > 1 {
                index as f32 / (self.count - 1) as f32
            } else {
                0.0
            };
        }
        (self.locate(index).x / width).clamp(0.0, 1.0)
    }
}
