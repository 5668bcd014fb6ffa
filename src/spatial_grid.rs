/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for efficient neighbor lookups.
 * It divides the [-1, 1]^3 domain into n^3 cubic cells indexed i + j*n + k*n^2,
 * with one extra overflow bucket at index n^3 that collects agents outside the
 * domain, so far-out wanderers keep participating in queries instead of being
 * dropped.
 *
 * The all-pairs search keeps the cell edge at least as long as the query
 * radius, so scanning each occupied cell against its precomputed neighborhood
 * visits every qualifying pair exactly once. Results match the brute-force
 * search for any input.
 */

use glam::Vec3;
use log::{debug, error};

use crate::{DOMAIN_WIDTH, MAX_RESOLUTION};

pub struct SpatialGrid {
    n: usize,                      // cells per axis
    nn: usize,                     // n^2
    nnn: usize,                    // n^3, also the overflow bucket index
    cell_size: f32,
    cells: Vec<Vec<usize>>,        // agent ids bucketed per cell, overflow last
    cell_neighbors: Vec<Vec<usize>>, // precomputed adjacency per cell
    filled: Vec<usize>,            // cells that received at least one agent
}

impl SpatialGrid {
    pub fn new(resolution: usize) -> Self {
        let mut grid = Self {
            n: 0,
            nn: 0,
            nnn: 0,
            cell_size: 0.0,
            cells: Vec::new(),
            cell_neighbors: Vec::new(),
            filled: Vec::new(),
        };
        grid.rebuild(resolution.max(1));
        grid
    }

    pub fn resolution(&self) -> usize {
        self.n
    }

    // Resolution that keeps cell_size >= radius, so the one-cell adjacency
    // window cannot miss a pair within the radius. Clamped to bound memory
    // for degenerate radii.
    pub fn resolution_for(radius: f32) -> usize {
        if !radius.is_finite() || radius <= 0.0 {
            return 1;
        }
        ((DOMAIN_WIDTH / radius) as usize).clamp(1, MAX_RESOLUTION)
    }

    // (Re)build the grid at the given resolution: recompute dimensions and
    // the per-cell adjacency. A zero resolution is reported and ignored,
    // leaving the previous grid intact.
    pub fn rebuild(&mut self, resolution: usize) {
        if resolution == 0 {
            error!("grid rebuild rejected: resolution must be positive");
            return;
        }
        self.n = resolution;
        self.nn = resolution * resolution;
        self.nnn = self.nn * resolution;
        self.cell_size = DOMAIN_WIDTH / resolution as f32;
        self.cells = vec![Vec::new(); self.nnn + 1];
        self.filled.clear();

        // Border cells pick up the overflow bucket in their window, and the
        // overflow bucket collects them back, keeping adjacency symmetric.
        self.cell_neighbors = vec![Vec::new(); self.nnn + 1];
        for k in 0..resolution {
            for j in 0..resolution {
                for i in 0..resolution {
                    let index = i + j * resolution + k * self.nn;
                    let adjacent = self.neighboring_cells(i as i64, j as i64, k as i64, 1);
                    if adjacent.contains(&self.nnn) {
                        self.cell_neighbors[self.nnn].push(index);
                    }
                    self.cell_neighbors[index] = adjacent;
                }
            }
        }
        // Out-of-domain agents see each other through the shared bucket
        self.cell_neighbors[self.nnn].push(self.nnn);

        debug!("grid rebuilt: {}^3 cells of size {}", self.n, self.cell_size);
    }

    // Drop all bucketed agents, keeping allocations for reuse.
    fn reset_cells(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.filled.clear();
    }

    // Bucket every position into its cell, or into the overflow bucket when
    // outside the domain.
    pub fn populate(&mut self, positions: &[Vec3]) {
        self.reset_cells();
        for (id, position) in positions.iter().enumerate() {
            let (i, j, k) = self.locate(*position);
            let index = self.cell_index(i, j, k);
            if self.cells[index].is_empty() {
                self.filled.push(index);
            }
            self.cells[index].push(id);
        }
    }

    // For every agent, all other agents within the radius together with the
    // squared distance. The grid path and the brute-force path report the
    // same neighbor sets; the brute path exists for correctness checks and
    // small populations.
    pub fn all_pairs_within_radius(
        &mut self,
        positions: &[Vec3],
        radius: f32,
        use_grid: bool,
    ) -> Vec<Vec<(usize, f32)>> {
        if use_grid {
            self.grid_search(positions, radius)
        } else {
            self.brute_search(positions, radius)
        }
    }

    fn grid_search(&mut self, positions: &[Vec3], radius: f32) -> Vec<Vec<(usize, f32)>> {
        let resolution = Self::resolution_for(radius);
        if self.n != resolution {
            self.rebuild(resolution);
        }
        self.populate(positions);

        let threshold_sq = radius * radius;
        let mut neighbors = vec![Vec::new(); positions.len()];
        let mut candidates = Vec::new();
        for &cell in &self.filled {
            // Agents in this cell's neighborhood, own cell included
            candidates.clear();
            for &adjacent in &self.cell_neighbors[cell] {
                candidates.extend_from_slice(&self.cells[adjacent]);
            }
            for &id1 in &self.cells[cell] {
                let p1 = positions[id1];
                for &id2 in &candidates {
                    // Each unordered pair is visited from its lower id only
                    if id2 <= id1 {
                        continue;
                    }
                    let dist_sq = (p1 - positions[id2]).length_squared();
                    if dist_sq < threshold_sq {
                        neighbors[id1].push((id2, dist_sq));
                        neighbors[id2].push((id1, dist_sq));
                    }
                }
            }
        }
        neighbors
    }

    fn brute_search(&mut self, positions: &[Vec3], radius: f32) -> Vec<Vec<(usize, f32)>> {
        // Invalidate the bucketing so point queries fall back to a full scan
        self.reset_cells();
        let threshold_sq = radius * radius;
        let mut neighbors = vec![Vec::new(); positions.len()];
        for (id1, p1) in positions.iter().enumerate() {
            for (id2, p2) in positions.iter().enumerate() {
                if id1 == id2 {
                    continue;
                }
                let dist_sq = (*p1 - *p2).length_squared();
                if dist_sq < threshold_sq {
                    neighbors[id1].push((id2, dist_sq));
                }
            }
        }
        neighbors
    }

    // All agents within the radius of an arbitrary point, using the bucketing
    // left by the last populate. Without bucketing, or when the search window
    // spans the whole grid anyway, every agent is scanned instead.
    pub fn near_point(&self, point: Vec3, positions: &[Vec3], radius: f32) -> Vec<(usize, f32)> {
        let threshold_sq = radius * radius;
        let mut near = Vec::new();

        let window = (radius / self.cell_size).ceil() as i64;
        if self.filled.is_empty() || window >= self.n as i64 {
            for (id, position) in positions.iter().enumerate() {
                let dist_sq = (*position - point).length_squared();
                if dist_sq < threshold_sq {
                    near.push((id, dist_sq));
                }
            }
            return near;
        }

        let (i, j, k) = self.locate(point);
        for cell in self.neighboring_cells(i, j, k, window) {
            for &id in &self.cells[cell] {
                let dist_sq = (positions[id] - point).length_squared();
                if dist_sq < threshold_sq {
                    near.push((id, dist_sq));
                }
            }
        }
        near
    }

    // Cell coordinates of a position; may land outside [0, n) on any axis.
    fn locate(&self, position: Vec3) -> (i64, i64, i64) {
        (
            ((position.x + 1.0) / self.cell_size).floor() as i64,
            ((position.y + 1.0) / self.cell_size).floor() as i64,
            ((position.z + 1.0) / self.cell_size).floor() as i64,
        )
    }

    // Linear index of a cell, or the overflow bucket for out-of-range coords.
    fn cell_index(&self, i: i64, j: i64, k: i64) -> usize {
        let n = self.n as i64;
        if i < 0 || i >= n || j < 0 || j >= n || k < 0 || k >= n {
            return self.nnn;
        }
        (i + j * n + k * self.nn as i64) as usize
    }

    // Cell indices within the window around (i, j, k). In-range indices are
    // distinct by construction; the overflow bucket is pushed at most once.
    fn neighboring_cells(&self, i: i64, j: i64, k: i64, window: i64) -> Vec<usize> {
        let mut cells = Vec::new();
        let mut saw_overflow = false;
        for ci in (i - window)..=(i + window) {
            for cj in (j - window)..=(j + window) {
                for ck in (k - window)..=(k + window) {
                    let index = self.cell_index(ci, cj, ck);
                    if index == self.nnn {
                        if !saw_overflow {
                            saw_overflow = true;
                            cells.push(index);
                        }
                    } else {
                        cells.push(index);
                    }
                }
            }
        }
        cells
    }
}
