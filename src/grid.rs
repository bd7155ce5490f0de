//! Uniform-grid spatial index.
//!
//! Two-pass, prefix-sum-indexed bucketing: count population per cell, turn
//! counts into a flat contiguous layout via a sequential prefix scan, then
//! scatter agent ids into their slot with an atomic cursor. Rebuilt from
//! scratch every tick, with no incremental bucket maintenance, so there is
//! no stale-membership state to chase.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec2;
use rayon::prelude::*;

pub struct UniformGrid {
    pub cell_size: f32,
    pub gx: usize,
    pub gy: usize,

    /// Population per cell, flattened as `i * gy + j`.
    circles_per_cell: Vec<u32>,
    /// Cumulative count per cell in the same flattening; see the prefix scan
    /// phase in `rebuild`.
    prefix_sum: Vec<u32>,
    /// `[begin, end)` range into `circles_id` owned by each cell.
    list_head: Vec<u32>,
    list_tail: Vec<u32>,
    /// Agent ids, grouped contiguously by cell.
    circles_id: Vec<u32>,
}

impl UniformGrid {
    pub fn new(x: f32, y: f32, r1: f32) -> Self {
        let cell_size = r1;
        let gx = (x / cell_size).floor() as usize + 1;
        let gy = (y / cell_size).floor() as usize + 1;
        Self {
            cell_size,
            gx,
            gy,
            circles_per_cell: vec![0; gx * gy],
            prefix_sum: vec![0; gx * gy],
            list_head: vec![0; gx * gy],
            list_tail: vec![0; gx * gy],
            circles_id: Vec::new(),
        }
    }

    #[inline]
    pub fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let gx = (p.x / self.cell_size).floor() as isize;
        let gy = (p.y / self.cell_size).floor() as isize;
        (
            gx.clamp(0, self.gx as isize - 1) as usize,
            gy.clamp(0, self.gy as isize - 1) as usize,
        )
    }

    #[inline]
    fn linear(&self, gx: usize, gy: usize) -> usize {
        gx * self.gy + gy
    }

    /// Rebuild the index from `positions`.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        let n = positions.len();
        self.circles_id.resize(n, 0);

        // Phase 1: zero + atomically count population per cell.
        let counts: Vec<AtomicU32> = (0..self.gx * self.gy).map(|_| AtomicU32::new(0)).collect();
        positions.par_iter().for_each(|p| {
            let (gx, gy) = self.cell_of(*p);
            counts[self.linear(gx, gy)].fetch_add(1, Ordering::Relaxed);
        });
        for (slot, c) in self.circles_per_cell.iter_mut().zip(counts.iter()) {
            *slot = c.load(Ordering::Relaxed);
        }

        // Phase 2: column sums.
        let mut column_sum = vec![0u32; self.gx];
        for i in 0..self.gx {
            let row = &self.circles_per_cell[i * self.gy..(i + 1) * self.gy];
            column_sum[i] = row.iter().sum();
        }

        // Phase 3: sequential rolling prefix scan; must stay serial.
        let mut running = 0u32;
        for i in 0..self.gx {
            let col_base = running;
            let mut acc = col_base;
            for j in 0..self.gy {
                acc += self.circles_per_cell[i * self.gy + j];
                self.prefix_sum[i * self.gy + j] = acc;
            }
            running = col_base + column_sum[i];
        }

        // Phase 4: derive [head, tail) ranges and atomic cursors.
        let cursors: Vec<AtomicU32> = (0..self.gx * self.gy)
            .map(|l| {
                let tail = self.prefix_sum[l];
                let head = tail - self.circles_per_cell[l];
                self.list_head[l] = head;
                self.list_tail[l] = tail;
                AtomicU32::new(head)
            })
            .collect();

        // Phase 5: scatter agent ids into their contiguous cell range. Each
        // cell's [head,tail) range is disjoint from every other cell's, and
        // the atomic cursor bounds each agent to a unique slot within its
        // own cell, so the scatter is race-free without touching unsafe.
        let slots: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(0)).collect();
        positions.par_iter().enumerate().for_each(|(idx, p)| {
            let (gx, gy) = self.cell_of(*p);
            let l = self.linear(gx, gy);
            let slot = cursors[l].fetch_add(1, Ordering::Relaxed);
            slots[slot as usize].store(idx as u32, Ordering::Relaxed);
        });
        for (dst, src) in self.circles_id.iter_mut().zip(slots.into_iter()) {
            *dst = src.into_inner();
        }
    }

    /// Ids occupying a given cell. The `LIMIT_PER_CELL` cap is enforced by
    /// the caller during classification, not here.
    #[inline]
    pub fn cell_ids(&self, gx: usize, gy: usize) -> &[u32] {
        let l = self.linear(gx, gy);
        let (head, tail) = (self.list_head[l] as usize, self.list_tail[l] as usize);
        &self.circles_id[head..tail]
    }

    #[inline]
    pub fn population(&self, gx: usize, gy: usize) -> u32 {
        self.circles_per_cell[self.linear(gx, gy)]
    }

    pub fn total_population(&self) -> u64 {
        self.circles_per_cell.iter().map(|&c| c as u64).sum()
    }
}
