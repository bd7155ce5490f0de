//! State classification and intersection-list population.
//!
//! Ported from `compute_states`: scan the 3×3 cell neighborhood, classify
//! IDLE/INTERACT/INTERSECTION, and (only when the colliding pattern needs
//! it) record up to K intersecting neighbor ids per agent.

use glam::Vec2;
use rand::Rng;
use rayon::prelude::*;

use crate::grid::UniformGrid;
use crate::types::{AgentState, Norm, INTERSECTION_NUM, LIMIT_PER_CELL};

/// Observed-agent transition captured on the tick that `observed_id` was
/// classified. `None` when no observer is configured or the state did not
/// change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObserverCapture {
    pub agent_id: u32,
    pub prev_state: AgentState,
    pub new_state: AgentState,
    pub changer_id: Option<u32>,
}

/// Running counters for the silent accuracy trade-offs of truncation.
#[derive(Default)]
pub struct ClassifyOverflow {
    pub cell_overflow: std::sync::atomic::AtomicU64,
    pub intersection_overflow: std::sync::atomic::AtomicU64,
}

#[allow(clippy::too_many_arguments)]
pub fn classify(
    positions: &[Vec2],
    states: &mut [AgentState],
    intersections: &mut [u32],
    grid: &UniformGrid,
    norm: Norm,
    r0: f32,
    r1: f32,
    update_intersections: bool,
    observed_id: Option<u32>,
    testing_mode: bool,
    overflow: &ClassifyOverflow,
) -> Option<ObserverCapture> {
    let n = positions.len();
    let row_stride = INTERSECTION_NUM + 1;
    debug_assert_eq!(intersections.len(), n * row_stride);

    // Each agent only ever writes its own `states[i]` and its own
    // intersection row, so the per-agent work is embarrassingly parallel;
    // no cross-agent communication occurs.
    let capture = states
        .par_iter_mut()
        .zip(intersections.par_chunks_mut(row_stride))
        .enumerate()
        .filter_map(|(i, (state_i, row))| {
            classify_one(
                i,
                positions,
                state_i,
                row,
                grid,
                norm,
                r0,
                r1,
                update_intersections,
                testing_mode,
                overflow,
            )
            .filter(|_| observed_id == Some(i as u32))
        })
        .find_any(|_| true);

    capture
}

#[allow(clippy::too_many_arguments)]
fn classify_one(
    i: usize,
    positions: &[Vec2],
    state_i: &mut AgentState,
    row: &mut [u32],
    grid: &UniformGrid,
    norm: Norm,
    r0: f32,
    r1: f32,
    update_intersections: bool,
    testing_mode: bool,
    overflow: &ClassifyOverflow,
) -> Option<ObserverCapture> {
    use std::sync::atomic::Ordering;

    let prev_state = *state_i;
    let pos_i = positions[i];
    let (gx, gy) = grid.cell_of(pos_i);

    let mut state = AgentState::Idle;
    let mut changer_id: Option<u32> = None;
    let mut inter_len: usize = 0;
    if update_intersections {
        row[0] = 0;
    }

    let mut rng = rand::thread_rng();

    let gx_lo = gx.saturating_sub(1);
    let gx_hi = (gx + 1).min(grid.gx - 1);
    let gy_lo = gy.saturating_sub(1);
    let gy_hi = (gy + 1).min(grid.gy - 1);

    'scan: for ngx in gx_lo..=gx_hi {
        for ngy in gy_lo..=gy_hi {
            let population = grid.population(ngx, ngy);
            if population > LIMIT_PER_CELL {
                overflow.cell_overflow.fetch_add(1, Ordering::Relaxed);
            }
            let ids = grid.cell_ids(ngx, ngy);
            let take = (population.min(LIMIT_PER_CELL)) as usize;
            for &j in ids.iter().take(take) {
                if j as usize == i {
                    continue;
                }
                let pos_j = positions[j as usize];
                let d = norm.dist(pos_i, pos_j);

                if d <= r0 {
                    state = AgentState::Intersection;
                    changer_id = Some(j);
                    if update_intersections {
                        if inter_len < INTERSECTION_NUM {
                            row[1 + inter_len] = j;
                            inter_len += 1;
                        } else {
                            overflow
                                .intersection_overflow
                                .fetch_add(1, Ordering::Relaxed);
                        }
                        if inter_len >= INTERSECTION_NUM {
                            break 'scan;
                        }
                        // Keep scanning: the list is still being populated.
                    } else {
                        break 'scan;
                    }
                } else if d <= r1 && state != AgentState::Intersection {
                    let prob = if testing_mode {
                        1.0
                    } else {
                        let denom = d - 0.75 * r0 + f32::EPSILON;
                        1.0 / (denom * denom)
                    };
                    let u: f32 = rng.gen();
                    if u <= prob {
                        state = AgentState::Interact;
                        changer_id = Some(j);
                    }
                }
            }
        }
    }

    if update_intersections {
        row[0] = inter_len as u32;
    }
    *state_i = state;

    if prev_state == state {
        None
    } else {
        Some(ObserverCapture {
            agent_id: i as u32,
            prev_state,
            new_state: state,
            changer_id,
        })
    }
}
