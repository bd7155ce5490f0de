//! Velocity-update kernels. None of these read `state`; they only mutate
//! `velocity`, consuming whatever the previous tick wrote to the
//! intersection list for the colliding pattern.

use glam::Vec2;
use rayon::prelude::*;

use crate::types::INTERSECTION_NUM;

const CAROUSEL_ANGULAR_STEP: f32 = 0.05;
const COLLIDING_DAMPING: f32 = 0.05;
const CURSOR_PUSH_RADIUS: f32 = 100.0;
const CURSOR_PUSH_STRENGTH: f32 = 100.0;
const REPULSION_STRENGTH: f32 = 10.0;

/// FREE: velocities are left untouched.
pub fn movement_free(_velocities: &mut [Vec2]) {}

/// CAROUSEL: advance heading and re-derive velocity from it.
pub fn movement_carousel(velocities: &mut [Vec2], headings: &mut [f32], base_speed: &[f32]) {
    velocities
        .par_iter_mut()
        .zip(headings.par_iter_mut())
        .zip(base_speed.par_iter())
        .for_each(|((v, theta), speed)| {
            *theta = (*theta + CAROUSEL_ANGULAR_STEP).rem_euclid(std::f32::consts::TAU);
            *v = Vec2::new(theta.cos(), theta.sin()) * *speed;
        });
}

/// COLLIDING: damp fast agents, then repel from each listed intersecting
/// neighbor using the *previous* tick's intersection list. The one-tick
/// staleness is intentional and must not be "fixed" by reordering.
pub fn movement_colliding(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    intersections: &[u32],
) {
    let row_stride = INTERSECTION_NUM + 1;
    positions
        .par_iter()
        .zip(velocities.par_iter_mut())
        .zip(intersections.par_chunks(row_stride))
        .for_each(|((pos_i, v), row)| {
            let mut force = Vec2::ZERO;
            if v.length() > 1.0 {
                force = -(*v * COLLIDING_DAMPING);
            }

            let len = row[0] as usize;
            for &j in &row[1..1 + len] {
                let to_self = *pos_i - positions[j as usize];
                let dist = to_self.length().max(1.0);
                force += (to_self / dist.powi(3)) * REPULSION_STRENGTH;
            }

            *v += force;
        });
}

/// Cursor push add-on: pushes agents within 100 units of the cursor away
/// from it, invoked after the selected movement pattern.
pub fn cursor_push(positions: &[Vec2], velocities: &mut [Vec2], cursor: Vec2) {
    positions
        .par_iter()
        .zip(velocities.par_iter_mut())
        .for_each(|(pos_i, v)| {
            let to_self = *pos_i - cursor;
            let dist = to_self.length();
            if dist < CURSOR_PUSH_RADIUS {
                *v += (to_self / (dist * dist)) * CURSOR_PUSH_STRENGTH;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_advances_heading_and_sets_velocity_from_it() {
        let mut velocities = vec![Vec2::ZERO];
        let mut headings = vec![0.0f32];
        let base_speed = vec![2.0f32];
        movement_carousel(&mut velocities, &mut headings, &base_speed);
        assert!((headings[0] - CAROUSEL_ANGULAR_STEP).abs() < 1e-6);
        let expected = Vec2::new(CAROUSEL_ANGULAR_STEP.cos(), CAROUSEL_ANGULAR_STEP.sin()) * 2.0;
        assert!((velocities[0] - expected).length() < 1e-5);
    }

    #[test]
    fn colliding_repels_listed_neighbor() {
        let positions = vec![Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0)];
        let mut velocities = vec![Vec2::ZERO, Vec2::ZERO];
        let row_stride = INTERSECTION_NUM + 1;
        let mut intersections = vec![0u32; positions.len() * row_stride];
        intersections[0] = 1;
        intersections[1] = 1;
        movement_colliding(&positions, &mut velocities, &intersections);
        // Agent 0 is pushed away from agent 1 (negative x); force is 0 as no
        // list entry for it was set, so only agent 0 moves.
        assert!(velocities[0].x < 0.0);
        assert_eq!(velocities[1], Vec2::ZERO);
    }

    #[test]
    fn colliding_damps_fast_agents_with_no_neighbors() {
        let positions = vec![Vec2::ZERO];
        let mut velocities = vec![Vec2::new(10.0, 0.0)];
        let intersections = vec![0u32; INTERSECTION_NUM + 1];
        movement_colliding(&positions, &mut velocities, &intersections);
        assert!((velocities[0].x - 9.5).abs() < 1e-5);
    }

    #[test]
    fn cursor_push_affects_only_nearby_agents() {
        let positions = vec![Vec2::new(10.0, 0.0), Vec2::new(500.0, 500.0)];
        let mut velocities = vec![Vec2::ZERO, Vec2::ZERO];
        cursor_push(&positions, &mut velocities, Vec2::ZERO);
        assert!(velocities[0].length() > 0.0);
        assert_eq!(velocities[1], Vec2::ZERO);
    }
}
