//! Integration and field-edge reflection.

use glam::Vec2;
use rayon::prelude::*;

/// Normalizes velocities tuned against a 60 Hz tick.
const TICK_RATE_NORM: f32 = 60.0;

/// Snapshots `last_pos`, steps `positions` by `speed_mult * v * dt * 60`, and
/// clamps into `[0,x] x [0,y]`, negating the velocity component that hit a
/// wall. Clamping is inclusive at both ends.
pub fn integrate_and_reflect_walls(
    positions: &mut [Vec2],
    last_pos: &mut [Vec2],
    velocities: &mut [Vec2],
    x: f32,
    y: f32,
    speed_mult: f32,
    dt: f32,
) {
    positions
        .par_iter_mut()
        .zip(last_pos.par_iter_mut())
        .zip(velocities.par_iter_mut())
        .for_each(|((pos, last), v)| {
            *last = *pos;
            *pos += speed_mult * *v * dt * TICK_RATE_NORM;

            if pos.x < 0.0 {
                pos.x = 0.0;
                v.x *= -1.0;
            }
            if pos.x > x {
                pos.x = x;
                v.x *= -1.0;
            }
            if pos.y < 0.0 {
                pos.y = 0.0;
                v.y *= -1.0;
            }
            if pos.y > y {
                pos.y = y;
                v.y *= -1.0;
            }
        });
}
