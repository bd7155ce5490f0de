//! Border reflector.
//!
//! Runs after the field-edge integrator. For each agent, tests its last-step
//! motion segment (`last_pos -> position`) against every configured border
//! segment; the first border hit wins, position is rewound to `last_pos`,
//! and velocity is reflected off that border via [`crate::geometry::reflect`].

use glam::Vec2;
use rayon::prelude::*;

use crate::geometry::{reflect, segments_intersect};
use crate::types::Border;

/// First-hit-wins border reflection over the borders list, one agent at a
/// time. Borders are tested in the order they were configured in; only the
/// first hit counts.
pub fn reflect_borders(
    positions: &mut [Vec2],
    last_pos: &[Vec2],
    velocities: &mut [Vec2],
    borders: &[Border],
) {
    if borders.is_empty() {
        return;
    }

    positions
        .par_iter_mut()
        .zip(last_pos.par_iter())
        .zip(velocities.par_iter_mut())
        .for_each(|((pos, last), v)| {
            for &(b1, b2) in borders {
                if segments_intersect(*last, *pos, b1, b2) {
                    let new_v = reflect(*last, *pos, b1, b2, *v);
                    *v = new_v;
                    *pos = *last;
                    break;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_crossing_horizontal_border_is_rewound_and_reflected() {
        let mut positions = vec![Vec2::new(2.0, -1.0)];
        let last_pos = vec![Vec2::new(2.0, 1.0)];
        let mut velocities = vec![Vec2::new(0.0, -2.0)];
        let borders = vec![(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0))];

        reflect_borders(&mut positions, &last_pos, &mut velocities, &borders);

        assert_eq!(positions[0], last_pos[0]);
        assert!(velocities[0].y > 0.0);
    }

    #[test]
    fn agent_not_crossing_any_border_is_untouched() {
        let mut positions = vec![Vec2::new(50.0, 50.0)];
        let last_pos = vec![Vec2::new(40.0, 40.0)];
        let mut velocities = vec![Vec2::new(1.0, 1.0)];
        let borders = vec![(Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0))];

        reflect_borders(&mut positions, &last_pos, &mut velocities, &borders);

        assert_eq!(positions[0], Vec2::new(50.0, 50.0));
        assert_eq!(velocities[0], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn first_configured_border_wins_when_multiple_are_crossed() {
        // Two borders both lie on the agent's motion segment; only the
        // first in the list should apply.
        let mut positions = vec![Vec2::new(0.0, -5.0)];
        let last_pos = vec![Vec2::new(0.0, 5.0)];
        let mut velocities = vec![Vec2::new(0.0, -1.0)];
        let borders = vec![
            (Vec2::new(-10.0, 2.0), Vec2::new(10.0, 2.0)),
            (Vec2::new(-10.0, -2.0), Vec2::new(10.0, -2.0)),
        ];

        reflect_borders(&mut positions, &last_pos, &mut velocities, &borders);

        assert_eq!(positions[0], last_pos[0]);
        assert!(velocities[0].y > 0.0);
    }

    #[test]
    fn no_borders_configured_is_a_no_op() {
        let mut positions = vec![Vec2::new(5.0, 5.0)];
        let last_pos = vec![Vec2::new(0.0, 0.0)];
        let mut velocities = vec![Vec2::new(1.0, 1.0)];
        reflect_borders(&mut positions, &last_pos, &mut velocities, &[]);
        assert_eq!(positions[0], Vec2::new(5.0, 5.0));
        assert_eq!(velocities[0], Vec2::new(1.0, 1.0));
    }
}
