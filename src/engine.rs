//! Tick driver and engine state.
//!
//! `Engine` owns every per-agent and grid buffer and is the only mutable
//! state in the crate. There is no module-level global left over from the
//! source's Taichi field declarations.

use std::f32::consts::TAU;
use std::sync::atomic::Ordering;

use glam::Vec2;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::border::reflect_borders;
use crate::classify::{classify, ClassifyOverflow};
use crate::error::{BorderError, ConfigError};
use crate::grid::UniformGrid;
use crate::integrate::integrate_and_reflect_walls;
use crate::movement::{cursor_push, movement_carousel, movement_colliding, movement_free};
use crate::observer::ObserverLog;
use crate::types::{
    AgentState, Border, InitPreset, LogsSnapshot, MovementPattern, Norm, INTERSECTION_NUM,
    MAX_BORDERS,
};

/// Configuration carried by a `reset`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub x: f32,
    pub y: f32,
    pub n: u64,
    pub r0: f32,
    pub r1: f32,
    pub init_preset: InitPreset,
}

impl EngineConfig {
    /// Enforces the field-size, agent-count, and radius-ordering invariants.
    /// Validation never mutates the engine; a reset that fails leaves the
    /// previous state untouched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1000.0..=25000.0).contains(&self.x) || !(1000.0..=25000.0).contains(&self.y) {
            return Err(ConfigError::FieldSizeOutOfRange {
                x: self.x,
                y: self.y,
            });
        }
        if !(500..=5_000_000).contains(&self.n) {
            return Err(ConfigError::AgentCountOutOfRange { n: self.n });
        }
        if !(self.r0 > 0.0 && self.r0 <= self.r1) {
            return Err(ConfigError::RadiusOrdering {
                r0: self.r0,
                r1: self.r1,
            });
        }
        if self.r1 > 50.0 {
            return Err(ConfigError::InteractRadiusTooLarge { r1: self.r1 });
        }
        Ok(())
    }
}

/// Per-tick input not carried by `EngineConfig`.
#[derive(Clone, Debug)]
pub struct TickInput {
    pub dt: f32,
    pub movement_pattern: MovementPattern,
    pub norm: Norm,
    pub speed_mult: f32,
    pub cursor_enabled: bool,
    pub cursor_pos: Vec2,
    pub observed_id: Option<u32>,
    pub testing_mode: bool,
}

/// Running accuracy-trade-off counters, exposed off the hot path.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineStats {
    pub cell_overflow_count: u64,
    pub intersection_overflow_count: u64,
}

/// Per-tick scalar bookkeeping exposed off the hot path.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineTiming {
    pub tick_count: u64,
}

pub struct Engine {
    config: EngineConfig,

    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    last_pos: Vec<Vec2>,
    states: Vec<AgentState>,
    headings: Vec<f32>,
    base_speed: Vec<f32>,
    intersections: Vec<u32>,

    grid: UniformGrid,
    borders: Vec<Border>,
    observer_log: ObserverLog,

    overflow: ClassifyOverflow,
    stats: EngineStats,
    timing: EngineTiming,
    warned_cell_overflow: bool,
    warned_intersection_overflow: bool,

    tick: u64,
}

impl Engine {
    /// Builds a fresh engine, validating `config` first. No buffers are
    /// touched if validation fails.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self {
            config,
            positions: Vec::new(),
            velocities: Vec::new(),
            last_pos: Vec::new(),
            states: Vec::new(),
            headings: Vec::new(),
            base_speed: Vec::new(),
            intersections: Vec::new(),
            grid: UniformGrid::new(config.x, config.y, config.r1),
            borders: Vec::new(),
            observer_log: ObserverLog::new(),
            overflow: ClassifyOverflow::default(),
            stats: EngineStats::default(),
            timing: EngineTiming::default(),
            warned_cell_overflow: false,
            warned_intersection_overflow: false,
            tick: 0,
        };
        engine.populate(config);
        Ok(engine)
    }

    /// Discards and reallocates every per-agent and grid buffer. Borders
    /// persist across resets.
    pub fn reset(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.populate(config);
        self.config = config;
        info!(x = config.x, y = config.y, n = config.n, r0 = config.r0, r1 = config.r1, "engine reset");
        Ok(())
    }

    fn populate(&mut self, config: EngineConfig) {
        let n = config.n as usize;
        let mut rng = rand::thread_rng();

        self.positions = Vec::with_capacity(n);
        self.velocities = Vec::with_capacity(n);
        self.headings = Vec::with_capacity(n);
        self.base_speed = Vec::with_capacity(n);

        for _ in 0..n {
            let (pos, vel) = match config.init_preset {
                InitPreset::Uniform => {
                    let pos = Vec2::new(rng.gen::<f32>() * config.x, rng.gen::<f32>() * config.y);
                    let vel = Vec2::new(
                        (rng.gen::<f32>() * 100.0 - 50.0) * 0.01,
                        (rng.gen::<f32>() * 100.0 - 50.0) * 0.01,
                    );
                    (pos, vel)
                }
                InitPreset::Clustered => {
                    let pos = Vec2::new(50.0 + rng.gen::<f32>() * 10.0, 50.0 + rng.gen::<f32>());
                    let vel = Vec2::new(10.0 + rng.gen::<f32>(), 10.0 + rng.gen::<f32>()) * 0.5;
                    (pos, vel)
                }
            };
            self.positions.push(pos);
            self.velocities.push(vel);
            // Both movement patterns' auxiliary fields are initialized
            // unconditionally, regardless of which pattern is active.
            self.headings.push(rng.gen::<f32>() * TAU);
            self.base_speed.push(3.0 + (rng.gen::<f32>() * 2.0 - 1.0));
        }

        self.last_pos = self.positions.clone();
        self.states = vec![AgentState::Idle; n];
        self.intersections = vec![0u32; n * (INTERSECTION_NUM + 1)];
        self.grid = UniformGrid::new(config.x, config.y, config.r1);
        self.overflow = ClassifyOverflow::default();
        self.stats = EngineStats::default();
        self.warned_cell_overflow = false;
        self.warned_intersection_overflow = false;
    }

    /// Replaces the border list. Rejected if it exceeds `MAX_BORDERS`
    /// segments; the previous border list is preserved.
    pub fn set_borders(&mut self, borders: Vec<Border>) -> Result<(), BorderError> {
        if borders.len() > MAX_BORDERS {
            return Err(BorderError::TooManySegments {
                got: borders.len(),
                limit: MAX_BORDERS,
            });
        }
        self.borders = borders;
        Ok(())
    }

    /// Runs one tick: movement, integration, wall and border reflection,
    /// grid rebuild, classification, then observer-log capture.
    pub fn tick(&mut self, input: &TickInput) {
        let span = tracing::debug_span!("tick", tick = self.tick);
        let _guard = span.enter();

        let update_intersections = input.movement_pattern == MovementPattern::Colliding;

        match input.movement_pattern {
            MovementPattern::Free => movement_free(&mut self.velocities),
            MovementPattern::Carousel => {
                movement_carousel(&mut self.velocities, &mut self.headings, &self.base_speed)
            }
            MovementPattern::Colliding => {
                movement_colliding(&self.positions, &mut self.velocities, &self.intersections)
            }
        }

        if input.cursor_enabled {
            cursor_push(&self.positions, &mut self.velocities, input.cursor_pos);
        }

        integrate_and_reflect_walls(
            &mut self.positions,
            &mut self.last_pos,
            &mut self.velocities,
            self.config.x,
            self.config.y,
            input.speed_mult,
            input.dt,
        );

        reflect_borders(
            &mut self.positions,
            &self.last_pos,
            &mut self.velocities,
            &self.borders,
        );

        self.grid.rebuild(&self.positions);

        let capture = classify(
            &self.positions,
            &mut self.states,
            &mut self.intersections,
            &self.grid,
            input.norm,
            self.config.r0,
            self.config.r1,
            update_intersections,
            input.observed_id,
            input.testing_mode,
            &self.overflow,
        );

        if let Some(capture) = capture {
            self.observer_log.push(self.tick, capture);
        }

        self.drain_overflow_counters();

        self.tick += 1;
        self.timing.tick_count = self.tick;
        debug!(
            cell_overflow = self.stats.cell_overflow_count,
            intersection_overflow = self.stats.intersection_overflow_count,
            "tick complete"
        );
    }

    fn drain_overflow_counters(&mut self) {
        let cell = self.overflow.cell_overflow.swap(0, Ordering::Relaxed);
        let inter = self.overflow.intersection_overflow.swap(0, Ordering::Relaxed);

        if cell > 0 {
            self.stats.cell_overflow_count += cell;
            if !self.warned_cell_overflow {
                warn!(count = cell, "a cell exceeded LIMIT_PER_CELL; neighbors beyond the cap were skipped");
                self.warned_cell_overflow = true;
            }
        }
        if inter > 0 {
            self.stats.intersection_overflow_count += inter;
            if !self.warned_intersection_overflow {
                warn!(count = inter, "an intersection list saturated at K; further neighbors were dropped");
                self.warned_intersection_overflow = true;
            }
        }
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn states(&self) -> &[AgentState] {
        &self.states
    }

    pub fn intersections(&self) -> &[u32] {
        &self.intersections
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn timing(&self) -> EngineTiming {
        self.timing
    }

    pub fn poll_logs(&mut self) -> LogsSnapshot {
        self.observer_log.poll_since_last_call()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        EngineConfig {
            x: 1000.0,
            y: 1000.0,
            n: 500,
            r0: 5.0,
            r1: 20.0,
            init_preset: InitPreset::Uniform,
        }
    }

    fn base_tick(testing_mode: bool) -> TickInput {
        TickInput {
            dt: 0.1,
            movement_pattern: MovementPattern::Free,
            norm: Norm::Euclidean,
            speed_mult: 1.0,
            cursor_enabled: false,
            cursor_pos: Vec2::ZERO,
            observed_id: None,
            testing_mode,
        }
    }

    #[test]
    fn invalid_config_is_rejected_without_mutating_engine() {
        let mut bad = small_config();
        bad.x = 10.0;
        assert!(Engine::new(bad).is_err());
    }

    #[test]
    fn reset_rejects_bad_config_and_preserves_prior_state() {
        let mut engine = Engine::new(small_config()).unwrap();
        let n_before = engine.positions().len();
        let mut bad = small_config();
        bad.n = 10;
        assert!(engine.reset(bad).is_err());
        assert_eq!(engine.positions().len(), n_before);
    }

    #[test]
    fn single_agent_free_moves_as_spec_worked_example() {
        let mut engine = Engine::new(EngineConfig {
            x: 1000.0,
            y: 1000.0,
            n: 500,
            r0: 5.0,
            r1: 20.0,
            init_preset: InitPreset::Uniform,
        })
        .unwrap();
        // Force a controlled single-agent state for the worked example.
        engine.positions = vec![Vec2::new(10.0, 10.0); 500];
        engine.velocities = vec![Vec2::new(1.0, 1.0); 500];
        engine.last_pos = engine.positions.clone();

        let mut input = base_tick(true);
        input.dt = 0.1;
        input.speed_mult = 2.0;
        engine.tick(&input);

        assert!((engine.positions()[0] - Vec2::new(22.0, 22.0)).length() < 1e-3);
    }

    #[test]
    fn positions_stay_within_field_bounds_after_a_tick() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut input = base_tick(true);
        input.movement_pattern = MovementPattern::Carousel;
        input.dt = 0.5;
        input.speed_mult = 3.0;
        engine.tick(&input);
        for p in engine.positions() {
            assert!(p.x >= 0.0 && p.x <= 1000.0);
            assert!(p.y >= 0.0 && p.y <= 1000.0);
        }
    }

    #[test]
    fn border_set_rejects_too_many_segments() {
        let mut engine = Engine::new(small_config()).unwrap();
        let borders: Vec<Border> = (0..(MAX_BORDERS + 1))
            .map(|i| (Vec2::new(i as f32, 0.0), Vec2::new(i as f32, 1.0)))
            .collect();
        assert!(engine.set_borders(borders).is_err());
    }

    #[test]
    fn observer_log_emits_exactly_one_record_on_forced_intersection() {
        let mut engine = Engine::new(EngineConfig {
            x: 1000.0,
            y: 1000.0,
            n: 2,
            r0: 5.0,
            r1: 20.0,
            init_preset: InitPreset::Uniform,
        })
        .unwrap();
        engine.positions = vec![Vec2::new(500.0, 500.0), Vec2::new(502.0, 500.0)];
        engine.last_pos = engine.positions.clone();
        engine.velocities = vec![Vec2::ZERO; 2];

        let mut input = base_tick(true);
        input.observed_id = Some(0);
        engine.tick(&input);

        let snap = engine.poll_logs();
        assert_eq!(snap.records.len(), 1);
        assert_eq!(snap.records[0].prev_state, AgentState::Idle);
        assert_eq!(snap.records[0].new_state, AgentState::Intersection);
        assert_eq!(snap.records[0].changer_id, Some(1));
    }

    #[test]
    fn reset_reinitializes_headings_and_base_speed_unconditionally() {
        let mut engine = Engine::new(small_config()).unwrap();
        assert_eq!(engine.headings.len(), 500);
        assert_eq!(engine.base_speed.len(), 500);
        for &s in &engine.base_speed {
            assert!((2.0..=4.0).contains(&s));
        }
    }
}
