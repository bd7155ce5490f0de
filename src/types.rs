use glam::Vec2;

/// Per-agent interaction state. Discriminants match the source's integer
/// encoding (`STATE_MOVING`/`STATE_INTERACT`/`STATE_INTERSECTION`) so they
/// can be compared or serialized without remapping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AgentState {
    Idle = 0,
    Interact = 1,
    Intersection = 2,
}

/// Distance norm used for every threshold comparison within a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Norm {
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl Norm {
    /// `dist(a, b, norm)`.
    #[inline]
    pub fn dist(self, a: Vec2, b: Vec2) -> f32 {
        let d = a - b;
        match self {
            Norm::Euclidean => d.length(),
            Norm::Manhattan => d.x.abs() + d.y.abs(),
            Norm::Chebyshev => d.x.abs().max(d.y.abs()),
        }
    }
}

/// Velocity-update rule selected per tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MovementPattern {
    Free,
    Carousel,
    Colliding,
}

/// Initial position/velocity distribution applied on `reset`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitPreset {
    /// Uniform across the whole field.
    Uniform,
    /// Clustered in a small box near (50, 50).
    Clustered,
}

/// A user-placed reflective line segment.
pub type Border = (Vec2, Vec2);

/// One entry in the bounded observer log ring.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// Monotonically increasing tick index at which the transition was observed.
    pub tick: u64,
    pub agent_id: u32,
    pub prev_state: AgentState,
    pub new_state: AgentState,
    /// The neighbor whose presence established `new_state`, if any.
    pub changer_id: Option<u32>,
}

/// Snapshot of log records appended since the caller's last poll.
#[derive(Clone, Debug, Default)]
pub struct LogsSnapshot {
    pub records: Vec<LogRecord>,
    /// True if the ring wrapped (dropped records) since the caller last polled.
    pub wrapped: bool,
}

/// Maximum neighbor ids recorded per agent's intersection row (K = 10).
pub const INTERSECTION_NUM: usize = 10;

/// Per-cell candidate cap enforced during classification only.
pub const LIMIT_PER_CELL: u32 = 100;

/// Capacity of the bounded observer log ring (M ~= 10 000).
pub const LOG_CAPACITY: usize = 10_000;

/// Upper bound on the number of border segments the core accepts.
pub const MAX_BORDERS: usize = 50;
