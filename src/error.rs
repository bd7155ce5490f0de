use thiserror::Error;

/// Rejected `reset` configuration. A reset that fails leaves the engine's
/// previous state untouched. The engine never panics on out-of-range input;
/// the caller gets a typed reason back instead.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("field size out of range: X={x}, Y={y} (both must lie in [1000, 25000])")]
    FieldSizeOutOfRange { x: f32, y: f32 },

    #[error("agent count out of range: N={n} (must lie in [500, 5000000])")]
    AgentCountOutOfRange { n: u64 },

    #[error("radius ordering violated: R0={r0} must be > 0 and <= R1={r1}")]
    RadiusOrdering { r0: f32, r1: f32 },

    #[error("interact radius out of range: R1={r1} (must be <= 50)")]
    InteractRadiusTooLarge { r1: f32 },
}

/// Rejected border-list update (at most 50 segments are accepted).
#[derive(Debug, Error, PartialEq)]
pub enum BorderError {
    #[error("too many border segments: got {got}, limit is {limit}")]
    TooManySegments { got: usize, limit: usize },
}
