//! Error types for the turn engine.
//!
//! Two classes matter to callers:
//! - [`GameError::InvariantViolation`] means the engine (or whoever built the
//!   state) has a bug. It is never retried.
//! - Everything else is a precondition failure raised at the call site:
//!   a zero denominator, an unknown id, a rejected player action.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Game state is internally inconsistent.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Fixed-point division by zero.
    #[error("Division by zero: {0} / 0")]
    DivisionByZero(String),

    /// Decimal input has more fractional digits than the fixed-point scale.
    #[error("Value {0} exceeds fixed-point precision")]
    ExcessPrecision(String),

    /// Enemy type tag not present in the enemy stat table.
    #[error("Unknown enemy type: {0}")]
    UnknownEnemyType(String),

    /// Enemy composition string could not be parsed.
    #[error("Malformed enemy roster '{roster}': {reason}")]
    MalformedRoster {
        /// The composition string.
        roster: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Mission template id not in the catalog.
    #[error("Unknown mission: {0}")]
    UnknownMission(String),

    /// Lead template id not in the catalog.
    #[error("Unknown lead: {0}")]
    UnknownLead(String),

    /// Agent id not in the roster.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Mission site id not in the state.
    #[error("Mission site not found: {0}")]
    MissionSiteNotFound(String),

    /// Lead investigation id not in the state.
    #[error("Lead investigation not found: {0}")]
    LeadInvestigationNotFound(String),

    /// Random override outside `[0, 1]`.
    #[error("Random override for {channel} must be within [0, 1], got {value}")]
    InvalidRandomOverride {
        /// Channel name.
        channel: String,
        /// Rejected value.
        value: String,
    },

    /// Player action not allowed in the current state.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Not enough money for a player action.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount required.
        required: i64,
        /// Amount available.
        available: i64,
    },

    /// A capability cap (agents, transport, training) would be exceeded.
    #[error("{capability} capacity exceeded: {requested} requested, {available} available")]
    CapacityExceeded {
        /// Which capability.
        capability: String,
        /// Number of slots requested.
        requested: usize,
        /// Number of slots free.
        available: usize,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Binary snapshot encode/decode failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl GameError {
    /// Whether this error reports an internal consistency bug.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
