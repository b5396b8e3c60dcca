//! Error taxonomy for combat operations
//!
//! Combat never halts on bad input: every fallible operation returns a
//! `CombatError` and leaves state untouched, and the caller decides whether
//! the failure is worth logging.

use thiserror::Error;

/// Failure of a combat-level operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombatError {
    /// Unregistered status/relic/enemy id, or a target index out of range
    #[error("not found: {0}")]
    NotFound(String),
    /// Registration of an id that is already present
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Non-positive amount where a positive one is required
    #[error("invalid amount: {0}")]
    InvalidAmount(i32),
    /// A debuff application was negated (Artifact)
    #[error("blocked: {0}")]
    Blocked(String),
    #[error("insufficient energy: need {required}, have {available}")]
    InsufficientEnergy { required: i32, available: i32 },
    /// Operation not legal in the current combat phase
    #[error("invalid phase for {0}")]
    InvalidPhase(&'static str),
    /// The combat has already reached a terminal result
    #[error("combat is over")]
    CombatOver,
}

pub type CombatResult<T> = Result<T, CombatError>;
