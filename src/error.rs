use thiserror::Error;

use crate::order::OrderId;

/// Errors surfaced across the engine's public API.
///
/// `Cancelled` and `InvariantViolation` from the design notes are deliberately absent here:
/// cancellation is internal control flow inside the matcher (never returned to a caller,
/// see `crate::matcher`), and invariant violations are `debug_assert!`s that abort a debug
/// build rather than propagate as a typed error a caller could plausibly handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no order with id {0}")]
    NotFound(OrderId),
}

pub type EngineResult<T> = Result<T, EngineError>;
