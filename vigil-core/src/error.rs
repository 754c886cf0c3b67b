//! Error types for the VIGIL core library.
//!
//! Only boundary misuse and configuration problems surface as errors.
//! Inside the simulation, invalidated references degrade to `None` or
//! `Idle` instead.

use thiserror::Error;

/// Top-level error type for all VIGIL operations.
#[derive(Error, Debug)]
pub enum VigilError {
    /// An entity id was not registered with the world.
    #[error("Entity not found: {0}")]
    EntityNotFound(crate::EntityId),

    /// An entity id was registered twice.
    #[error("Entity already registered: {0}")]
    DuplicateEntity(crate::EntityId),

    /// The entity exists but lacks the capability the call needs.
    #[error("Entity {entity} has no {capability} capability")]
    MissingCapability {
        /// Which entity was asked.
        entity: crate::EntityId,
        /// The capability that was required.
        capability: &'static str,
    },

    /// Selection weights were negative or not finite.
    #[error("Invalid selection weights: {0}")]
    InvalidWeights(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, VigilError>;
