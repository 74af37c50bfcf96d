//! Error types for decoder configuration and per-shot decoding.
//!
//! Configuration errors are raised while digesting a detector error model
//! into the decoder's internal graphs. Decode errors are raised per shot and
//! leave the decoder reusable for subsequent shots.

use std::fmt;

/// Error raised while configuring a decoder from a detector error model.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// A detector is missing its color/basis annotation, or the annotation is
    /// out of range. The message echoes the offending instruction.
    InvalidColorAnnotation(String),

    /// An error instruction flips a logical observable whose index does not
    /// fit in the observable bitmask.
    ObservableTooLarge(String),

    /// A detector index exceeds the maximum node index supported by the
    /// decoder's graphs.
    DetectorIndexTooLarge(String),

    /// An error instruction could not be rewritten as a sum of atomic errors
    /// and `ignore_decomposition_failures` was not set.
    DecompositionFailure(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidColorAnnotation(msg) => write!(f, "{}", msg),
            ConfigError::ObservableTooLarge(msg) => write!(f, "{}", msg),
            ConfigError::DetectorIndexTooLarge(msg) => write!(f, "{}", msg),
            ConfigError::DecompositionFailure(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error raised while decoding a single shot of detection events.
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// The matcher's edge list did not decompose into Euler tours.
    MalformedMatching(String),

    /// No starting charge closed an Euler cycle during the lifting step. The
    /// message carries the annotated cycle and the shot's detection events.
    LiftFailure(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedMatching(msg) => write!(f, "{}", msg),
            DecodeError::LiftFailure(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}
