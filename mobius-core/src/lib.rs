//! # mobius-core: Matching-Lift Decoder for Color Code QEC
//!
//! `mobius-core` decodes color code quantum error correction circuits by
//! reducing the three-color decoding problem to minimum-weight perfect
//! matching on a doubled ("mobius") detector graph, then lifting the
//! matching back into a prediction of which logical observables flipped.
//!
//! ## Overview
//!
//! Color codes assign one of three colors (red, green, blue) to every
//! stabilizer. Unlike surface codes, their syndrome defects cannot simply be
//! paired up: excitations carry color charge, and only neutral combinations
//! annihilate. This library:
//!
//! 1. **Digests a detector error model** - Resolving every detector's color
//!    and basis from its coordinate annotations
//! 2. **Decomposes errors into atoms** - Singlets, pairs, and neutral
//!    triplets that generate every other mechanism
//! 3. **Builds a doubled matching problem** - Each detector splits into its
//!    two two-color subgraph copies, making every error edge-like
//! 4. **Lifts matchings into predictions** - Matched edges decompose into
//!    Euler tours whose discharge walk accumulates the observable flips
//!
//! ## Architecture
//!
//! ```text
//!            configure time                        shot time
//!  DEM ──► node colors ──► atomic errors     detection events
//!             │                │                    │
//!             ▼                ▼                    ▼
//!        mobius DEM ◄── composite decomposer   mobius events ──► matcher
//!             │                │                    │
//!             ▼                ▼                    ▼
//!          matcher      charge graph ──► drag   Euler tours ──► discharge
//!                       + rgb reps     graph         │              │
//!                                                    └──── XOR ◄────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use mobius_core::{Decoder, DecoderConfigOptions, DetectorErrorModel};
//!
//! let dem: DetectorErrorModel = std::fs::read_to_string("model.dem")?.parse()?;
//! let mut decoder = Decoder::from_dem(&dem, DecoderConfigOptions::default())?;
//!
//! // One shot of bit-packed detection events (little endian).
//! let shot: &[u8] = &[0b0000_0101];
//! let predicted_observables = decoder.decode_detection_events(shot)?;
//! ```
//!
//! ## Module Organization
//!
//! - [`dem`] - Detector error model representation and text parser
//! - [`types`] - Charges, bases, atomic error keys, representative triangles
//! - [`graph`] - Configure-time graph construction
//! - [`decode`] - The matcher capability and the per-shot decoder
//! - [`error`] - Configuration and decode error taxonomy

#![deny(missing_docs)]

pub mod decode;
pub mod dem;
pub mod error;
pub mod graph;
pub mod types;

// Convenience re-exports (clean public API)

pub use decode::{BlossomMatcher, Decoder, DecoderConfigOptions, Matcher};
pub use dem::{DemInstruction, DemParseError, DemTarget, DetectorErrorModel};
pub use error::{ConfigError, DecodeError};
pub use types::{
    detector_to_mobius_node, mobius_node_to_detector, AtomicErrorKey, Basis, Charge, ColorBasis,
    NodeOffset, ObsMask, RgbEdge, SubGraphCoord, BOUNDARY_NODE,
};
