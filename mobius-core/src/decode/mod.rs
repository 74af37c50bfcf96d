//! Shot-time decoding: the matcher capability and the lifting decoder.

mod decoder;
mod matcher;

pub use decoder::{Decoder, DecoderConfigOptions};
pub use matcher::{BlossomMatcher, Matcher};
