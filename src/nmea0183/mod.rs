//! NMEA0183 sentence framing and decoding into channel candidates.

pub mod ais;
mod decoder;
pub mod sentence;
pub mod xdr;

pub use decoder::SentenceDecoder;
pub use sentence::{Sentence, SentenceBuffer};
