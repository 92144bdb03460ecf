//! Speech synthesis engines.
//!
//! This module contains implementations of [`SpeechEngine`](crate::SpeechEngine).
//!
//! # Available Engines
//!
//! - `espeak` - espeak-ng run as a subprocess (espeak-ng required on PATH
//!   or bundled)

pub mod espeak;
