//! Media handling: duration probing, audio extraction, and WAV reading.

pub mod extract;
pub mod probe;
pub mod wav;
