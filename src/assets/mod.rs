//! Binary asset management.
//!
//! The model catalog, on-disk storage locations, streaming downloads, and
//! bootstrap of the audio-extraction tool.

pub mod catalog;
pub mod store;
pub mod tool;

#[cfg(feature = "download")]
pub mod archive;
#[cfg(feature = "download")]
pub mod fetcher;
