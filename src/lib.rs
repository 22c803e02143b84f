//! Image resize and compress utility
//!
//! Resizes a raster image to explicit dimensions or a scale factor, encodes it
//! at a chosen quality, and can search a (scale, quality) grid for the best
//! settings that fit a target file size.

pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod report;
pub mod search;
pub mod session;

pub use error::{Error, Result};
