//! Shared geometry, configuration, and error types for the FDK engine.
//!
//! Kept deliberately small and dependency-light, the same role `rad-core`
//! plays for the render engine this was ported from: every other crate in
//! the workspace depends on this one, and this one depends on nothing
//! workspace-local.

pub mod config;
pub mod error;
pub mod filter_length;
pub mod geometry;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use filter_length::{filter_length, next_pow2};
pub use geometry::{DetectorGeometry, Roi, VolumeGeometry};
