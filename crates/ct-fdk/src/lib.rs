//! The FDK domain (spec §2-§4): projection/volume-slab data types, the
//! three numeric kernels (C6-C8) as pure host-slice functions, the six
//! pipeline stages (C4-C9) wiring those kernels to `ct-device` buffers and
//! `ct-pipeline` stage plumbing, and the projection/volume I/O trait
//! boundaries (§1, §6).

mod data;
pub mod io;
pub mod kernel;
pub mod stages;

pub use data::{Projection, ProjectionData, SlabData, VolumeSlab};
