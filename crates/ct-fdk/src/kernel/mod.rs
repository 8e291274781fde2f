//! The three numeric kernels of FDK (C6, C7, C8): pure functions over
//! host-mirrored slices, each independently unit-tested without requiring a
//! physical accelerator (see `ct_device::PitchedBuffer::view_mut`, and
//! `DESIGN.md` for why the kernels are split from device residency this
//! way).

mod backproject;
mod filter;
mod weight;

pub use backproject::backproject_into_slab;
pub use filter::RampFilter;
pub use weight::weight_inplace;
