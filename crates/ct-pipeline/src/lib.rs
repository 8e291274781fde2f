//! Generic N-stage streaming pipeline runtime (spec §4.1, C2).
//!
//! A pipeline is a linear chain of stages connected by bounded
//! single-producer/single-consumer channels ("edges"), each running on its
//! own OS thread (spec §5). Termination is strictly in-band: the final
//! stage in any chain produces exactly one [`Item::End`] and it propagates
//! through every downstream edge in order. This crate knows nothing about
//! projections, volumes, or CUDA — it is the same shape of thing regardless
//! of what flows through it, which is also why it has no workspace
//! dependency on `ct-fdk` or `ct-device`.

mod driver;
mod edge;
mod item;
mod stage;

pub use driver::PipelineHandle;
pub use edge::edge;
pub use item::Item;
pub use stage::{run_sink, run_source, run_stage, SinkStage, SourceStage, Stage};
