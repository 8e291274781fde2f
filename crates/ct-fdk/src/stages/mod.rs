//! The six pipeline stages (C4-C9) wiring `ct-pipeline`'s generic `Stage`
//! traits to `ct-device` buffers/pools and the kernel functions in
//! `crate::kernel`.

mod filter;
mod preloader;
mod reconstruction;
mod sink;
mod source;
mod weighting;

pub use filter::FilterStage;
pub use preloader::PreloaderStage;
pub use reconstruction::ReconstructionStage;
pub use sink::SinkStage;
pub use source::SourceStage;
pub use weighting::WeightingStage;
