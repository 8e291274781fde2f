//! Per-device memory pool and stream plumbing (spec §4.2, §4.3, C3).
//!
//! This is the only crate in the workspace that touches `cust` (the CUDA
//! driver API) directly; everything above it talks in terms of
//! [`PooledBuffer`]/[`StreamHandle`] handles, never raw device pointers.

mod accelerator;
mod pool;
mod stream;

pub use accelerator::Accelerator;
pub use pool::{DevicePool, PitchedBuffer, PooledBuffer};
pub use stream::StreamHandle;

#[cfg(test)]
mod tests {
	use super::*;

	/// The pool's blocking-free-list behavior (spec §4.2: "if none is [free]
	/// and `limit` is reached, allocation blocks until a buffer is
	/// returned") doesn't require a real device to exercise at the
	/// bookkeeping level, but the pitched alignment math does not touch
	/// `cust` at all and is worth pinning down on its own.
	#[test]
	fn aligned_pitch_rounds_up_to_the_alignment() {
		assert_eq!(pool::aligned_pitch(1), 32);
		assert_eq!(pool::aligned_pitch(32), 32);
		assert_eq!(pool::aligned_pitch(33), 64);
		assert_eq!(pool::aligned_pitch(512), 512);
	}
}
