use cust::stream::{Stream, StreamFlags};
use ct_core::{Error, Result};

/// Opaque per-projection execution context on the accelerator (spec §3,
/// §9): carried through the pipeline alongside each [`Projection`] so
/// kernels launched against it stay asynchronous, with synchronization only
/// at the hand-offs the spec calls out (end of Preloader, end of
/// Reconstruction per projection — spec §5).
pub struct StreamHandle(Stream);

impl StreamHandle {
	/// A non-default (concurrent) stream, so its work can overlap with work
	/// on every other projection's stream (spec §4.3).
	pub fn new() -> Result<Self> {
		Stream::new(StreamFlags::NON_BLOCKING, None)
			.map(StreamHandle)
			.map_err(|err| Error::runtime(format!("failed to create CUDA stream: {err}")))
	}

	pub fn inner(&self) -> &Stream { &self.0 }

	/// Blocks the calling (worker) thread until every operation queued on
	/// this stream has completed. Spec §4.3: Preloader synchronizes the
	/// stream exactly once, before releasing the host source buffer.
	pub fn synchronize(&self) -> Result<()> {
		self.0
			.synchronize()
			.map_err(|err| Error::runtime(format!("stream synchronization failed: {err}")))
	}
}
