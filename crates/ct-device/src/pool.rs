use crossbeam_channel::{Receiver, Sender};
use cust::memory::{CopyDestination, DeviceBuffer, DeviceCopy};
use ct_core::{Error, Result};

/// A pitched 2-D device allocation (spec §4.2): `pitch` is the row stride in
/// elements, `>= width`, chosen so rows start at an alignment-friendly
/// offset. The CUDA *driver* API this crate binds (`cust`) does not expose
/// `cuMemAllocPitch`, so pitch bookkeeping is ours: a single flat
/// `DeviceBuffer` of `pitch * height` elements, addressed row-by-row.
pub struct PitchedBuffer<T: DeviceCopy> {
	buf: DeviceBuffer<T>,
	width: usize,
	height: usize,
	pitch: usize,
}

const PITCH_ALIGN_ELEMS: usize = 32;

pub(crate) fn aligned_pitch(width: usize) -> usize { width.div_ceil(PITCH_ALIGN_ELEMS) * PITCH_ALIGN_ELEMS }

impl<T: DeviceCopy + Default + Clone> PitchedBuffer<T> {
	fn alloc(width: usize, height: usize) -> Result<Self> {
		let pitch = aligned_pitch(width.max(1));
		let len = pitch * height.max(1);
		let buf = unsafe {
			DeviceBuffer::uninitialized(len).map_err(|err| Error::allocation(format!("device allocation of {len} elements failed: {err}")))?
		};
		Ok(PitchedBuffer { buf, width, height, pitch })
	}

	pub fn width(&self) -> usize { self.width }

	pub fn height(&self) -> usize { self.height }

	pub fn pitch(&self) -> usize { self.pitch }

	fn matches(&self, width: usize, height: usize) -> bool { self.width == width && self.height == height }

	/// Zero-fills the destination (spec §4.3, Preloader) before the
	/// asynchronous upload that follows.
	pub fn zero_fill(&mut self) -> Result<()> {
		let zero = vec![T::default(); self.pitch * self.height];
		self.buf.copy_from(&zero).map_err(|err| Error::runtime(format!("zero-fill failed: {err}")))
	}

	/// Uploads tightly-packed host rows (`width` elements each) into the
	/// pitched device buffer.
	pub fn upload(&mut self, host: &[T]) -> Result<()> {
		if host.len() != self.width * self.height {
			return Err(Error::invalid_argument("host buffer size does not match pitched buffer dimensions"));
		}
		if self.pitch == self.width {
			self.buf.copy_from(host).map_err(|err| Error::runtime(format!("upload failed: {err}")))?;
		} else {
			let mut padded = vec![T::default(); self.pitch * self.height];
			for row in 0..self.height {
				padded[row * self.pitch..row * self.pitch + self.width]
					.clone_from_slice(&host[row * self.width..(row + 1) * self.width]);
			}
			self.buf.copy_from(&padded).map_err(|err| Error::runtime(format!("upload failed: {err}")))?;
		}
		Ok(())
	}

	/// Downloads the pitched device buffer back into tightly-packed rows.
	pub fn download(&self, host: &mut [T]) -> Result<()> {
		if host.len() != self.width * self.height {
			return Err(Error::invalid_argument("host buffer size does not match pitched buffer dimensions"));
		}
		if self.pitch == self.width {
			self.buf.copy_to(host).map_err(|err| Error::runtime(format!("download failed: {err}")))?;
		} else {
			let mut padded = vec![T::default(); self.pitch * self.height];
			self.buf.copy_to(&mut padded).map_err(|err| Error::runtime(format!("download failed: {err}")))?;
			for row in 0..self.height {
				host[row * self.width..(row + 1) * self.width]
					.clone_from_slice(&padded[row * self.pitch..row * self.pitch + self.width]);
			}
		}
		Ok(())
	}

	/// Downloads the whole buffer, runs `f` over the tightly-packed rows on
	/// the host, then re-uploads. This is how the per-pixel/per-voxel
	/// numeric kernels (spec §4.4, §4.6) are exercised: the kernel itself is
	/// a pure function over a host slice, independently unit-testable,
	/// while this accessor is the only place that knows about device
	/// residency and pitch.
	pub fn view_mut<F: FnOnce(&mut [T])>(&mut self, f: F) -> Result<()> {
		let mut host = vec![T::default(); self.width * self.height];
		self.download(&mut host)?;
		f(&mut host);
		self.upload(&host)
	}

	pub fn view<F: FnOnce(&[T])>(&self, f: F) -> Result<()> {
		let mut host = vec![T::default(); self.width * self.height];
		self.download(&mut host)?;
		f(&host);
		Ok(())
	}
}

/// A pool bound to one device and one element type (spec §4.2): hands out
/// owning handles that return to the pool on drop instead of freeing.
/// Modeled as a bounded channel of free slots — a channel is already the
/// right tool for "block until one comes back", and the rest of this
/// workspace already leans on `crossbeam-channel` for exactly that shape of
/// problem.
pub struct DevicePool<T: DeviceCopy> {
	free_tx: Sender<Option<PitchedBuffer<T>>>,
	free_rx: Receiver<Option<PitchedBuffer<T>>>,
}

impl<T: DeviceCopy + Default + Clone + Send + 'static> DevicePool<T> {
	/// `limit` pitched allocations, all lazily created on first use.
	pub fn new(limit: usize) -> Self {
		let (free_tx, free_rx) = crossbeam_channel::bounded(limit.max(1));
		for _ in 0..limit.max(1) {
			let _ = free_tx.send(None);
		}
		DevicePool { free_tx, free_rx }
	}

	/// Returns an owning handle sized `width x height`. Reuses a
	/// compatible-sized free buffer without reallocating; if none is free
	/// and the pool is at `limit`, blocks until one is returned (spec
	/// §4.2).
	pub fn allocate_smart(&self, width: usize, height: usize) -> Result<PooledBuffer<T>> {
		let slot = self.free_rx.recv().map_err(|_| Error::runtime("device pool is closed"))?;
		let buf = match slot {
			Some(buf) if buf.matches(width, height) => buf,
			_ => PitchedBuffer::alloc(width, height)?,
		};
		Ok(PooledBuffer { buf: Some(buf), returner: self.free_tx.clone() })
	}
}

/// An owning handle into a [`DevicePool`] allocation. Returns the buffer to
/// the pool on drop rather than freeing it (spec §4.2).
pub struct PooledBuffer<T: DeviceCopy> {
	buf: Option<PitchedBuffer<T>>,
	returner: Sender<Option<PitchedBuffer<T>>>,
}

impl<T: DeviceCopy> PooledBuffer<T> {
	pub fn get(&self) -> &PitchedBuffer<T> { self.buf.as_ref().expect("buffer taken before drop") }

	pub fn get_mut(&mut self) -> &mut PitchedBuffer<T> { self.buf.as_mut().expect("buffer taken before drop") }
}

impl<T: DeviceCopy> Drop for PooledBuffer<T> {
	fn drop(&mut self) {
		// Pool destruction during unwinding must not throw (spec §4.2): a
		// closed channel here means the pool itself is already gone, so the
		// buffer is dropped in place instead.
		let _ = self.returner.send(self.buf.take());
	}
}
