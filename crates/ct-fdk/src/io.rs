use std::fs::File;
use std::io::{Read as _, Write as _};
use std::path::PathBuf;

use parking_lot::Mutex;

use ct_core::Result;

/// Raw projection/volume files are native-endian `f32` dumps; `bytemuck`
/// reinterprets the byte buffer in place instead of a manual
/// byte-by-byte conversion loop.
fn bytes_to_f32_vec(bytes: Vec<u8>) -> Vec<f32> { bytemuck::allocation::pod_collect_to_vec(&bytes) }

/// The projection-I/O collaborator (spec §1, §6): reading from on-disk
/// image files is explicitly out of scope of the core's engineering value,
/// but the Source stage (C4) needs something concrete to call. Anything
/// that can hand back `n_h * n_v` row-major `f32`s by projection index
/// implements this.
pub trait ProjectionReader: Send + Sync {
	fn read(&self, index: u32, n_h: u32, n_v: u32) -> Result<Vec<f32>>;
}

/// The volume-I/O collaborator (spec §1, §6): writing reconstructed slices
/// to disk. `write_slice` is called once per absolute `z` index; invariant
/// (v) guarantees no two tasks ever call it with the same index, so
/// implementations need only guard against a single slice's own fields.
pub trait VolumeWriter: Send + Sync {
	fn write_slice(&self, z_index: u32, n_x: u32, n_y: u32, data: &[f32]) -> Result<()>;
}

/// Single-precision row-major binary files, one per projection, named
/// `proj_{index:06}.raw` (spec §6: "one file per rotation angle").
pub struct FsProjectionReader {
	dir: PathBuf,
}

impl FsProjectionReader {
	pub fn new(dir: impl Into<PathBuf>) -> Self { FsProjectionReader { dir: dir.into() } }
}

impl ProjectionReader for FsProjectionReader {
	fn read(&self, index: u32, n_h: u32, n_v: u32) -> Result<Vec<f32>> {
		let path = self.dir.join(format!("proj_{index:06}.raw"));
		let mut file = File::open(&path)?;
		let expected = n_h as usize * n_v as usize;
		let mut bytes = Vec::with_capacity(expected * 4);
		file.read_to_end(&mut bytes)?;
		if bytes.len() != expected * 4 {
			return Err(ct_core::Error::io(format!(
				"{}: expected {} bytes ({}x{} f32), found {}",
				path.display(),
				expected * 4,
				n_h,
				n_v,
				bytes.len()
			)));
		}
		Ok(bytes_to_f32_vec(bytes))
	}
}

/// Slice-per-file output (spec §6): `{prefix}_{slice_index:06}.{ext}`,
/// single-precision row-major, `n_x * n_y` per slice.
pub struct FsVolumeWriter {
	dir: PathBuf,
	prefix: String,
	ext: String,
	// Disjoint z indices across tasks (invariant v) make this redundant in
	// practice, but matches spec §5's "serializes writes under its own
	// lock" literally rather than relying on the disjointness holding.
	guard: Mutex<()>,
}

impl FsVolumeWriter {
	pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
		FsVolumeWriter { dir: dir.into(), prefix: prefix.into(), ext: "raw".to_string(), guard: Mutex::new(()) }
	}
}

impl VolumeWriter for FsVolumeWriter {
	fn write_slice(&self, z_index: u32, n_x: u32, n_y: u32, data: &[f32]) -> Result<()> {
		debug_assert_eq!(data.len(), n_x as usize * n_y as usize);
		let _guard = self.guard.lock();
		let path = self.dir.join(format!("{}_{:06}.{}", self.prefix, z_index, self.ext));
		let mut file = File::create(&path)?;
		file.write_all(bytemuck::cast_slice(data))?;
		Ok(())
	}
}
