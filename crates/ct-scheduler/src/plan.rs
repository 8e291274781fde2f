use ct_core::{filter_length, DetectorGeometry, Error, Result, VolumeGeometry};

use crate::task::Task;

/// Bytes of device memory a conservative plan is allowed to use, as a
/// fraction of the accelerator's total memory (spec §4.7: "a conservative
/// fraction of usable device memory").
pub const USABLE_MEMORY_FRACTION: f32 = 0.7;

/// How many projections may be resident on a single device at once: the
/// one currently being reconstructed plus the one being preloaded/filtered
/// concurrently (spec §4.7: "two in-flight projections").
pub const PARALLEL_PROJECTIONS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubvolumePlan {
	pub n_z_sub: u32,
	pub n_slabs: u32,
}

fn projection_bytes(det: &DetectorGeometry) -> u64 { det.n_h as u64 * det.n_v as u64 * 4 }

/// FFT scratch estimate (spec §4.5): one padded real row buffer plus one
/// complex spectrum buffer per in-flight projection, `n_v` rows each.
fn fft_scratch_bytes(det: &DetectorGeometry) -> u64 {
	let len = filter_length(det.n_h) as u64;
	let real = len * 4;
	let complex = (len / 2 + 1) * 8;
	(real + complex) * det.n_v as u64 * PARALLEL_PROJECTIONS as u64
}

/// Derives the subvolume slab height and count (spec §4.7, §3): `n_z_sub`
/// is chosen so that one slab plus the in-flight projections and FFT
/// workspaces fit within a conservative fraction of usable device memory;
/// `n_slabs = ceil(n_z / n_z_sub)`, with a shorter final slab absorbing the
/// remainder.
pub fn plan_subvolumes(vol: &VolumeGeometry, det: &DetectorGeometry, device_bytes: u64) -> Result<SubvolumePlan> {
	let usable = (device_bytes as f64 * USABLE_MEMORY_FRACTION as f64) as i64;
	let fixed = (projection_bytes(det) * PARALLEL_PROJECTIONS as u64 + fft_scratch_bytes(det)) as i64;
	let remaining = usable - fixed;
	if remaining <= 0 {
		return Err(Error::construction(
			"device memory is insufficient even for in-flight projections and FFT scratch, before any volume slab",
		));
	}
	let slice_bytes = vol.n_x as i64 * vol.n_y as i64 * 4;
	let mut n_z_sub = (remaining / slice_bytes).max(1) as u32;
	n_z_sub = n_z_sub.min(vol.n_z);
	let n_slabs = vol.n_z.div_ceil(n_z_sub);
	Ok(SubvolumePlan { n_z_sub, n_slabs })
}

/// Cartesian product of slabs and devices (spec §4.7): every slab is
/// reconstructed exactly once, assigned to one device by round-robin, with
/// every projection streamed to that device. Invariant (v): subvolume
/// assembly covers `[0, n_z)` exactly once.
pub fn build_tasks(vol: &VolumeGeometry, plan: &SubvolumePlan, num_devices: u32, num_projections: u32) -> Vec<Task> {
	let mut tasks = Vec::with_capacity(plan.n_slabs as usize);
	for slab in 0..plan.n_slabs {
		let z_start = slab * plan.n_z_sub;
		let z_end = (z_start + plan.n_z_sub).min(vol.n_z);
		tasks.push(Task {
			subvolume_id: slab,
			z_start,
			z_end,
			device_id: slab % num_devices.max(1),
			projection_range: 0..num_projections,
		});
	}
	tasks
}
