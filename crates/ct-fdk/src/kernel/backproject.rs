use rayon::prelude::*;

use ct_core::{DetectorGeometry, VolumeGeometry};

/// Below this gap (world units) between the source and a voxel's rotated
/// depth coordinate, the voxel is skipped rather than dividing by a
/// near-zero magnification denominator (spec §4.6: "numeric edge case").
const MAGNIFICATION_EPSILON: f32 = 1e-4;

/// Differential back-projection of one filtered, weighted projection into
/// the currently-owned subvolume (spec §4.6, C8). `slab` is `x_extent *
/// y_extent * z_extent` voxels, row-major `(z, y, x)`; `projection` is
/// `n_h * n_v` pixels, row-major `(v, u)`. `delta_phi` is the angular step
/// between consecutive projections.
///
/// Parallelized over `z` slices with `rayon`, matching the data-parallel
/// style the rest of this workspace's numeric code uses for host-mirrored
/// kernels.
pub fn backproject_into_slab(
	slab: &mut [f32],
	vol: &VolumeGeometry,
	z_offset: u32,
	z_extent: u32,
	det: &DetectorGeometry,
	projection: &[f32],
	phi: f32,
	delta_phi: f32,
) {
	debug_assert_eq!(slab.len(), vol.n_x as usize * vol.n_y as usize * z_extent as usize);
	debug_assert_eq!(projection.len(), det.n_h as usize * det.n_v as usize);

	let (n_x, n_y) = (vol.n_x as usize, vol.n_y as usize);
	let (n_h, n_v) = (det.n_h as i64, det.n_v as i64);
	let h_min = det.h_min();
	let v_min = det.v_min();
	let (cos_phi, sin_phi) = (phi.cos(), phi.sin());
	let plane_stride = n_x * n_y;

	slab.par_chunks_mut(plane_stride).enumerate().for_each(|(local_z, plane)| {
		let z_index = z_offset as usize + local_z;
		let world_z = z_index as f32 * vol.vx + vol.z_min + vol.vx / 2.0;

		for y_idx in 0..n_y {
			let world_y = y_idx as f32 * vol.vx + vol.y_min + vol.vx / 2.0;
			for x_idx in 0..n_x {
				let world_x = x_idx as f32 * vol.vx + vol.x_min + vol.vx / 2.0;

				let s = world_x * cos_phi + world_y * sin_phi;
				let t = -world_x * sin_phi + world_y * cos_phi;

				let denom = det.d_so - t;
				if denom.abs() < MAGNIFICATION_EPSILON {
					continue;
				}
				let mag = det.d_so / denom;
				let u = mag * s;
				let v = mag * world_z;

				let i = u / det.pitch_h - h_min / det.pitch_h - 0.5;
				let j = v / det.pitch_v - v_min / det.pitch_v - 0.5;

				if let Some(sample) = bilinear_sample(projection, n_h, n_v, i, j) {
					plane[y_idx * n_x + x_idx] += mag * mag * sample * delta_phi;
				}
			}
		}
	});
}

/// Bilinear interpolation of the projection at fractional pixel coordinates
/// `(i, j)`; `None` if `(i, j)` falls outside `[0, n_h) x [0, n_v)` (spec
/// §4.6 step 5: "outside: contribute zero").
fn bilinear_sample(projection: &[f32], n_h: i64, n_v: i64, i: f32, j: f32) -> Option<f32> {
	// A pixel on the last row/column has no "next" neighbor to interpolate
	// against, so the usable range for the top-left corner is `[0, n-1)`.
	if i < 0.0 || j < 0.0 || i >= (n_h - 1) as f32 || j >= (n_v - 1) as f32 {
		return None;
	}
	let i0 = i.floor();
	let j0 = j.floor();
	let di = i - i0;
	let dj = j - j0;
	let (i0, j0) = (i0 as i64, j0 as i64);
	let i1 = i0 + 1;
	let j1 = j0 + 1;

	let at = |row: i64, col: i64| projection[(row * n_h + col) as usize];
	let v00 = at(j0, i0);
	let v10 = at(j0, i1);
	let v01 = at(j1, i0);
	let v11 = at(j1, i1);

	let top = v00 * (1.0 - di) + v10 * di;
	let bottom = v01 * (1.0 - di) + v11 * di;
	Some(top * (1.0 - dj) + bottom * dj)
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;

	use super::*;

	fn det(n_h: u32, n_v: u32) -> DetectorGeometry {
		DetectorGeometry { n_h, n_v, pitch_h: 1.0, pitch_v: 1.0, d_so: 100.0, d_sd: 100.0 }
	}

	/// E1: `n_h=n_v=8`, one projection of all 1.0 at phi=0, d_so=d_sd=100,
	/// pitch=1, delta_phi=2*pi; the center voxel must come out non-zero and
	/// finite.
	#[test]
	fn e1_center_voxel_is_finite_and_nonzero() {
		let d = det(8, 8);
		let vol = VolumeGeometry::from_detector(&d);
		let projection = vec![1.0f32; 64];
		let mut slab = vec![0.0f32; vol.n_x as usize * vol.n_y as usize * vol.n_z as usize];
		backproject_into_slab(&mut slab, &vol, 0, vol.n_z, &d, &projection, 0.0, std::f32::consts::TAU);

		let cx = vol.n_x as usize / 2;
		let cy = vol.n_y as usize / 2;
		let cz = vol.n_z as usize / 2;
		let idx = cz * (vol.n_x as usize * vol.n_y as usize) + cy * vol.n_x as usize + cx;
		assert!(slab[idx].is_finite());
		assert_ne!(slab[idx], 0.0);
	}

	/// Linearity (property 2): back-projecting `a*p` is `a` times
	/// back-projecting `p`, since the kernel is a per-voxel weighted sum of
	/// interpolated projection samples with no nonlinear step.
	#[test]
	fn backprojection_is_linear_in_the_projection() {
		let d = det(16, 16);
		let vol = VolumeGeometry::from_detector(&d);
		let base: Vec<f32> = (0..256).map(|i| (i as f32 * 0.01).sin() + 1.0).collect();
		let scaled: Vec<f32> = base.iter().map(|&x| 3.0 * x).collect();

		let mut slab_base = vec![0.0f32; vol.n_x as usize * vol.n_y as usize * vol.n_z as usize];
		let mut slab_scaled = slab_base.clone();
		backproject_into_slab(&mut slab_base, &vol, 0, vol.n_z, &d, &base, 0.3, 0.1);
		backproject_into_slab(&mut slab_scaled, &vol, 0, vol.n_z, &d, &scaled, 0.3, 0.1);

		for (a, b) in slab_base.iter().zip(slab_scaled.iter()) {
			assert_relative_eq!(b, &(a * 3.0), epsilon = 1e-3);
		}
	}

	/// Out-of-bounds contributions are zero, never NaN or infinite, even
	/// when a voxel's ray misses the detector entirely.
	#[test]
	fn out_of_bounds_rays_contribute_nothing() {
		let d = det(4, 4);
		let vol = VolumeGeometry::from_detector(&d);
		let projection = vec![1.0f32; 16];
		let mut slab = vec![0.0f32; vol.n_x as usize * vol.n_y as usize * vol.n_z as usize];
		// A huge delta_phi exaggerates any single-angle contribution so a
		// missed ray is easy to distinguish from a hit.
		backproject_into_slab(&mut slab, &vol, 0, vol.n_z, &d, &projection, 0.0, 1.0);
		assert!(slab.iter().all(|v| v.is_finite()));
	}
}
