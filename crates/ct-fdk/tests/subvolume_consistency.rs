//! Property 4 (subvolume consistency): reconstructing a volume as one slab
//! must equal reconstructing it as several disjoint z-slabs and
//! concatenating the results, since `backproject_into_slab` accumulates
//! independently per `z` and takes `z_offset` only to place world-space
//! coordinates, never to normalize against the slab's own height.

use ct_core::{DetectorGeometry, VolumeGeometry};
use ct_fdk::kernel::backproject_into_slab;

fn det() -> DetectorGeometry {
	DetectorGeometry { n_h: 24, n_v: 24, pitch_h: 1.0, pitch_v: 1.0, d_so: 300.0, d_sd: 600.0 }
}

fn synthetic_projection(n_h: usize, n_v: usize, seed: u32) -> Vec<f32> {
	(0..n_h * n_v)
		.map(|i| {
			let x = (i as u32).wrapping_mul(2654435761).wrapping_add(seed);
			((x >> 8) & 0xFF) as f32 / 255.0
		})
		.collect()
}

#[test]
fn single_slab_matches_concatenated_multi_slab_reconstruction() {
	let d = det();
	let vol = VolumeGeometry::from_detector(&d);
	let projections: Vec<(f32, Vec<f32>)> = (0..12)
		.map(|k| {
			let phi = k as f32 * std::f32::consts::TAU / 12.0;
			(phi, synthetic_projection(d.n_h as usize, d.n_v as usize, k))
		})
		.collect();
	let delta_phi = std::f32::consts::TAU / 12.0;
	let plane = vol.n_x as usize * vol.n_y as usize;

	// Single slab covering the whole volume.
	let mut whole = vec![0.0f32; plane * vol.n_z as usize];
	for (phi, proj) in &projections {
		backproject_into_slab(&mut whole, &vol, 0, vol.n_z, &d, proj, *phi, delta_phi);
	}

	// Split into three slabs of (nearly) equal height and reconstruct each
	// independently, then concatenate.
	let n_slabs = 3u32;
	let slab_height = vol.n_z.div_ceil(n_slabs);
	let mut stitched = vec![0.0f32; plane * vol.n_z as usize];
	for slab in 0..n_slabs {
		let z_start = slab * slab_height;
		let z_end = (z_start + slab_height).min(vol.n_z);
		if z_start >= z_end {
			continue;
		}
		let z_extent = z_end - z_start;
		let mut buf = vec![0.0f32; plane * z_extent as usize];
		for (phi, proj) in &projections {
			backproject_into_slab(&mut buf, &vol, z_start, z_extent, &d, proj, *phi, delta_phi);
		}
		stitched[plane * z_start as usize..plane * z_end as usize].copy_from_slice(&buf);
	}

	for (a, b) in whole.iter().zip(stitched.iter()) {
		assert!((a - b).abs() < 1e-4, "mismatch between single-slab and multi-slab reconstruction: {a} vs {b}");
	}
}
