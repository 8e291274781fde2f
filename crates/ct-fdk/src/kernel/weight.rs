use ct_core::DetectorGeometry;

/// Cosine/distance pre-weight (spec §4.4, C6): in place over a row-major
/// `n_h x n_v` image. `+ pitch/2` centers the coordinate in the pixel.
/// Single precision, no clamping; NaN inputs propagate untouched.
pub fn weight_inplace(image: &mut [f32], det: &DetectorGeometry) {
	let (n_h, n_v) = (det.n_h as usize, det.n_v as usize);
	debug_assert_eq!(image.len(), n_h * n_v);
	let h_min = det.h_min();
	let v_min = det.v_min();
	for row in 0..n_v {
		let v_coord = row as f32 * det.pitch_v + v_min + det.pitch_v / 2.0;
		for col in 0..n_h {
			let u_coord = col as f32 * det.pitch_h + h_min + det.pitch_h / 2.0;
			let w = det.d_sd / (det.d_sd * det.d_sd + u_coord * u_coord + v_coord * v_coord).sqrt();
			image[row * n_h + col] *= w;
		}
	}
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;

	use super::*;

	fn det(n_h: u32, n_v: u32) -> DetectorGeometry {
		DetectorGeometry { n_h, n_v, pitch_h: 1.0, pitch_v: 1.0, d_so: 100.0, d_sd: 200.0 }
	}

	#[test]
	fn center_pixel_weight_is_close_to_one_for_large_d_sd() {
		let d = det(9, 9);
		let mut img = vec![1.0f32; 81];
		weight_inplace(&mut img, &d);
		// The center pixel (u=0, v=0) weight is d_sd / sqrt(d_sd^2) = 1 exactly.
		assert_relative_eq!(img[4 * 9 + 4], 1.0, epsilon = 1e-5);
	}

	#[test]
	fn weight_never_exceeds_one_and_is_positive() {
		let d = det(16, 16);
		let mut img = vec![1.0f32; 256];
		weight_inplace(&mut img, &d);
		for &v in &img {
			assert!(v > 0.0 && v <= 1.0 + 1e-6);
		}
	}

	/// Property 6 (weighting sanity): for a single detector row (`n_v = 1`,
	/// so `v = 0` identically), `w(u) = D/sqrt(D^2+u^2)` has the elementary
	/// antiderivative `D * asinh(u/D)`. The discrete pixel-weighted sum
	/// (pitch-scaled, since each pixel represents one unit of integration
	/// width) should converge toward the closed-form definite integral over
	/// the detector's physical extent as resolution increases.
	#[test]
	fn weighting_sanity_matches_analytic_integral_for_a_single_row() {
		let pitch = 1.0f32;
		let d_sd = 300.0f32;
		let n_h = 4001u32;
		let d = DetectorGeometry { n_h, n_v: 1, pitch_h: pitch, pitch_v: pitch, d_so: 150.0, d_sd };
		let mut img = vec![1.0f32; n_h as usize];
		weight_inplace(&mut img, &d);
		let discrete_integral: f32 = img.iter().sum::<f32>() * pitch;

		let half_extent = d.h_min().abs() + pitch / 2.0;
		let analytic = 2.0 * d_sd * (half_extent / d_sd).asinh();

		assert_relative_eq!(discrete_integral, analytic, max_relative = 1e-3);
	}
}
