use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use ct_core::filter_length;
use ct_core::{Error, Result};

/// 1-D ramp filter (spec §4.5, C7): built once per device at startup from
/// the detector's horizontal pixel pitch, then applied per projection row.
///
/// The filter kernel `r(j)` is built directly in wrapped FFT index order
/// (index `n` holds `j = n` for `n <= L/2`, `j = n - L` otherwise) rather
/// than the "centered" `-(L-2)/2 .. L/2` order the formula is stated in —
/// this is the standard way to lay out a circularly-symmetric real kernel
/// for an FFT-based convolution, and the two are the same multiset of `j`
/// values, just reindexed for the transform.
pub struct RampFilter {
	n_h: usize,
	len: usize,
	/// `K(omega) = tau * |FFT(r)|`, stored as the real magnitude per
	/// frequency bin (spec §4.5 step 3, §9 Open Question 2: both halves of
	/// the complex response get this same magnitude, so storing it once is
	/// enough — see `apply_row`).
	k_mag: Vec<f32>,
	r2c: Arc<dyn RealToComplex<f32>>,
	c2r: Arc<dyn ComplexToReal<f32>>,
}

impl RampFilter {
	/// `n_h` is the detector column count (the axis actually padded and
	/// filtered by §4.5 steps 1-2); `tau` is the horizontal pixel pitch.
	pub fn build(n_h: u32, tau: f32) -> Self {
		let len = filter_length(n_h) as usize;
		let mut r = vec![0.0f32; len];
		let l = len as i64;
		for n in 0..len {
			let j = if n as i64 <= l / 2 { n as i64 } else { n as i64 - l };
			r[n] = ramp_kernel_sample(j, tau);
		}

		let mut planner = RealFftPlanner::<f32>::new();
		let r2c = planner.plan_fft_forward(len);
		let c2r = planner.plan_fft_inverse(len);

		let mut spectrum = r2c.make_output_vec();
		let mut scratch = r.clone();
		r2c.process(&mut scratch, &mut spectrum).expect("fixed-length forward FFT cannot fail");
		let k_mag: Vec<f32> = spectrum.iter().map(|x| tau * x.norm()).collect();

		RampFilter { n_h: n_h as usize, len, k_mag, r2c, c2r }
	}

	pub fn filter_length(&self) -> usize { self.len }

	/// Applies the filter to one detector row in place (spec §4.5 steps
	/// 1-6): zero-pad to `len`, forward FFT, per-bin product against
	/// `k_mag` on *both* the real and imaginary parts independently (the
	/// literal, non-complex-multiply form §9 flags — mathematically
	/// equivalent to scaling by a real magnitude, since `k_mag` is the same
	/// value in both slots), inverse FFT, unpad, normalize by `len`.
	pub fn apply_row(&self, row: &mut [f32]) -> Result<()> {
		if row.len() != self.n_h {
			return Err(Error::invalid_argument("filter row length does not match detector column count"));
		}
		let mut padded = vec![0.0f32; self.len];
		padded[..self.n_h].copy_from_slice(row);

		let mut spectrum = self.r2c.make_output_vec();
		self.r2c
			.process(&mut padded, &mut spectrum)
			.map_err(|err| Error::runtime(format!("forward FFT failed: {err}")))?;

		for (bin, mag) in spectrum.iter_mut().zip(self.k_mag.iter()) {
			*bin = Complex32::new(bin.re * mag, bin.im * mag);
		}

		let mut time = self.c2r.make_output_vec();
		self.c2r
			.process(&mut spectrum, &mut time)
			.map_err(|err| Error::runtime(format!("inverse FFT failed: {err}")))?;

		let norm = self.len as f32;
		for (out, t) in row.iter_mut().zip(time.iter()) {
			*out = t / norm;
		}
		Ok(())
	}
}

fn ramp_kernel_sample(j: i64, tau: f32) -> f32 {
	if j == 0 {
		1.0 / (8.0 * tau * tau)
	} else if j % 2 == 0 {
		0.0
	} else {
		let jf = j as f32;
		-1.0 / (2.0 * jf * jf * std::f32::consts::PI * std::f32::consts::PI * tau * tau)
	}
}
