use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Detector geometry (spec §3): immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
	pub n_h: u32,
	pub n_v: u32,
	pub pitch_h: f32,
	pub pitch_v: f32,
	pub d_so: f32,
	pub d_sd: f32,
}

impl DetectorGeometry {
	pub fn validate(&self) -> Result<()> {
		if self.n_h == 0 || self.n_v == 0 {
			return Err(Error::construction("detector pixel counts must be nonzero"));
		}
		if self.pitch_h <= 0.0 || self.pitch_v <= 0.0 {
			return Err(Error::construction("detector pixel pitch must be positive"));
		}
		if self.d_so <= 0.0 || self.d_sd <= 0.0 {
			return Err(Error::construction("source distances must be positive"));
		}
		Ok(())
	}

	/// Leftmost detector-column coordinate, pixel-center convention (spec §3).
	pub fn h_min(&self) -> f32 { -(((self.n_h as f32 - 1.0) / 2.0) * self.pitch_h) }

	/// Topmost detector-row coordinate, pixel-center convention (spec §3).
	pub fn v_min(&self) -> f32 { -(((self.n_v as f32 - 1.0) / 2.0) * self.pitch_v) }

	/// Isotropic voxel size from the standard FDK magnification formula (§4.7).
	pub fn voxel_size(&self) -> f32 { self.pitch_h * self.d_so / self.d_sd }
}

/// Axis-aligned clip region in volume space (spec §6), prior to becoming an
/// absolute `VolumeGeometry`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
	pub x1: f32,
	pub x2: f32,
	pub y1: f32,
	pub y2: f32,
	pub z1: f32,
	pub z2: f32,
}

/// Volume geometry (spec §3), derived from detector geometry unless an ROI
/// overrides it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeGeometry {
	pub n_x: u32,
	pub n_y: u32,
	pub n_z: u32,
	pub vx: f32,
	pub x_min: f32,
	pub y_min: f32,
	pub z_min: f32,
}

impl VolumeGeometry {
	/// Derive the full-field volume from detector geometry via the standard
	/// FDK magnification formula (spec §3, §4.7): a voxel grid whose
	/// footprint exactly covers the detector's field of view at isocenter.
	pub fn from_detector(det: &DetectorGeometry) -> Self {
		let vx = det.voxel_size();
		let n_x = det.n_h;
		let n_y = det.n_h;
		let n_z = det.n_v;
		VolumeGeometry {
			n_x,
			n_y,
			n_z,
			vx,
			x_min: -((n_x as f32 - 1.0) / 2.0) * vx,
			y_min: -((n_y as f32 - 1.0) / 2.0) * vx,
			z_min: -((n_z as f32 - 1.0) / 2.0) * vx,
		}
	}

	/// Clip a full-field volume geometry to an ROI, keeping the same voxel
	/// size (spec §6, §7: an ROI outside the field of view is a construction
	/// failure).
	pub fn with_roi(full: &VolumeGeometry, roi: &Roi) -> Result<Self> {
		if roi.x1 >= roi.x2 || roi.y1 >= roi.y2 || roi.z1 >= roi.z2 {
			return Err(Error::construction("ROI bounds must be strictly increasing"));
		}
		let vx = full.vx;
		let to_index = |v: f32, min: f32| ((v - min) / vx).round() as i64;

		let full_x_max = full.x_min + full.n_x as f32 * vx;
		let full_y_max = full.y_min + full.n_y as f32 * vx;
		let full_z_max = full.z_min + full.n_z as f32 * vx;
		if roi.x1 < full.x_min || roi.x2 > full_x_max
			|| roi.y1 < full.y_min || roi.y2 > full_y_max
			|| roi.z1 < full.z_min || roi.z2 > full_z_max
		{
			return Err(Error::construction("ROI does not lie within the detector-derived volume bounds"));
		}

		let x0 = to_index(roi.x1, full.x_min).max(0) as u32;
		let y0 = to_index(roi.y1, full.y_min).max(0) as u32;
		let z0 = to_index(roi.z1, full.z_min).max(0) as u32;
		let n_x = (to_index(roi.x2, full.x_min) as u32).saturating_sub(x0).max(1);
		let n_y = (to_index(roi.y2, full.y_min) as u32).saturating_sub(y0).max(1);
		let n_z = (to_index(roi.z2, full.z_min) as u32).saturating_sub(z0).max(1);

		Ok(VolumeGeometry {
			n_x,
			n_y,
			n_z,
			vx,
			x_min: full.x_min + x0 as f32 * vx,
			y_min: full.y_min + y0 as f32 * vx,
			z_min: full.z_min + z0 as f32 * vx,
		})
	}

	pub fn voxel_count(&self) -> u64 { self.n_x as u64 * self.n_y as u64 * self.n_z as u64 }
}

#[cfg(test)]
mod tests {
	use approx::assert_relative_eq;

	use super::*;

	fn det() -> DetectorGeometry {
		DetectorGeometry {
			n_h: 512,
			n_v: 400,
			pitch_h: 0.4,
			pitch_v: 0.4,
			d_so: 500.0,
			d_sd: 1000.0,
		}
	}

	#[test]
	fn validate_accepts_sane_geometry() { det().validate().unwrap(); }

	#[test]
	fn validate_rejects_nonpositive_distances() {
		let mut d = det();
		d.d_so = 0.0;
		assert!(d.validate().is_err());
	}

	/// E1 uses `d_so == d_sd` (a degenerate but not invalid geometry, object
	/// coincident with the detector plane) — equal distances must validate.
	#[test]
	fn validate_accepts_equal_distances() {
		let mut d = det();
		d.d_so = d.d_sd;
		d.validate().unwrap();
	}

	#[test]
	fn h_min_is_symmetric_about_zero() {
		let d = det();
		let h_max = d.h_min() + (d.n_h as f32 - 1.0) * d.pitch_h;
		assert_relative_eq!(d.h_min(), -h_max, epsilon = 1e-4);
	}

	#[test]
	fn volume_from_detector_uses_fdk_magnification() {
		let d = det();
		let vol = VolumeGeometry::from_detector(&d);
		assert_relative_eq!(vol.vx, d.pitch_h * d.d_so / d.d_sd, epsilon = 1e-6);
		assert_eq!(vol.n_x, d.n_h);
		assert_eq!(vol.n_z, d.n_v);
	}

	#[test]
	fn roi_outside_bounds_is_construction_failure() {
		let d = det();
		let full = VolumeGeometry::from_detector(&d);
		let roi = Roi {
			x1: full.x_min - 1000.0,
			x2: full.x_min + 10.0,
			y1: full.y_min,
			y2: full.y_min + 10.0,
			z1: full.z_min,
			z2: full.z_min + 10.0,
		};
		assert!(matches!(VolumeGeometry::with_roi(&full, &roi), Err(Error::Construction(_))));
	}
}
