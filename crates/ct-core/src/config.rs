use serde::{Deserialize, Serialize};

use crate::geometry::{DetectorGeometry, Roi};

/// The struct the out-of-scope CLI layer (spec §6) parses its flags into.
/// The core never touches argv; it only ever sees this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
	pub input_dir: String,
	pub output_dir: String,
	pub output_prefix: String,

	pub detector: DetectorGeometry,
	/// Angular step between consecutive projections, radians.
	pub delta_phi: f32,
	pub num_projections: u32,

	pub roi: Option<Roi>,
	pub enable_io: bool,
}

impl EngineConfig {
	pub fn angle_for_index(&self, index: u32) -> f32 { index as f32 * self.delta_phi }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geometry::DetectorGeometry;

	#[test]
	fn round_trips_through_json() {
		let cfg = EngineConfig {
			input_dir: "in".into(),
			output_dir: "out".into(),
			output_prefix: "vol".into(),
			detector: DetectorGeometry {
				n_h: 64,
				n_v: 64,
				pitch_h: 1.0,
				pitch_v: 1.0,
				d_so: 100.0,
				d_sd: 200.0,
			},
			delta_phi: std::f32::consts::TAU / 360.0,
			num_projections: 360,
			roi: None,
			enable_io: true,
		};
		let json = serde_json::to_string(&cfg).unwrap();
		let back: EngineConfig = serde_json::from_str(&json).unwrap();
		assert_eq!(back.num_projections, cfg.num_projections);
		assert_eq!(back.detector, cfg.detector);
	}

	#[test]
	fn angle_for_index_is_linear() {
		let cfg = EngineConfig {
			input_dir: String::new(),
			output_dir: String::new(),
			output_prefix: String::new(),
			detector: DetectorGeometry {
				n_h: 8,
				n_v: 8,
				pitch_h: 1.0,
				pitch_v: 1.0,
				d_so: 100.0,
				d_sd: 200.0,
			},
			delta_phi: 0.1,
			num_projections: 10,
			roi: None,
			enable_io: false,
		};
		assert_eq!(cfg.angle_for_index(3), 0.3_f32);
	}
}
