use ct_core::{DetectorGeometry, Error, Result};
use ct_pipeline::Stage;

use crate::data::{Projection, ProjectionData};
use crate::kernel::weight_inplace;

/// Weighting stage (C6, §4.4): applies the cosine/distance pre-weight to a
/// device-resident projection in place.
pub struct WeightingStage {
	det: DetectorGeometry,
}

impl WeightingStage {
	pub fn new(det: DetectorGeometry) -> Self { WeightingStage { det } }
}

impl Stage for WeightingStage {
	type Input = Projection;
	type Output = Projection;

	fn name(&self) -> &'static str { "weighting" }

	fn on_data(&mut self, mut item: Projection, push: &mut dyn FnMut(Projection) -> Result<()>) -> Result<()> {
		match &mut item.data {
			ProjectionData::Device(buf) => buf.get_mut().view_mut(|slice| weight_inplace(slice, &self.det)).map_err(|err| {
				tracing::error!(index = item.index, error = %err, "weighting failed");
				err
			})?,
			ProjectionData::Host(_) => return Err(Error::invalid_argument("weighting stage expects a device-resident projection")),
		}
		tracing::trace!(index = item.index, "projection weighted");
		push(item)
	}
}
