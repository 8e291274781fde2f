use ct_core::{Error, Result};
use ct_pipeline::Stage;

use crate::data::{Projection, ProjectionData};
use crate::kernel::RampFilter;

/// Filter stage (C7, §4.5): per-row ramp filter via FFT, built once per
/// device at stage construction and reused for every projection that
/// passes through it (spec §4.5: "FFT plans are created per task/device
/// pair").
pub struct FilterStage {
	filter: RampFilter,
	n_h: usize,
}

impl FilterStage {
	pub fn new(filter: RampFilter, n_h: u32) -> Self { FilterStage { filter, n_h: n_h as usize } }
}

impl Stage for FilterStage {
	type Input = Projection;
	type Output = Projection;

	fn name(&self) -> &'static str { "filter" }

	fn on_data(&mut self, mut item: Projection, push: &mut dyn FnMut(Projection) -> Result<()>) -> Result<()> {
		let n_h = self.n_h;
		let filter = &self.filter;
		match &mut item.data {
			ProjectionData::Device(buf) => buf
				.get_mut()
				.view_mut(|slice| {
					for row in slice.chunks_mut(n_h) {
						// Independently testable per-row failures (length mismatches)
						// can't happen here: `chunks_mut(n_h)` already guarantees the
						// exact row width `apply_row` expects.
						filter.apply_row(row).expect("row length matches detector column count by construction");
					}
				})
				.map_err(|err| {
					tracing::error!(index = item.index, error = %err, "filter failed");
					err
				})?,
			ProjectionData::Host(_) => return Err(Error::invalid_argument("filter stage expects a device-resident projection")),
		}
		tracing::trace!(index = item.index, "projection filtered");
		push(item)
	}
}
