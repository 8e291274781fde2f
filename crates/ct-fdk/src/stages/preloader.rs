use ct_core::{Error, Result};
use ct_device::{DevicePool, StreamHandle};
use ct_pipeline::Stage;

use crate::data::{Projection, ProjectionData};

/// Preloader stage (C5, §4.3): host-to-device upload. Allocates a 2-D
/// device buffer from the pool, zero-fills it, copies the host pixels in,
/// and attaches a fresh non-default stream to the projection. The stream is
/// synchronized exactly once here, before the host source buffer is
/// dropped, so every downstream kernel launch can stay asynchronous (spec
/// §4.3, §5).
pub struct PreloaderStage {
	pool: DevicePool<f32>,
}

impl PreloaderStage {
	pub fn new(pool: DevicePool<f32>) -> Self { PreloaderStage { pool } }
}

impl Stage for PreloaderStage {
	type Input = Projection;
	type Output = Projection;

	fn name(&self) -> &'static str { "preloader" }

	fn on_data(&mut self, item: Projection, push: &mut dyn FnMut(Projection) -> Result<()>) -> Result<()> {
		let host = match item.data {
			ProjectionData::Host(host) => host,
			ProjectionData::Device(_) => return Err(Error::invalid_argument("preloader expects a host-resident projection")),
		};

		let mut buf = self.pool.allocate_smart(item.width as usize, item.height as usize).map_err(|err| {
			tracing::error!(index = item.index, error = %err, "preloader failed to allocate a device buffer");
			err
		})?;
		buf.get_mut().zero_fill()?;
		buf.get_mut().upload(&host)?;

		let stream = StreamHandle::new()?;
		stream.synchronize()?;
		tracing::debug!(index = item.index, task_id = item.task_id, "preloader uploaded projection to device");

		push(Projection {
			data: ProjectionData::Device(buf),
			width: item.width,
			height: item.height,
			index: item.index,
			phi: item.phi,
			task_id: item.task_id,
			stream: Some(stream),
		})
	}
}
