use rustc_hash::FxHashMap;

use ct_core::{DetectorGeometry, Error, Result, VolumeGeometry};
use ct_device::DevicePool;
use ct_pipeline::Stage;
use ct_scheduler::Task;

use crate::data::{Projection, ProjectionData, SlabData, VolumeSlab};
use crate::kernel::backproject_into_slab;

/// Reconstruction stage (C8, §4.6): differential back-projection of each
/// incoming filtered projection into the subvolume its `task_id` names.
///
/// The generic `Stage` contract (§4.1) only knows about a single sentinel;
/// this stage instead watches `Projection::task_id` to find the boundary
/// spec §4.6 describes ("awaits the next task"): a task switch flushes the
/// slab in progress to the Sink before starting the next one, and the
/// final flush happens in `on_end`, right before the one true sentinel is
/// forwarded (see `stages::source`).
pub struct ReconstructionStage {
	tasks: FxHashMap<u32, Task>,
	vol: VolumeGeometry,
	det: DetectorGeometry,
	delta_phi: f32,
	slab_pool: DevicePool<f32>,
	current: Option<(u32, ct_device::PooledBuffer<f32>)>,
}

impl ReconstructionStage {
	pub fn new(tasks: Vec<Task>, vol: VolumeGeometry, det: DetectorGeometry, delta_phi: f32, slab_pool: DevicePool<f32>) -> Self {
		let tasks = tasks.into_iter().map(|t| (t.subvolume_id, t)).collect();
		ReconstructionStage { tasks, vol, det, delta_phi, slab_pool, current: None }
	}

	fn flush_current(&mut self, push: &mut dyn FnMut(VolumeSlab) -> Result<()>) -> Result<()> {
		if let Some((task_id, buf)) = self.current.take() {
			let task = self.tasks.get(&task_id).expect("task id on an in-flight slab is always known").clone();
			tracing::debug!(subvolume_id = task_id, z_start = task.z_start, z_end = task.z_end, "flushing subvolume to sink");
			push(VolumeSlab {
				data: SlabData::Device(buf),
				x_extent: self.vol.n_x,
				y_extent: self.vol.n_y,
				z_extent: task.slab_height(),
				z_offset: task.z_start,
				subvolume_id: task_id,
				stream: None,
			})?;
		}
		Ok(())
	}

	fn start_task(&mut self, task_id: u32) -> Result<()> {
		let task = self
			.tasks
			.get(&task_id)
			.ok_or_else(|| {
				tracing::error!(task_id, "reconstruction stage received a projection for an unknown task");
				Error::invalid_argument("reconstruction stage received a projection for an unknown task")
			})?
			.clone();
		tracing::debug!(subvolume_id = task_id, z_start = task.z_start, z_end = task.z_end, "reconstruction starting task");
		let plane = self.vol.n_x as usize * self.vol.n_y as usize;
		let mut buf = self.slab_pool.allocate_smart(plane, task.slab_height() as usize).map_err(|err| {
			tracing::error!(subvolume_id = task_id, error = %err, "reconstruction failed to allocate subvolume buffer");
			err
		})?;
		buf.get_mut().zero_fill()?;
		self.current = Some((task_id, buf));
		Ok(())
	}
}

impl Stage for ReconstructionStage {
	type Input = Projection;
	type Output = VolumeSlab;

	fn name(&self) -> &'static str { "reconstruction" }

	fn on_data(&mut self, item: Projection, push: &mut dyn FnMut(VolumeSlab) -> Result<()>) -> Result<()> {
		let is_new_task = self.current.as_ref().map(|(id, _)| *id) != Some(item.task_id);
		if is_new_task {
			self.flush_current(push)?;
			self.start_task(item.task_id)?;
		}

		let device_proj = match item.data {
			ProjectionData::Device(buf) => buf,
			ProjectionData::Host(_) => return Err(Error::invalid_argument("reconstruction stage expects a device-resident projection")),
		};
		let task = self.tasks.get(&item.task_id).expect("just started or already owned").clone();
		let (vol, det, delta_phi) = (self.vol, self.det, self.delta_phi);
		let (_, slab) = self.current.as_mut().expect("started above");

		let mut inner_result = Ok(());
		device_proj.get().view(|proj_slice| {
			inner_result = slab.get_mut().view_mut(|slab_slice| {
				backproject_into_slab(slab_slice, &vol, task.z_start, task.slab_height(), &det, proj_slice, item.phi, delta_phi);
			});
		})?;
		inner_result?;

		if let Some(stream) = &item.stream {
			stream.synchronize()?;
		}
		Ok(())
	}

	fn on_end(&mut self, push: &mut dyn FnMut(VolumeSlab) -> Result<()>) -> Result<()> { self.flush_current(push) }
}
