use std::sync::Arc;

use ct_core::{DetectorGeometry, Result};
use ct_pipeline::SourceStage as SourceStageTrait;
use ct_scheduler::TaskQueue;

use crate::data::{Projection, ProjectionData};
use crate::io::ProjectionReader;

/// Source stage (C4, §4.3): drains its device's share of the shared task
/// queue to exhaustion, reading raw projections through the external I/O
/// collaborator and tagging each with its rotation angle and task id. The
/// single true `Item::End` this pipeline ever emits comes from exhausting
/// every task assigned to `device_id` (spec §3 invariant ii) — not from a
/// per-task signal, since `ReconstructionStage` tells tasks apart by
/// watching `task_id` on the data itself (see `stages::reconstruction`).
pub struct SourceStage {
	device_id: u32,
	queue: Arc<TaskQueue>,
	reader: Arc<dyn ProjectionReader>,
	det: DetectorGeometry,
	delta_phi: f32,
	current_task: Option<ct_scheduler::Task>,
	next_offset: u32,
}

impl SourceStage {
	pub fn new(device_id: u32, queue: Arc<TaskQueue>, reader: Arc<dyn ProjectionReader>, det: DetectorGeometry, delta_phi: f32) -> Self {
		SourceStage { device_id, queue, reader, det, delta_phi, current_task: None, next_offset: 0 }
	}
}

impl SourceStageTrait for SourceStage {
	type Output = Projection;

	fn name(&self) -> &'static str { "source" }

	fn pull(&mut self) -> Result<Option<Projection>> {
		loop {
			if self.current_task.is_none() {
				self.current_task = self.queue.pop_for_device(self.device_id);
				self.next_offset = 0;
				match &self.current_task {
					Some(task) => tracing::debug!(device_id = self.device_id, subvolume_id = task.subvolume_id, "source starting task"),
					None => {
						tracing::debug!(device_id = self.device_id, "source exhausted its share of the task queue");
						return Ok(None);
					}
				}
			}
			let task = self.current_task.as_ref().expect("checked above");
			let idx = task.projection_range.start + self.next_offset;
			if idx >= task.projection_range.end {
				self.current_task = None;
				continue;
			}
			let task_id = task.subvolume_id;
			self.next_offset += 1;

			let data = self.reader.read(idx, self.det.n_h, self.det.n_v).map_err(|err| {
				tracing::error!(index = idx, error = %err, "source failed to read projection");
				err
			})?;
			let phi = idx as f32 * self.delta_phi;
			return Ok(Some(Projection {
				data: ProjectionData::Host(data),
				width: self.det.n_h,
				height: self.det.n_v,
				index: idx,
				phi,
				task_id,
				stream: None,
			}));
		}
	}
}
