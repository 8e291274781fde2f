use std::sync::Arc;

use ct_core::{Result, VolumeGeometry};
use ct_pipeline::SinkStage as SinkStageTrait;

use crate::data::{SlabData, VolumeSlab};
use crate::io::VolumeWriter;

/// Sink stage (C9, §4.3): device-to-host download of finished subvolumes,
/// then one `write_slice` call per absolute `z` index through the external
/// I/O collaborator. Shared by every per-device pipeline (spec §5): each
/// pipeline gets its own `SinkStage` instance, but they all hold the same
/// `Arc<dyn VolumeWriter>`, so submissions are concurrent while the writer
/// itself serializes the actual writes.
pub struct SinkStage {
	writer: Arc<dyn VolumeWriter>,
	vol: VolumeGeometry,
}

impl SinkStage {
	pub fn new(writer: Arc<dyn VolumeWriter>, vol: VolumeGeometry) -> Self { SinkStage { writer, vol } }
}

impl SinkStageTrait for SinkStage {
	type Input = VolumeSlab;

	fn name(&self) -> &'static str { "sink" }

	fn on_data(&mut self, item: VolumeSlab) -> Result<()> {
		let subvolume_id = item.subvolume_id;
		let plane_len = self.vol.n_x as usize * self.vol.n_y as usize;
		let host = match item.data {
			SlabData::Host(host) => host,
			SlabData::Device(buf) => {
				let mut host = vec![0.0f32; buf.get().width() * buf.get().height()];
				buf.get().download(&mut host).map_err(|err| {
					tracing::error!(subvolume_id, error = %err, "sink failed to download subvolume");
					err
				})?;
				host
			}
		};
		for z in 0..item.z_extent as usize {
			let plane = &host[z * plane_len..(z + 1) * plane_len];
			self.writer.write_slice(item.z_offset + z as u32, self.vol.n_x, self.vol.n_y, plane).map_err(|err| {
				tracing::error!(subvolume_id, z_index = item.z_offset + z as u32, error = %err, "sink failed to write slice");
				err
			})?;
		}
		tracing::debug!(subvolume_id, z_offset = item.z_offset, z_extent = item.z_extent, "sink wrote subvolume");
		Ok(())
	}
}
