use ct_device::{PooledBuffer, StreamHandle};

/// Where a projection's pixels currently live. Source and the tail of Sink
/// only ever see `Host`; every stage in between works on `Device` (spec
/// §3, §4.3).
pub enum ProjectionData {
	Host(Vec<f32>),
	Device(PooledBuffer<f32>),
}

/// One 2-D detector image at a fixed rotation angle (spec §3). The
/// `valid`/poison-pill flag from spec §3 is not a field here: termination
/// is the pipeline's `Item::End` (see `ct-pipeline`), not a value smuggled
/// through the data type it would otherwise terminate (spec §9).
pub struct Projection {
	pub data: ProjectionData,
	pub width: u32,
	pub height: u32,
	pub index: u32,
	pub phi: f32,
	/// Which task (subvolume) this projection is being streamed for.
	/// `ReconstructionStage` watches this field to detect the task
	/// boundary spec §4.6 describes ("awaits the next task") instead of
	/// needing a second in-band signal distinct from the pipeline's single
	/// sentinel (spec §3 invariant ii: exactly one poison pill per
	/// pipeline).
	pub task_id: u32,
	pub stream: Option<StreamHandle>,
}

pub enum SlabData {
	Host(Vec<f32>),
	Device(PooledBuffer<f32>),
}

/// An axis-aligned z-range of the reconstructed volume (spec §3).
pub struct VolumeSlab {
	pub data: SlabData,
	pub x_extent: u32,
	pub y_extent: u32,
	pub z_extent: u32,
	pub z_offset: u32,
	pub subvolume_id: u32,
	pub stream: Option<StreamHandle>,
}

impl VolumeSlab {
	pub fn voxel_count(&self) -> usize { self.x_extent as usize * self.y_extent as usize * self.z_extent as usize }
}
