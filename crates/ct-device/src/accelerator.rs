use std::sync::Once;

use cust::{context::Context, device::Device};

use crate::stream::StreamHandle;
use ct_core::{Error, Result};

static CUDA_INIT: Once = Once::new();

fn ensure_cuda_init() -> Result<()> {
	let mut init_err = None;
	CUDA_INIT.call_once(|| {
		if let Err(err) = cust::init(cust::CudaFlags::empty()) {
			init_err = Some(err);
		}
	});
	match init_err {
		Some(err) => Err(Error::construction(format!("failed to initialize CUDA driver: {err}"))),
		None => Ok(()),
	}
}

/// One visible accelerator (spec §6: "accelerator selection is automatic,
/// all visible devices are used"). Owns the CUDA context for its device;
/// every [`ct_device::DevicePool`](crate::DevicePool) and
/// [`StreamHandle`] created against it must be created while this
/// accelerator's context is current.
pub struct Accelerator {
	pub id: u32,
	device: Device,
	_context: Context,
}

impl Accelerator {
	/// Enumerate every visible accelerator. Construction failure (spec §7)
	/// if none are present.
	pub fn enumerate() -> Result<Vec<Accelerator>> {
		ensure_cuda_init()?;
		let count = Device::num_devices().map_err(|err| Error::construction(format!("failed to query devices: {err}")))?;
		if count == 0 {
			return Err(Error::construction("no CUDA-capable accelerators are visible"));
		}
		(0..count)
			.map(|id| {
				let device = Device::get_device(id)
					.map_err(|err| Error::construction(format!("failed to open device {id}: {err}")))?;
				let context =
					Context::new(device).map_err(|err| Error::construction(format!("failed to create context on device {id}: {err}")))?;
				Ok(Accelerator { id, device, _context: context })
			})
			.collect()
	}

	pub fn device(&self) -> Device { self.device }

	pub fn new_stream(&self) -> Result<StreamHandle> { StreamHandle::new() }

	pub fn name(&self) -> String { self.device.name().unwrap_or_else(|_| format!("device {}", self.id)) }

	/// Total device memory, used by the task planner (spec §4.7) to derive
	/// subvolume slab height.
	pub fn total_memory_bytes(&self) -> Result<usize> {
		self.device
			.total_memory()
			.map_err(|err| Error::construction(format!("failed to query device memory: {err}")))
	}
}
