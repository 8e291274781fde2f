use std::sync::Arc;
use std::thread;

use ct_core::{EngineConfig, Error, Result, VolumeGeometry};
use ct_device::{Accelerator, DevicePool};
use ct_fdk::io::{FsProjectionReader, FsVolumeWriter, ProjectionReader, VolumeWriter};
use ct_fdk::kernel::RampFilter;
use ct_fdk::stages::{FilterStage, PreloaderStage, ReconstructionStage, SinkStage, SourceStage, WeightingStage};
use ct_pipeline::{edge, run_sink, run_source, run_stage, PipelineHandle};
use ct_scheduler::{build_tasks, plan_subvolumes, TaskQueue};

/// Bounded-channel capacity per edge (spec §4.1: "a small input limit, e.g.
/// 1 to 5, chosen to bound memory").
const INPUT_LIMIT: usize = 2;

/// Device buffers a [`PreloaderStage`] pool keeps in flight: the one being
/// reconstructed plus the one being preloaded/filtered concurrently, with
/// one slot of headroom for the hand-off between them.
const PRELOAD_POOL_LIMIT: usize = 3;

/// Constructs and runs one `Source -> Preloader -> Weighting -> Filter ->
/// Reconstruction -> Sink` pipeline per visible accelerator (spec §2: "one
/// such pipeline is instantiated per accelerator"), all sharing the single
/// task queue and Sink writer, then joins every worker thread.
pub fn run(config: &EngineConfig) -> Result<()> {
	let accelerators = Accelerator::enumerate()?;
	tracing::info!(count = accelerators.len(), "accelerators enumerated");

	let full_volume = VolumeGeometry::from_detector(&config.detector);
	let volume = match &config.roi {
		Some(roi) => VolumeGeometry::with_roi(&full_volume, roi)?,
		None => full_volume,
	};

	// Conservative: the plan must fit on every device, so it is sized
	// against whichever accelerator has the least memory.
	let min_device_bytes = accelerators
		.iter()
		.map(|a| a.total_memory_bytes())
		.collect::<Result<Vec<_>>>()?
		.into_iter()
		.min()
		.ok_or_else(|| Error::construction("no accelerators to plan against"))?;
	let plan = plan_subvolumes(&volume, &config.detector, min_device_bytes as u64)?;
	tracing::info!(n_z_sub = plan.n_z_sub, n_slabs = plan.n_slabs, "subvolume plan computed");

	let tasks = build_tasks(&volume, &plan, accelerators.len() as u32, config.num_projections);
	let queue = Arc::new(TaskQueue::new(tasks.clone()));

	let reader: Arc<dyn ProjectionReader> = Arc::new(FsProjectionReader::new(&config.input_dir));
	let writer: Arc<dyn VolumeWriter> = Arc::new(FsVolumeWriter::new(&config.output_dir, &config.output_prefix));

	let mut handle = PipelineHandle::new();
	for accelerator in &accelerators {
		let device_id = accelerator.id;
		let device_tasks: Vec<_> = tasks.iter().filter(|t| t.device_id == device_id).cloned().collect();

		let (src_tx, src_rx) = edge(INPUT_LIMIT);
		let (pre_tx, pre_rx) = edge(INPUT_LIMIT);
		let (wgt_tx, wgt_rx) = edge(INPUT_LIMIT);
		let (flt_tx, flt_rx) = edge(INPUT_LIMIT);
		let (rec_tx, rec_rx) = edge(INPUT_LIMIT);

		let source = SourceStage::new(device_id, queue.clone(), reader.clone(), config.detector, config.delta_phi);
		let preloader = PreloaderStage::new(DevicePool::new(PRELOAD_POOL_LIMIT));
		let weighting = WeightingStage::new(config.detector);
		let filter = FilterStage::new(RampFilter::build(config.detector.n_h, config.detector.pitch_h), config.detector.n_h);
		let reconstruction = ReconstructionStage::new(device_tasks, volume, config.detector, config.delta_phi, DevicePool::new(1));
		let sink = SinkStage::new(writer.clone(), volume);

		handle.push("source", thread::spawn(move || run_source(source, src_tx)));
		handle.push("preloader", thread::spawn(move || run_stage(preloader, src_rx, pre_tx)));
		handle.push("weighting", thread::spawn(move || run_stage(weighting, pre_rx, wgt_tx)));
		handle.push("filter", thread::spawn(move || run_stage(filter, wgt_rx, flt_tx)));
		handle.push("reconstruction", thread::spawn(move || run_stage(reconstruction, flt_rx, rec_tx)));
		handle.push("sink", thread::spawn(move || run_sink(sink, rec_rx)));

		tracing::info!(device_id, name = %accelerator.name(), tasks = device_tasks_len(&tasks, device_id), "pipeline constructed");
	}

	handle.join()
}

fn device_tasks_len(tasks: &[ct_scheduler::Task], device_id: u32) -> usize { tasks.iter().filter(|t| t.device_id == device_id).count() }
