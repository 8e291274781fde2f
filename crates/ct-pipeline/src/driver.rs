use std::thread::JoinHandle;

use ct_core::{Error, Result};

/// The set of OS threads backing one per-accelerator pipeline (spec §5:
/// "each stage in each per-device pipeline runs on its own OS-level worker
/// thread"). Joining is how a fatal failure on any worker is observed and
/// turned into a process exit code (spec §7).
#[must_use]
pub struct PipelineHandle {
	workers: Vec<(&'static str, JoinHandle<Result<()>>)>,
}

impl PipelineHandle {
	pub fn new() -> Self { Self { workers: Vec::new() } }

	pub fn push(&mut self, name: &'static str, handle: JoinHandle<Result<()>>) { self.workers.push((name, handle)); }

	/// Joins every worker thread, in the order they were added. Returns the
	/// first failure encountered (by join order), after every thread has
	/// been joined — a fatal error on one worker still lets every other
	/// worker drain via the in-band sentinel (spec §5, §7).
	pub fn join(self) -> Result<()> {
		let mut first_error = None;
		for (name, handle) in self.workers {
			match handle.join() {
				Ok(Ok(())) => {}
				Ok(Err(err)) => {
					tracing::error!(stage = name, error = %err, "worker exited with error");
					first_error.get_or_insert(err);
				}
				Err(panic) => {
					let msg = panic_message(panic);
					tracing::error!(stage = name, panic = %msg, "worker thread panicked");
					first_error.get_or_insert(Error::runtime(format!("{name}: worker panicked: {msg}")));
				}
			}
		}
		match first_error {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

impl Default for PipelineHandle {
	fn default() -> Self { Self::new() }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"<non-string panic payload>".to_string()
	}
}
