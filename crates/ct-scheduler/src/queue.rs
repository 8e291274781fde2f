use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::task::Task;

/// The shared task queue (spec §5): "multi-consumer, protected by a single
/// mutex + condition variable, drained to empty." Tasks are generated once,
/// up front, and never added to after construction, so in practice no
/// consumer ever actually waits on the condvar here — but it is kept (and
/// notified on every pop) rather than reasoned away, since it is the
/// primitive spec §5 names and a planner that grew the ability to add
/// tasks lazily would need it.
pub struct TaskQueue {
	inner: Mutex<VecDeque<Task>>,
	not_empty: Condvar,
}

impl TaskQueue {
	pub fn new(tasks: Vec<Task>) -> Self {
		TaskQueue {
			inner: Mutex::new(tasks.into()),
			not_empty: Condvar::new(),
		}
	}

	/// Pops the next task assigned to `device_id`, or `None` once no task
	/// for that device remains. Each per-device pipeline's Source stage
	/// drains exactly its own tasks this way (spec §4.1, §4.7: tasks are
	/// pre-assigned to a device at plan time).
	pub fn pop_for_device(&self, device_id: u32) -> Option<Task> {
		let mut guard = self.inner.lock();
		let pos = guard.iter().position(|t| t.device_id == device_id)?;
		let task = guard.remove(pos)?;
		drop(guard);
		self.not_empty.notify_all();
		tracing::debug!(device_id, subvolume_id = task.subvolume_id, remaining = self.len(), "task popped from queue");
		Some(task)
	}

	pub fn is_empty(&self) -> bool { self.inner.lock().is_empty() }

	pub fn len(&self) -> usize { self.inner.lock().len() }
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	fn task(id: u32, device_id: u32) -> Task {
		Task {
			subvolume_id: id,
			z_start: id * 4,
			z_end: id * 4 + 4,
			device_id,
			projection_range: 0..10,
		}
	}

	#[test]
	fn pop_for_device_only_returns_matching_tasks() {
		let queue = TaskQueue::new(vec![task(0, 0), task(1, 1), task(2, 0), task(3, 1)]);
		assert_eq!(queue.pop_for_device(0).unwrap().subvolume_id, 0);
		assert_eq!(queue.pop_for_device(0).unwrap().subvolume_id, 2);
		assert!(queue.pop_for_device(0).is_none());
		assert_eq!(queue.pop_for_device(1).unwrap().subvolume_id, 1);
	}

	#[test]
	fn queue_drains_to_empty_under_concurrent_consumers() {
		let queue = Arc::new(TaskQueue::new((0..100).map(|i| task(i, i % 4)).collect()));
		let handles: Vec<_> = (0..4)
			.map(|device_id| {
				let queue = queue.clone();
				std::thread::spawn(move || {
					let mut count = 0;
					while queue.pop_for_device(device_id).is_some() {
						count += 1;
					}
					count
				})
			})
			.collect();
		let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
		assert_eq!(total, 100);
		assert!(queue.is_empty());
	}
}
