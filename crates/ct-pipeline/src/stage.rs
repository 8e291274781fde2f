use crossbeam_channel::{Receiver, Sender};
use ct_core::{Error, Result};

use crate::item::Item;

/// A middle stage of the pipeline (spec §4.1): pulls one item, and if it is
/// real data, processes it and pushes zero or more items downstream.
///
/// The generic driver (`run_stage`) implements the blocking worker loop
/// described in spec §4.1 verbatim: pull one item; if it's the sentinel,
/// forward it and return; otherwise hand it to the stage and push whatever
/// the stage produces. A stage that needs to see task boundaries (only
/// `ReconstructionStage` does, per spec §4.6) inspects its own notion of
/// task identity on the data it's handed; it does not need a separate
/// in-band signal for that, since every item already carries enough context
/// to tell (see `ct-fdk::stages::reconstruction`).
pub trait Stage: Send {
	type Input: Send + 'static;
	type Output: Send + 'static;

	fn name(&self) -> &'static str;

	/// Handle one real data item. May push zero or more items downstream
	/// through `push` before returning.
	fn on_data(&mut self, item: Self::Input, push: &mut dyn FnMut(Self::Output) -> Result<()>) -> Result<()>;

	/// Called exactly once, when the sentinel is observed, before it is
	/// forwarded downstream. Default: emit nothing (most stages are pure
	/// per-item transforms and have nothing left to flush).
	fn on_end(&mut self, _push: &mut dyn FnMut(Self::Output) -> Result<()>) -> Result<()> { Ok(()) }
}

/// A pipeline head: pulls from an external collaborator (the shared task
/// queue plus the out-of-scope projection I/O) rather than an upstream
/// channel (spec §4.1, §4.3).
pub trait SourceStage: Send {
	type Output: Send + 'static;

	fn name(&self) -> &'static str;

	/// Produce the next item, or `None` once the external source (the
	/// shared task queue, drained to empty) is exhausted.
	fn pull(&mut self) -> Result<Option<Self::Output>>;
}

/// A pipeline tail: consumes until the sentinel, with no downstream channel
/// (spec §4.3, C9).
pub trait SinkStage: Send {
	type Input: Send + 'static;

	fn name(&self) -> &'static str;

	fn on_data(&mut self, item: Self::Input) -> Result<()>;

	/// Called once the sentinel arrives; the sink has seen every item.
	fn on_end(&mut self) -> Result<()> { Ok(()) }
}

fn push_data<T>(tx: &Sender<Item<T>>) -> impl FnMut(T) -> Result<()> + '_ {
	move |item: T| {
		tx.send(Item::Data(item))
			.map_err(|_| Error::runtime("downstream channel closed unexpectedly"))
	}
}

/// Drives a middle stage: the worker-thread body spec §4.1 and §5 describe.
/// Blocks on an empty upstream channel or a full downstream channel; no
/// busy-waiting. On any stage error, poisons the downstream edge with the
/// sentinel before propagating the error, so the rest of the graph drains
/// (spec §5, §7).
pub fn run_stage<S: Stage>(mut stage: S, rx: Receiver<Item<S::Input>>, tx: Sender<Item<S::Output>>) -> Result<()> {
	loop {
		match rx.recv() {
			Ok(Item::Data(item)) => {
				let mut push = push_data(&tx);
				if let Err(err) = stage.on_data(item, &mut push) {
					tracing::error!(stage = stage.name(), error = %err, "stage failed, poisoning pipeline");
					let _ = tx.send(Item::End);
					return Err(err);
				}
			}
			Ok(Item::End) => {
				let mut push = push_data(&tx);
				let result = stage.on_end(&mut push);
				let _ = tx.send(Item::End);
				return result;
			}
			Err(_) => {
				tracing::error!(stage = stage.name(), "upstream channel closed without a sentinel");
				let _ = tx.send(Item::End);
				return Err(Error::runtime(format!(
					"{}: upstream channel disconnected without a sentinel",
					stage.name()
				)));
			}
		}
	}
}

/// Drives the source stage: pulls until exhaustion, then emits exactly one
/// sentinel (spec §4.1: "tasks are drained until empty, then Source emits
/// its sentinel").
pub fn run_source<S: SourceStage>(mut stage: S, tx: Sender<Item<S::Output>>) -> Result<()> {
	loop {
		match stage.pull() {
			Ok(Some(item)) => {
				if tx.send(Item::Data(item)).is_err() {
					return Err(Error::runtime(format!("{}: downstream channel closed unexpectedly", stage.name())));
				}
			}
			Ok(None) => {
				let _ = tx.send(Item::End);
				return Ok(());
			}
			Err(err) => {
				tracing::error!(stage = stage.name(), error = %err, "source failed, poisoning pipeline");
				let _ = tx.send(Item::End);
				return Err(err);
			}
		}
	}
}

/// Drives the sink stage: consumes until the sentinel, with no downstream
/// edge (spec §4.3, C9).
pub fn run_sink<S: SinkStage>(mut stage: S, rx: Receiver<Item<S::Input>>) -> Result<()> {
	loop {
		match rx.recv() {
			Ok(Item::Data(item)) => {
				if let Err(err) = stage.on_data(item) {
					tracing::error!(stage = stage.name(), error = %err, "sink failed");
					return Err(err);
				}
			}
			Ok(Item::End) => return stage.on_end(),
			Err(_) => {
				return Err(Error::runtime(format!(
					"{}: upstream channel disconnected without a sentinel",
					stage.name()
				)))
			}
		}
	}
}
