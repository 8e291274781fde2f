use crossbeam_channel::{Receiver, Sender};

use crate::item::Item;

/// One producer/consumer edge between two stages: a bounded channel whose
/// capacity is the "input limit" of spec §4.1 — small, so the graph's
/// steady-state memory is bounded and a full channel produces real
/// backpressure (the stage that would overflow it simply blocks on send).
pub fn edge<T: Send + 'static>(input_limit: usize) -> (Sender<Item<T>>, Receiver<Item<T>>) {
	crossbeam_channel::bounded(input_limit.max(1))
}
