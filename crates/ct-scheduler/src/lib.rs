//! Geometry & Task Planner (spec §4.7, C1): closed-form volume-extent and
//! subvolume decomposition, plus the shared task queue every per-device
//! pipeline's Source stage drains.

mod plan;
mod queue;
mod task;

pub use plan::{build_tasks, plan_subvolumes, SubvolumePlan, PARALLEL_PROJECTIONS, USABLE_MEMORY_FRACTION};
pub use queue::TaskQueue;
pub use task::Task;
