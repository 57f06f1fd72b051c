//! Cooperative scheduling on the render thread.
//!
//! Everything here is single-threaded and `!Send`: repaint requests and UI
//! tasks are queued through shared handles and drained between event polls.

mod scheduler;
mod tasks;

pub use scheduler::{FrameScheduler, Invalidator};
pub use tasks::{TaskQueue, TaskSpawner};
