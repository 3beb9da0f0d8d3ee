//! Task domain module.

mod model;

pub use model::{Priority, Task, TaskStatus, TaskType};
