pub mod query;
pub mod task;

pub use query::{Direction, Filter, SortKey, TaskQuery};
pub use task::{Priority, Status, Task};
