pub mod notion;
pub mod traits;

pub use notion::{select_open_tasks, NotionTaskSource};
pub use traits::{TaskSource, TaskSummary};
