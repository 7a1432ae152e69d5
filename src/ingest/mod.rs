pub mod batch;
pub mod reader;

pub use batch::{run_batch, BatchSummary};
pub use reader::{count_records, JsonLines};
