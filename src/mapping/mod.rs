mod mapper;
mod table;

pub use mapper::{apply, MappedRecord};
pub use table::MappingTable;
