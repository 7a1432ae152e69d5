pub mod coerce;
pub mod property;
pub mod schema;

pub use property::PropertyRecord;
