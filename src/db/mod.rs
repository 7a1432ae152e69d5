pub mod connection;
pub mod properties;

pub use connection::{init_db, init_db_from_file, Database, SCHEMA_SQL};
