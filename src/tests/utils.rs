use rusqlite::params;
use serde_json::{Map, Value};

use crate::db::connection::{init_db, Database, SCHEMA_SQL};
use crate::mapping::MappingTable;

/// Fresh in-memory database carrying the production schema.
pub fn init_test_db() -> Database {
    let mut db = Database::open_in_memory().expect("in-memory DB should open");
    init_db(&mut db, SCHEMA_SQL).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub const TEST_MAPPING: &str = "\
raw_field,target_table,target_column
ExternalId,property,external_id
Address,property,address_line1
City,property,city
Postal_Code,property,postal_code
Lat,property,latitude
Beds,property_detail,bedrooms
Baths,property_detail,bathrooms
HOA,hoa,has_hoa
HOA_Name,hoa,hoa_name
HOA_Fee,hoa,hoa_fee_amount
Valuation_Source,valuation,valuation_source
Value,valuation,valuation_amount
Value_Date,valuation,valuation_date
Rehab_Total,rehab_estimate,rehab_estimate_total
Rehab_Breakdown,rehab_estimate,rehab_estimate_breakdown
";

pub fn test_mapping() -> MappingTable {
    MappingTable::from_reader(TEST_MAPPING.as_bytes()).expect("test mapping should load")
}

pub fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Total rows across all six tables.
pub fn total_rows(db: &mut Database) -> i64 {
    [
        "property",
        "property_detail",
        "valuation",
        "hoa",
        "rehab_estimate",
        "property_attribute",
    ]
    .iter()
    .map(|t| count(db, t, None))
    .sum()
}

/// Row count of `table`, optionally restricted to one property.
pub fn count(db: &mut Database, table: &str, property_id: Option<i64>) -> i64 {
    db.with_conn(|conn| match property_id {
        Some(id) => conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE property_id = ?1"),
            params![id],
            |r| r.get(0),
        ),
        None => conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0)),
    })
    .unwrap_or_else(|e| panic!("count {table} failed: {e}"))
}
