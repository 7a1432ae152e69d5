use log::debug;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::db::connection::Database;
use crate::domain::property::{
    HoaInfo, PropertyCore, PropertyDetail, PropertyRecord, RehabEstimate, Valuation,
};
use crate::domain::schema::{
    HOA, PROPERTY, PROPERTY_ATTRIBUTE, PROPERTY_DETAIL, REHAB_ESTIMATE, VALUATION,
};
use crate::errors::StorageError;

impl Database {
    pub fn write_property(&mut self, record: &PropertyRecord) -> Result<i64, StorageError> {
        self.with_conn(|conn| write_property(conn, record))
    }
}

/// Main entry point for persisting one validated record.
///
/// The whole fan-out (property, detail, the optional valuation / hoa / rehab
/// rows and one attribute row per residual field) runs inside a single
/// transaction. On any error the transaction is dropped uncommitted, which
/// rolls back every row already written for this record.
pub fn write_property(conn: &mut Connection, record: &PropertyRecord) -> Result<i64, StorageError> {
    let tx = conn
        .transaction()
        .map_err(|e| StorageError::new(PROPERTY, e))?;

    let property_id = insert_property(&tx, &record.core)?;
    insert_detail(&tx, property_id, &record.detail)?;

    if let Some(valuation) = &record.valuation {
        insert_valuation(&tx, property_id, valuation)?;
    }
    if let Some(hoa) = &record.hoa {
        insert_hoa(&tx, property_id, hoa)?;
    }
    if let Some(rehab) = &record.rehab {
        insert_rehab_estimate(&tx, property_id, rehab)?;
    }
    insert_attributes(&tx, property_id, &record.other_attributes)?;

    tx.commit().map_err(|e| StorageError::new(PROPERTY, e))?;
    debug!("Stored property {property_id}");
    Ok(property_id)
}

// Decimals go over the wire as their exact text; the DECIMAL columns store
// them with numeric affinity.
fn decimal_text(d: &Option<Decimal>) -> Option<String> {
    d.map(|d| d.to_string())
}

/// Inserts the `property` row and returns the identifier this very INSERT
/// generated.
fn insert_property(tx: &Connection, core: &PropertyCore) -> Result<i64, StorageError> {
    tx.query_row(
        r#"
        INSERT INTO property (
            external_id, address_line1, address_line2, city, state,
            postal_code, county, latitude, longitude
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING property_id
        "#,
        params![
            &core.external_id,
            &core.address_line1,
            &core.address_line2,
            &core.city,
            &core.state,
            &core.postal_code,
            &core.county,
            decimal_text(&core.latitude),
            decimal_text(&core.longitude),
        ],
        |row| row.get(0),
    )
    .map_err(|e| StorageError::new(PROPERTY, e))
}

fn insert_detail(
    tx: &Connection,
    property_id: i64,
    detail: &PropertyDetail,
) -> Result<(), StorageError> {
    tx.execute(
        r#"
        INSERT INTO property_detail (
            property_id, bedrooms, bathrooms, sqft, year_built, property_type, zoning
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
        "#,
        params![
            property_id,
            detail.bedrooms,
            decimal_text(&detail.bathrooms),
            detail.sqft,
            detail.year_built,
            &detail.property_type,
        ],
    )
    .map_err(|e| StorageError::new(PROPERTY_DETAIL, e))?;
    Ok(())
}

fn insert_valuation(
    tx: &Connection,
    property_id: i64,
    valuation: &Valuation,
) -> Result<(), StorageError> {
    // The column is a DATE; the time of day is not kept.
    let valuation_date = valuation.valuation_date.map(|dt| dt.date());

    tx.execute(
        r#"
        INSERT INTO valuation (
            property_id, valuation_source, valuation_amount, valuation_date, notes
        ) VALUES (?1, ?2, ?3, ?4, NULL)
        "#,
        params![
            property_id,
            &valuation.valuation_source,
            decimal_text(&valuation.valuation_amount),
            valuation_date,
        ],
    )
    .map_err(|e| StorageError::new(VALUATION, e))?;
    Ok(())
}

fn insert_hoa(tx: &Connection, property_id: i64, hoa: &HoaInfo) -> Result<(), StorageError> {
    tx.execute(
        r#"
        INSERT INTO hoa (
            property_id, has_hoa, hoa_name, hoa_fee_amount, hoa_fee_frequency
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            property_id,
            hoa.has_hoa,
            &hoa.hoa_name,
            decimal_text(&hoa.hoa_fee_amount),
            &hoa.hoa_fee_frequency,
        ],
    )
    .map_err(|e| StorageError::new(HOA, e))?;
    Ok(())
}

fn insert_rehab_estimate(
    tx: &Connection,
    property_id: i64,
    rehab: &RehabEstimate,
) -> Result<(), StorageError> {
    // Bound through rusqlite's serde_json support, stored as compact JSON text.
    let breakdown = rehab.breakdown.clone().map(Value::Object);

    tx.execute(
        r#"
        INSERT INTO rehab_estimate (
            property_id, estimate_total, estimate_breakdown, last_updated
        ) VALUES (?1, ?2, ?3, NULL)
        "#,
        params![property_id, decimal_text(&rehab.total), breakdown],
    )
    .map_err(|e| StorageError::new(REHAB_ESTIMATE, e))?;
    Ok(())
}

/// Text stored in `attr_value`: strings verbatim, numbers and booleans by
/// their JSON spelling, arrays and objects as compact JSON. `null` stays NULL.
pub fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn insert_attributes(
    tx: &Connection,
    property_id: i64,
    attributes: &Map<String, Value>,
) -> Result<(), StorageError> {
    if attributes.is_empty() {
        return Ok(());
    }

    let mut stmt = tx
        .prepare(
            r#"
            INSERT INTO property_attribute (property_id, attr_key, attr_value)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .map_err(|e| StorageError::new(PROPERTY_ATTRIBUTE, e))?;

    for (key, value) in attributes {
        stmt.execute(params![property_id, key, attribute_text(value)])
            .map_err(|e| StorageError::new(PROPERTY_ATTRIBUTE, e))?;
    }
    Ok(())
}
