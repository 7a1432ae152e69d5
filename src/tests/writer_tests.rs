use chrono::NaiveDate;
use rusqlite::params;
use rust_decimal::Decimal;
use serde_json::json;

use crate::db::properties::write_property;
use crate::domain::property::{HoaInfo, PropertyRecord, RehabEstimate, Valuation};
use crate::errors::StorageErrorKind;
use crate::tests::utils::{count, init_test_db, object, total_rows};

#[test]
fn minimal_record_writes_property_and_detail_only() {
    let mut db = init_test_db();

    let id = db.write_property(&PropertyRecord::default()).unwrap();

    assert_eq!(count(&mut db, "property", Some(id)), 1);
    assert_eq!(count(&mut db, "property_detail", Some(id)), 1);
    assert_eq!(count(&mut db, "valuation", Some(id)), 0);
    assert_eq!(count(&mut db, "hoa", Some(id)), 0);
    assert_eq!(count(&mut db, "rehab_estimate", Some(id)), 0);
    assert_eq!(count(&mut db, "property_attribute", Some(id)), 0);
}

#[test]
fn full_record_fans_out_to_every_table() {
    let mut db = init_test_db();

    let mut record = PropertyRecord::default();
    record.core.external_id = Some("EXT-1".into());
    record.core.postal_code = Some("90210".into());
    record.detail.bathrooms = Some(Decimal::new(25, 1));
    record.hoa = Some(HoaInfo {
        has_hoa: Some(true),
        hoa_fee_amount: Some(Decimal::new(12050, 2)),
        ..Default::default()
    });
    record.valuation = Some(Valuation {
        valuation_source: Some("AVM".into()),
        valuation_amount: Some(Decimal::from(450_000)),
        valuation_date: NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|d| d.and_hms_opt(13, 45, 0)),
    });
    record.rehab = Some(RehabEstimate {
        total: Some(Decimal::from(15_000)),
        breakdown: Some(object(json!({"roof": 10000, "paint": 5000}))),
    });
    record.other_attributes = object(json!({"Pool": true, "Tags": ["corner", "view"]}));

    let id = db.write_property(&record).unwrap();

    for table in ["property_detail", "valuation", "hoa", "rehab_estimate"] {
        assert_eq!(count(&mut db, table, Some(id)), 1, "{table}");
    }
    assert_eq!(count(&mut db, "property_attribute", Some(id)), 2);

    db.with_conn(|conn| {
        let (bathrooms, has_hoa, fee): (f64, bool, f64) = conn.query_row(
            "SELECT d.bathrooms, h.has_hoa, h.hoa_fee_amount
             FROM property_detail d JOIN hoa h ON h.property_id = d.property_id
             WHERE d.property_id = ?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        assert_eq!(bathrooms, 2.5);
        assert!(has_hoa);
        assert_eq!(fee, 120.5);

        let date: String = conn.query_row(
            "SELECT valuation_date FROM valuation WHERE property_id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        assert_eq!(date, "2024-05-17");
        let typed_date: NaiveDate = conn.query_row(
            "SELECT valuation_date FROM valuation WHERE property_id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        assert_eq!(typed_date, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap());

        let (kind, breakdown): (String, serde_json::Value) = conn.query_row(
            "SELECT typeof(estimate_breakdown), estimate_breakdown
             FROM rehab_estimate WHERE property_id = ?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        assert_eq!(kind, "text");
        assert_eq!(breakdown, json!({"roof": 10000, "paint": 5000}));

        let tags: String = conn.query_row(
            "SELECT attr_value FROM property_attribute WHERE property_id = ?1 AND attr_key = 'Tags'",
            params![id],
            |r| r.get(0),
        )?;
        assert_eq!(tags, r#"["corner","view"]"#);
        Ok::<_, rusqlite::Error>(())
    })
    .unwrap();
}

#[test]
fn identifiers_come_from_each_insert() {
    let mut db = init_test_db();

    let first = db.write_property(&PropertyRecord::default()).unwrap();
    let second = db.write_property(&PropertyRecord::default()).unwrap();
    assert_ne!(first, second);

    let stored: i64 = db
        .with_conn(|conn| {
            conn.query_row(
                "SELECT MAX(property_id) FROM property",
                [],
                |r| r.get(0),
            )
        })
        .unwrap();
    assert_eq!(stored, second);
}

#[test]
fn duplicate_external_id_rolls_back_everything() {
    let mut db = init_test_db();

    let mut record = PropertyRecord::default();
    record.core.external_id = Some("EXT-42".into());
    record.hoa = Some(HoaInfo {
        has_hoa: Some(false),
        ..Default::default()
    });
    record.other_attributes = object(json!({"Note": "first"}));

    db.write_property(&record).unwrap();
    let before = total_rows(&mut db);

    let err = db.write_property(&record).unwrap_err();
    assert_eq!(err.table, "property");
    match &err.kind {
        StorageErrorKind::Constraint(detail) => assert!(
            detail.contains("property.external_id"),
            "unexpected detail: {detail}"
        ),
        other => panic!("expected a constraint violation, got {other:?}"),
    }
    assert_eq!(total_rows(&mut db), before);
}

#[test]
fn failure_midway_leaves_no_orphan_property() {
    let mut db = init_test_db();

    // Break one child table so the fan-out fails after `property` is written.
    db.with_conn(|conn| conn.execute_batch("DROP TABLE property_attribute"))
        .unwrap();

    let mut record = PropertyRecord::default();
    record.core.address_line1 = Some("1 Orphan Way".into());
    record.other_attributes = object(json!({"Anything": 1}));

    let err = db
        .with_conn(|conn| write_property(conn, &record))
        .unwrap_err();
    assert_eq!(err.table, "property_attribute");
    assert_eq!(count(&mut db, "property", None), 0);
    assert_eq!(count(&mut db, "property_detail", None), 0);
}
