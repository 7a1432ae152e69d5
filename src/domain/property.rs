// src/domain/property.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::domain::coerce;
use crate::errors::ValidationError;
use crate::mapping::MappedRecord;

/// Identity and location. Always written as the `property` row.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct PropertyCore {
    pub external_id: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub county: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}

/// Physical detail. Always written, even when every field is empty.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct PropertyDetail {
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<Decimal>,
    pub sqft: Option<i64>,
    pub year_built: Option<i64>,
    pub property_type: Option<String>,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct HoaInfo {
    pub has_hoa: Option<bool>,
    pub hoa_name: Option<String>,
    pub hoa_fee_amount: Option<Decimal>,
    pub hoa_fee_frequency: Option<String>,
}

impl HoaInfo {
    fn is_empty(&self) -> bool {
        self.has_hoa.is_none()
            && self.hoa_name.is_none()
            && self.hoa_fee_amount.is_none()
            && self.hoa_fee_frequency.is_none()
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Valuation {
    pub valuation_source: Option<String>,
    pub valuation_amount: Option<Decimal>,
    pub valuation_date: Option<NaiveDateTime>,
}

impl Valuation {
    fn is_empty(&self) -> bool {
        self.valuation_source.is_none()
            && self.valuation_amount.is_none()
            && self.valuation_date.is_none()
    }
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct RehabEstimate {
    pub total: Option<Decimal>,
    pub breakdown: Option<Map<String, Value>>,
}

impl RehabEstimate {
    fn is_empty(&self) -> bool {
        self.total.is_none() && self.breakdown.is_none()
    }
}

/// One input line, validated and typed, ready for the fan-out insert.
///
/// The optional sub-entities are `Some` only when at least one of their
/// fields was present in the input, which is exactly when a row is written
/// for them.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct PropertyRecord {
    pub core: PropertyCore,
    pub detail: PropertyDetail,
    pub hoa: Option<HoaInfo>,
    pub valuation: Option<Valuation>,
    pub rehab: Option<RehabEstimate>,
    /// Every input field without a mapping rule, verbatim and in input order.
    pub other_attributes: Map<String, Value>,
}

impl PropertyRecord {
    /// Builds a typed record from the output of the field mapper.
    ///
    /// All-or-nothing: the first field that fails coercion rejects the whole
    /// record.
    pub fn build(record: MappedRecord) -> Result<Self, ValidationError> {
        Self::from_parts(&record.mapped, record.residual)
    }

    pub fn from_parts(
        mapped: &Map<String, Value>,
        residual: Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let mut core = PropertyCore::default();
        let mut detail = PropertyDetail::default();
        let mut hoa = HoaInfo::default();
        let mut valuation = Valuation::default();
        let mut rehab = RehabEstimate::default();

        for (column, value) in mapped {
            let f = column.as_str();
            match f {
                "external_id" => core.external_id = coerce::to_text(f, value)?,
                "address_line1" => core.address_line1 = coerce::to_text(f, value)?,
                "address_line2" => core.address_line2 = coerce::to_text(f, value)?,
                "city" => core.city = coerce::to_text(f, value)?,
                "state" => core.state = coerce::to_text(f, value)?,
                "postal_code" => {
                    core.postal_code = coerce::to_text(f, value)?.map(|s| s.trim().to_string())
                }
                "county" => core.county = coerce::to_text(f, value)?,
                "latitude" => core.latitude = in_range(f, coerce::to_decimal(f, value)?, 90)?,
                "longitude" => core.longitude = in_range(f, coerce::to_decimal(f, value)?, 180)?,

                "bedrooms" => detail.bedrooms = coerce::to_integer(f, value)?,
                "bathrooms" => detail.bathrooms = coerce::to_decimal(f, value)?,
                "sqft" => detail.sqft = coerce::to_integer(f, value)?,
                "year_built" => detail.year_built = coerce::to_integer(f, value)?,
                "property_type" => detail.property_type = coerce::to_text(f, value)?,

                "has_hoa" => hoa.has_hoa = coerce::to_boolean(f, value)?,
                "hoa_name" => hoa.hoa_name = coerce::to_text(f, value)?,
                "hoa_fee_amount" => hoa.hoa_fee_amount = coerce::to_decimal(f, value)?,
                "hoa_fee_frequency" => hoa.hoa_fee_frequency = coerce::to_text(f, value)?,

                "valuation_source" => valuation.valuation_source = coerce::to_text(f, value)?,
                "valuation_amount" => valuation.valuation_amount = coerce::to_decimal(f, value)?,
                "valuation_date" => valuation.valuation_date = coerce::to_datetime(f, value)?,

                "rehab_estimate_total" => rehab.total = coerce::to_decimal(f, value)?,
                "rehab_estimate_breakdown" => rehab.breakdown = coerce::to_json_object(f, value)?,

                // The mapping table only hands out known columns, so this is a
                // hand-built MappedRecord. Refuse rather than lose the value.
                _ => return Err(ValidationError::new(f, "no such target column")),
            }
        }

        Ok(PropertyRecord {
            core,
            detail,
            hoa: Some(hoa).filter(|h| !h.is_empty()),
            valuation: Some(valuation).filter(|v| !v.is_empty()),
            rehab: Some(rehab).filter(|r| !r.is_empty()),
            other_attributes: residual,
        })
    }
}

fn in_range(
    field: &str,
    value: Option<Decimal>,
    bound: i64,
) -> Result<Option<Decimal>, ValidationError> {
    match value {
        Some(v) if v.abs() > Decimal::from(bound) => Err(ValidationError::new(
            field,
            format!("{v} is outside [-{bound}, {bound}]"),
        )),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn builds_typed_fields_and_keeps_residual() {
        let mapped = map(json!({
            "address_line1": "12 Elm St",
            "postal_code": " 90210 ",
            "bedrooms": "3",
            "bathrooms": 2.5,
            "latitude": "34.0901",
        }));
        let residual = map(json!({"Unmapped_Field": "x", "Nested": {"a": [1, 2]}}));

        let record = PropertyRecord::from_parts(&mapped, residual.clone()).unwrap();

        assert_eq!(record.core.address_line1.as_deref(), Some("12 Elm St"));
        assert_eq!(record.core.postal_code.as_deref(), Some("90210"));
        assert_eq!(record.detail.bedrooms, Some(3));
        assert_eq!(record.detail.bathrooms, Some(Decimal::new(25, 1)));
        assert_eq!(record.core.latitude, Some(Decimal::new(340901, 4)));
        assert_eq!(record.other_attributes, residual);
    }

    #[test]
    fn optional_groups_only_exist_when_a_field_is_present() {
        let empty = PropertyRecord::from_parts(&Map::new(), Map::new()).unwrap();
        assert!(empty.hoa.is_none());
        assert!(empty.valuation.is_none());
        assert!(empty.rehab.is_none());
        assert_eq!(empty.detail, PropertyDetail::default());

        let mapped = map(json!({"has_hoa": "Y", "valuation_date": "2023-06-30"}));
        let record = PropertyRecord::from_parts(&mapped, Map::new()).unwrap();
        assert_eq!(record.hoa.unwrap().has_hoa, Some(true));
        assert!(record.valuation.unwrap().valuation_date.is_some());
        assert!(record.rehab.is_none());
    }

    #[test]
    fn null_fields_do_not_create_groups() {
        let mapped = map(json!({"hoa_name": null, "rehab_estimate_total": ""}));
        let record = PropertyRecord::from_parts(&mapped, Map::new()).unwrap();
        assert!(record.hoa.is_none());
        assert!(record.rehab.is_none());
    }

    #[test]
    fn one_bad_field_rejects_the_record() {
        let mapped = map(json!({
            "address_line1": "12 Elm St",
            "bedrooms": "three",
        }));
        let err = PropertyRecord::from_parts(&mapped, Map::new()).unwrap_err();
        assert_eq!(err.field, "bedrooms");
    }

    #[test]
    fn coordinates_must_be_on_the_globe() {
        let mapped = map(json!({"latitude": 91}));
        let err = PropertyRecord::from_parts(&mapped, Map::new()).unwrap_err();
        assert_eq!(err.field, "latitude");

        let mapped = map(json!({"longitude": "-180"}));
        assert!(PropertyRecord::from_parts(&mapped, Map::new()).is_ok());
    }

    #[test]
    fn every_catalog_column_is_accepted() {
        for attribute in crate::domain::schema::ATTRIBUTES {
            let mut mapped = Map::new();
            mapped.insert(attribute.column.to_string(), Value::Null);
            assert!(
                PropertyRecord::from_parts(&mapped, Map::new()).is_ok(),
                "{} has no typed field",
                attribute.column
            );
        }
    }

    #[test]
    fn unknown_target_column_is_rejected() {
        let mapped = map(json!({"zoning": "R1"}));
        let err = PropertyRecord::from_parts(&mapped, Map::new()).unwrap_err();
        assert_eq!(err.field, "zoning");
    }
}
