// src/domain/schema.rs

//! The destination tables and every typed attribute a mapping rule may target.

pub const PROPERTY: &str = "property";
pub const PROPERTY_DETAIL: &str = "property_detail";
pub const VALUATION: &str = "valuation";
pub const HOA: &str = "hoa";
pub const REHAB_ESTIMATE: &str = "rehab_estimate";
pub const PROPERTY_ATTRIBUTE: &str = "property_attribute";

#[derive(Debug, PartialEq, Eq)]
pub struct Attribute {
    pub column: &'static str,
    pub table: &'static str,
}

const fn attr(column: &'static str, table: &'static str) -> Attribute {
    Attribute { column, table }
}

pub static ATTRIBUTES: &[Attribute] = &[
    // identity / location
    attr("external_id", PROPERTY),
    attr("address_line1", PROPERTY),
    attr("address_line2", PROPERTY),
    attr("city", PROPERTY),
    attr("state", PROPERTY),
    attr("postal_code", PROPERTY),
    attr("county", PROPERTY),
    attr("latitude", PROPERTY),
    attr("longitude", PROPERTY),
    // physical detail
    attr("bedrooms", PROPERTY_DETAIL),
    attr("bathrooms", PROPERTY_DETAIL),
    attr("sqft", PROPERTY_DETAIL),
    attr("year_built", PROPERTY_DETAIL),
    attr("property_type", PROPERTY_DETAIL),
    // hoa
    attr("has_hoa", HOA),
    attr("hoa_name", HOA),
    attr("hoa_fee_amount", HOA),
    attr("hoa_fee_frequency", HOA),
    // valuation
    attr("valuation_source", VALUATION),
    attr("valuation_amount", VALUATION),
    attr("valuation_date", VALUATION),
    // rehab estimate
    attr("rehab_estimate_total", REHAB_ESTIMATE),
    attr("rehab_estimate_breakdown", REHAB_ESTIMATE),
];

/// Looks up a typed attribute by column name, ignoring ASCII case.
pub fn find_attribute(column: &str) -> Option<&'static Attribute> {
    ATTRIBUTES
        .iter()
        .find(|a| a.column.eq_ignore_ascii_case(column))
}
