//! Sales objects (`SalesObjectsHandling.svc`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;
use super::odata::string_literal;
use crate::casts::{CastTable, FieldCast};

/// Sales object collection path.
pub const COLLECTION: &str = "/SalesObjectsHandling.svc/SalesObjectSet";

/// `$filter` restricting sales objects to one company.
///
/// ```
/// use ifs_common::resources::sales_object;
/// assert_eq!(sales_object::company_filter("10"), "Company eq '10'");
/// ```
#[must_use]
pub fn company_filter(company: &str) -> String {
    format!("Company eq {}", string_literal(company))
}

/// A billable sales object with its tax and account settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesObject {
    /// Sales object code.
    pub object_id: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether tax applies; absent means no.
    #[serde(default)]
    pub taxable: Option<bool>,
    #[serde(default)]
    pub tax_code: Option<String>,
    /// Unit price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Account (code part `A`).
    #[serde(default)]
    pub code_a: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SalesObject {
    /// Whether tax applies to this object.
    #[must_use]
    pub fn is_taxable(&self) -> bool {
        self.taxable.unwrap_or(false)
    }
}

impl Resource for SalesObject {
    const NAME: &'static str = "SalesObject";

    const FIELDS: CastTable = &[
        ("ObjectId", FieldCast::String),
        ("Description", FieldCast::String),
        ("Taxable", FieldCast::Boolean),
        ("TaxCode", FieldCast::String),
        ("Price", FieldCast::Number),
        ("CodeA", FieldCast::String),
        ("Company", FieldCast::String),
        ("UnitOfMeasure", FieldCast::String),
    ];
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_sales_object_from_odata_record() {
        let object = SalesObject::from_value(json!({
            "@odata.etag": "W/\"1\"",
            "ObjectId": 4010,
            "Description": "Pilotage",
            "Taxable": "TRUE",
            "TaxCode": "VAT16",
            "Price": "2500.50",
            "CodeA": 400_100,
            "Company": "10",
            "UnitOfMeasure": "pcs",
            "SalesUnitMeas": "pcs"
        }))
        .unwrap();

        assert_eq!(object.object_id, "4010");
        assert!(object.is_taxable());
        assert_eq!(object.price, Some(2500.5));
        assert_eq!(object.code_a.as_deref(), Some("400100"));
        assert_eq!(object.extra.get("SalesUnitMeas"), Some(&json!("pcs")));
    }

    #[test]
    fn test_taxable_defaults_to_false() {
        let object =
            SalesObject::from_value(json!({"ObjectId": "X", "Taxable": null})).unwrap();
        assert!(!object.is_taxable());
        assert_eq!(object.price, None);
    }

    #[test]
    fn test_company_filter_escapes_quotes() {
        assert_eq!(company_filter("O'Co"), "Company eq 'O''Co'");
    }
}
