//! Customers (`CustomersHandling.svc`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;
use super::odata::{key_predicate, string_literal};
use crate::casts::{CastTable, FieldCast};

/// Customer collection path.
pub const COLLECTION: &str = "/CustomersHandling.svc/CustomerInfoSet";

/// Path of a single customer.
///
/// ```
/// use ifs_common::resources::customer;
/// assert_eq!(
///     customer::item("C-1"),
///     "/CustomersHandling.svc/CustomerInfoSet(CustomerId='C-1')"
/// );
/// ```
#[must_use]
pub fn item(customer_id: &str) -> String {
    format!(
        "{COLLECTION}{}",
        key_predicate(&[("CustomerId", string_literal(customer_id))])
    )
}

/// A customer as returned by `CustomerInfoSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    /// Customer identifier.
    pub customer_id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Date the customer was created.
    #[serde(default)]
    pub creation_date: Option<NaiveDate>,
    /// Party type, usually `Customer`.
    #[serde(default)]
    pub party: Option<String>,
    /// Two-letter country code.
    #[serde(default)]
    pub country: Option<String>,
    /// Customer category.
    #[serde(default)]
    pub customer_category: Option<String>,
    /// Whether the default domain applies.
    #[serde(default)]
    pub default_domain: Option<bool>,
    /// Whether this is a one-time customer.
    #[serde(default)]
    pub one_time: Option<bool>,
    /// Whether the customer is a business.
    #[serde(default, rename = "B2bCustomer")]
    pub b2b_customer: Option<bool>,
    /// Whether a valid data processing purpose is registered.
    #[serde(default)]
    pub valid_data_processing_purpose: Option<bool>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Customer {
    const NAME: &'static str = "Customer";

    const FIELDS: CastTable = &[
        ("CustomerId", FieldCast::String),
        ("Name", FieldCast::String),
        ("CreationDate", FieldCast::Date),
        ("Party", FieldCast::String),
        ("Country", FieldCast::String),
        ("CustomerCategory", FieldCast::String),
        ("DefaultDomain", FieldCast::Boolean),
        ("OneTime", FieldCast::Boolean),
        ("B2bCustomer", FieldCast::Boolean),
        ("ValidDataProcessingPurpose", FieldCast::Boolean),
    ];
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_customer_from_odata_record() {
        let customer = Customer::from_value(json!({
            "@odata.etag": "W/\"Vy8iQUFBU...\"",
            "CustomerId": 1001,
            "Name": "Bulkstream Ltd",
            "CreationDate": "2024-02-01T00:00:00Z",
            "Country": "KE",
            "DefaultDomain": "TRUE",
            "OneTime": false,
            "B2bCustomer": "1",
            "AssociationNo": "A-7"
        }))
        .unwrap();

        assert_eq!(customer.customer_id, "1001");
        assert_eq!(customer.name.as_deref(), Some("Bulkstream Ltd"));
        assert_eq!(
            customer.creation_date,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(customer.default_domain, Some(true));
        assert_eq!(customer.one_time, Some(false));
        assert_eq!(customer.b2b_customer, Some(true));
        assert_eq!(customer.valid_data_processing_purpose, None);
        assert_eq!(customer.extra.get("AssociationNo"), Some(&json!("A-7")));
    }

    #[test]
    fn test_customer_requires_id() {
        assert!(Customer::from_value(json!({"Name": "No Id"})).is_err());
    }

    #[test]
    fn test_item_escapes_quotes() {
        assert_eq!(
            item("O'NEIL"),
            "/CustomersHandling.svc/CustomerInfoSet(CustomerId='O''NEIL')"
        );
    }

    #[test]
    fn test_item_encodes_fragment_and_query_markers() {
        assert_eq!(
            item("A#1"),
            "/CustomersHandling.svc/CustomerInfoSet(CustomerId='A%231')"
        );
        assert_eq!(
            item("A?x=1"),
            "/CustomersHandling.svc/CustomerInfoSet(CustomerId='A%3Fx=1')"
        );
    }
}
