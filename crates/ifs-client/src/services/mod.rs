//! Typed services over [`IfsClient`](crate::IfsClient).
//!
//! Services build projection paths with the builders from
//! [`ifs_common::resources`], send them through the client and decode the
//! envelope's data into resource records.

use serde_json::Value;
use typed_builder::TypedBuilder;

use ifs_common::{Pagination, Resource, ResultEnvelope};

use crate::error::ClientError;

mod code_part;
mod currency;
mod customer;
mod invoice;
mod sales_object;

pub use code_part::CodePartService;
pub use currency::CurrencyInfoService;
pub use customer::CustomerService;
pub use invoice::InvoiceService;
pub use sales_object::SalesObjectService;

/// A page of records together with the pagination reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Pagination figures from the response's `meta` object.
    pub pagination: Pagination,
}

/// OData system query options for list calls.
///
/// Values are passed through verbatim; the server interprets them.
///
/// ```
/// use ifs_client::services::ListQuery;
///
/// let query = ListQuery::builder().top(10).filter("Country eq 'NO'").build();
/// assert_eq!(
///     query.to_pairs(),
///     vec![
///         ("$top".to_string(), "10".to_string()),
///         ("$filter".to_string(), "Country eq 'NO'".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, TypedBuilder)]
pub struct ListQuery {
    /// `$top`
    #[builder(default, setter(strip_option))]
    pub top: Option<u32>,
    /// `$skip`
    #[builder(default, setter(strip_option))]
    pub skip: Option<u32>,
    /// `$filter`
    #[builder(default, setter(strip_option, into))]
    pub filter: Option<String>,
    /// `$select`
    #[builder(default, setter(strip_option, into))]
    pub select: Option<String>,
    /// `$orderby`
    #[builder(default, setter(strip_option, into))]
    pub order_by: Option<String>,
}

impl ListQuery {
    /// Query pairs in a stable order, omitting unset options.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                pairs.push((name.to_string(), value));
            }
        };
        push("$top", self.top.map(|n| n.to_string()));
        push("$skip", self.skip.map(|n| n.to_string()));
        push("$filter", self.filter.clone());
        push("$select", self.select.clone());
        push("$orderby", self.order_by.clone());
        pairs
    }

    /// Adds `clause` to the filter, joined with `and`.
    #[must_use]
    pub fn and_filter(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        self.filter = Some(match self.filter.take() {
            Some(existing) => format!("({existing}) and ({clause})"),
            None => clause,
        });
        self
    }
}

pub(crate) fn decode_listing<T: Resource>(
    envelope: ResultEnvelope,
) -> Result<Listing<T>, ClientError> {
    let pagination = envelope.pagination();
    let items = T::collection_from_value(envelope.into_data()).map_err(invalid_response)?;
    Ok(Listing { items, pagination })
}

// A single-entity GET may still come back wrapped in `value`.
pub(crate) fn first_record<T: Resource>(envelope: ResultEnvelope) -> Result<T, ClientError> {
    match envelope.into_data() {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse(format!("No {} returned", T::NAME)))
            .and_then(|item| T::from_value(item).map_err(invalid_response)),
        other => T::from_value(other).map_err(invalid_response),
    }
}

pub(crate) fn invalid_response(e: anyhow::Error) -> ClientError {
    ClientError::InvalidResponse(format!("{e:#}"))
}


#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::BTreeMap;

    use serde_json::json;

    use ifs_common::normalize;
    use ifs_common::resources::Customer;

    use super::*;

    #[test]
    fn test_and_filter() {
        let query = ListQuery::builder()
            .filter("Country eq 'NO'")
            .build()
            .and_filter("OneTime eq false");
        assert_eq!(
            query.filter.as_deref(),
            Some("(Country eq 'NO') and (OneTime eq false)")
        );
        assert_eq!(
            ListQuery::default().and_filter("A eq 1").filter.as_deref(),
            Some("A eq 1")
        );
    }

    #[test]
    fn test_decode_listing_with_meta() {
        let envelope = normalize(
            json!({
                "value": [{"CustomerId": "C1"}, {"CustomerId": "C2"}],
                "meta": {"total": 2, "per_page": 50}
            }),
            BTreeMap::new(),
            200,
        );
        let listing: Listing<Customer> = decode_listing(envelope).unwrap();
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.pagination.total, 2);
        assert_eq!(listing.pagination.current_page, 1);
    }

    #[test]
    fn test_first_record_from_value_array() {
        let envelope = normalize(json!({"value": [{"CustomerId": "C1"}]}), BTreeMap::new(), 200);
        let customer: Customer = first_record(envelope).unwrap();
        assert_eq!(customer.customer_id, "C1");

        let empty = normalize(json!({"value": []}), BTreeMap::new(), 200);
        let err = first_record::<Customer>(empty).unwrap_err();
        assert!(err.to_string().contains("No Customer returned"));
    }

    #[test]
    fn test_cast_failure_is_invalid_response() {
        let envelope = normalize(
            json!({"CustomerId": "C1", "CreationDate": "yesterday"}),
            BTreeMap::new(),
            200,
        );
        let err = first_record::<Customer>(envelope).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
