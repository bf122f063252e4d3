//! Typed IFS resource records and path builders.
//!
//! Each resource module exposes the record type(s) it deserializes into and
//! small functions that build the projection paths for it. Key values are
//! rendered as OData literals and percent-encoded so callers never splice
//! raw strings into a path.

use anyhow::{Context, Result};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::casts::{CastTable, cast_fields};

pub mod code_part;
pub mod currency;
pub mod customer;
pub mod invoice;
pub mod sales_object;

pub use code_part::CodePartValue;
pub use currency::{CurrencyInfo, CurrencyInfoParams};
pub use customer::Customer;
pub use invoice::{
    CustomerOrderInvoice, InstantInvoice, InvoiceItem, InvoiceKind, InvoiceRecord, PartyType,
};
pub use sales_object::SalesObject;

/// A record returned by an IFS projection.
///
/// Implementors declare a cast table; [`Resource::from_value`] applies it and
/// then deserializes. Fields not in the table are logged at debug level and
/// kept by the record's flattened `extra` map.
pub trait Resource: DeserializeOwned {
    /// Human-readable name used in log and error messages.
    const NAME: &'static str;

    /// Declared casts for the record's known fields.
    const FIELDS: CastTable;

    /// Casts and deserializes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object, a cast fails, or the
    /// result does not deserialize.
    fn from_value(value: Value) -> Result<Self> {
        let mut record = match value {
            Value::Object(record) => record,
            other => anyhow::bail!("{} record must be a JSON object, got {other}", Self::NAME),
        };

        let unknown = cast_fields(&mut record, Self::FIELDS)
            .with_context(|| format!("Failed to cast {} record", Self::NAME))?;
        if !unknown.is_empty() {
            debug!("{} record has undeclared fields: {}", Self::NAME, unknown.join(", "));
        }

        serde_json::from_value(Value::Object(record))
            .with_context(|| format!("Failed to deserialize {} record", Self::NAME))
    }

    /// Casts and deserializes a list of records.
    ///
    /// `null` is treated as an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a list or any element fails.
    fn collection_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            other => anyhow::bail!("{} collection must be a JSON array, got {other}", Self::NAME),
        }
    }
}

/// OData literal rendering for keys and function parameters.
pub mod odata {
    use chrono::NaiveDate;
    use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

    /// Bytes escaped when a literal is placed in a path segment. Quotes,
    /// `=`, `,` and parentheses are OData syntax and stay as they are.
    const PATH_LITERAL: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'#')
        .add(b'%')
        .add(b'&')
        .add(b'+')
        .add(b'/')
        .add(b'<')
        .add(b'>')
        .add(b'?')
        .add(b'[')
        .add(b'\\')
        .add(b']')
        .add(b'^')
        .add(b'`')
        .add(b'{')
        .add(b'|')
        .add(b'}');

    /// Renders a string literal, doubling embedded single quotes.
    ///
    /// ```
    /// use ifs_common::resources::odata::string_literal;
    /// assert_eq!(string_literal("O'Brien"), "'O''Brien'");
    /// ```
    #[must_use]
    pub fn string_literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Renders an enumeration literal such as
    /// `IfsApp.InstantInvoiceHandling.PartyType'Customer'`.
    #[must_use]
    pub fn enum_literal(type_name: &str, member: &str) -> String {
        format!("{type_name}{}", string_literal(member))
    }

    /// Renders a date literal (`YYYY-MM-DD`, unquoted).
    #[must_use]
    pub fn date_literal(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Percent-encodes a rendered literal for use inside a path segment.
    ///
    /// ```
    /// use ifs_common::resources::odata::{path_literal, string_literal};
    /// assert_eq!(path_literal(&string_literal("A#1")), "'A%231'");
    /// ```
    #[must_use]
    pub fn path_literal(literal: &str) -> String {
        utf8_percent_encode(literal, PATH_LITERAL).to_string()
    }

    /// Renders a key predicate like `(Company='10',InvoiceId=42)`.
    ///
    /// Function parameter lists share the same shape. Each literal passes
    /// through [`path_literal`].
    #[must_use]
    pub fn key_predicate(parts: &[(&str, String)]) -> String {
        let inner = parts
            .iter()
            .map(|(name, literal)| format!("{name}={}", path_literal(literal)))
            .collect::<Vec<_>>()
            .join(",");
        format!("({inner})")
    }
}
