//! Code part values (`CodePartValuesHandling.svc`).
//!
//! Vessels are modelled in IFS as values of code part `I`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;
use super::odata::{key_predicate, string_literal};
use crate::casts::{CastTable, FieldCast};

/// Code part letter used for vessels.
pub const VESSEL_CODE_PART: &str = "I";

/// `$filter` selecting vessel values.
pub const VESSEL_FILTER: &str = "CodePart eq 'VESSEL'";

/// `$select` used when listing vessels.
pub const VESSEL_SELECT: &str = "CodeValue,Description";

/// Path of the vessel code part values of one company.
///
/// ```
/// use ifs_common::resources::code_part;
/// assert_eq!(
///     code_part::vessels("10"),
///     "/CodePartValuesHandling.svc/CompanyFinanceSet(Company='10')/CodeIArray"
/// );
/// ```
#[must_use]
pub fn vessels(company: &str) -> String {
    format!(
        "/CodePartValuesHandling.svc/CompanyFinanceSet{}/CodeIArray",
        key_predicate(&[("Company", string_literal(company))])
    )
}

/// A code part value, e.g. a vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CodePartValue {
    /// Owning company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Code part letter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_part: Option<String>,
    /// The value itself, e.g. the vessel name.
    #[serde(default, rename = "CodeI", skip_serializing_if = "Option::is_none")]
    pub code_i: Option<String>,
    /// Value returned by list queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_value: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First valid date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    /// Last valid date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,
    /// Whether the value is a budget value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_value_db: Option<bool>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodePartValue {
    /// A new vessel value for creation.
    #[must_use]
    pub fn vessel(
        company: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        valid_from: NaiveDate,
        valid_until: NaiveDate,
    ) -> Self {
        Self {
            company: Some(company.into()),
            code_part: Some(VESSEL_CODE_PART.to_string()),
            code_i: Some(name.into()),
            code_value: None,
            description: Some(description.into()),
            valid_from: Some(valid_from),
            valid_until: Some(valid_until),
            budget_value_db: Some(false),
            extra: Map::new(),
        }
    }
}

impl Resource for CodePartValue {
    const NAME: &'static str = "CodePartValue";

    const FIELDS: CastTable = &[
        ("Company", FieldCast::String),
        ("CodePart", FieldCast::String),
        ("CodeI", FieldCast::String),
        ("CodeValue", FieldCast::String),
        ("Description", FieldCast::String),
        ("ValidFrom", FieldCast::Date),
        ("ValidUntil", FieldCast::Date),
        ("BudgetValueDb", FieldCast::Boolean),
    ];
}
