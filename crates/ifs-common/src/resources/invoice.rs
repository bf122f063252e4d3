//! Instant and customer-order invoices.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Resource;
use super::odata::{key_predicate, string_literal};
use crate::casts::{CastTable, FieldCast};

/// The two invoice projections exposed by IFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceKind {
    /// `InstantInvoiceHandling.svc`
    Instant,
    /// `CustomerOrderInvoiceHandling.svc`
    #[default]
    CustomerOrder,
}

impl InvoiceKind {
    /// Invoice header collection path.
    #[must_use]
    pub const fn head_collection(self) -> &'static str {
        match self {
            Self::Instant => "/InstantInvoiceHandling.svc/InstantInvoiceSet",
            Self::CustomerOrder => "/CustomerOrderInvoiceHandling.svc/CustomerOrderInvHeadSet",
        }
    }

    /// Path of a single invoice header.
    ///
    /// ```
    /// use ifs_common::resources::InvoiceKind;
    /// assert_eq!(
    ///     InvoiceKind::Instant.head("10", 42),
    ///     "/InstantInvoiceHandling.svc/InstantInvoiceSet(Company='10',InvoiceId=42)"
    /// );
    /// ```
    #[must_use]
    pub fn head(self, company: &str, invoice_id: i64) -> String {
        format!(
            "{}{}",
            self.head_collection(),
            key_predicate(&[
                ("Company", string_literal(company)),
                ("InvoiceId", invoice_id.to_string()),
            ])
        )
    }

    /// Path of the invoice lines belonging to one invoice.
    ///
    /// Instant invoices expose lines as a navigation property of the header.
    /// Customer-order invoice lines live in a separate set and are filtered
    /// by key; see [`InvoiceKind::line_filter`].
    #[must_use]
    pub fn lines(self, company: &str, invoice_id: i64) -> String {
        match self {
            Self::Instant => format!("{}/InvoiceItemArray", self.head(company, invoice_id)),
            Self::CustomerOrder => {
                "/CustomerOrderInvoiceHandling.svc/CustomerOrderInvLineSet".to_string()
            }
        }
    }

    /// `$filter` needed alongside [`InvoiceKind::lines`], if any.
    #[must_use]
    pub fn line_filter(self, company: &str, invoice_id: i64) -> Option<String> {
        match self {
            Self::Instant => None,
            Self::CustomerOrder => Some(format!(
                "Company eq {} and InvoiceId eq {invoice_id}",
                string_literal(company)
            )),
        }
    }
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant => write!(f, "instant"),
            Self::CustomerOrder => write!(f, "customer-order"),
        }
    }
}

impl FromStr for InvoiceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instant" => Ok(Self::Instant),
            "customer" | "customer-order" | "customer_order" => Ok(Self::CustomerOrder),
            _ => anyhow::bail!("unknown invoice kind: {s}"),
        }
    }
}

/// Party types accepted by the instant invoice projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartyType {
    /// A company.
    Company,
    /// A customer.
    #[default]
    Customer,
    /// A supplier.
    Supplier,
    /// A person.
    Person,
    /// A manufacturer.
    Manufacturer,
    /// An owner.
    Owner,
    /// A forwarding agent.
    ForwardingAgent,
    /// An employee.
    Employee,
}

impl PartyType {
    /// Fully-qualified OData enumeration type name.
    pub const ODATA_TYPE: &'static str = "IfsApp.InstantInvoiceHandling.PartyType";

    /// Member name as used by the projection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Customer => "Customer",
            Self::Supplier => "Supplier",
            Self::Person => "Person",
            Self::Manufacturer => "Manufacturer",
            Self::Owner => "Owner",
            Self::ForwardingAgent => "ForwardingAgent",
            Self::Employee => "Employee",
        }
    }
}

/// An instant invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantInvoice {
    /// Owning company.
    pub company: String,
    /// Invoice number within the company.
    #[serde(default)]
    pub invoice_id: Option<i64>,
    /// Customer or other party identity.
    #[serde(default)]
    pub identity: Option<String>,
    /// Kind of party the identity refers to.
    #[serde(default)]
    pub party_type: Option<PartyType>,
    /// Invoice date.
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Currency rate.
    #[serde(default)]
    pub curr_rate: Option<f64>,
    /// Tax currency rate.
    #[serde(default)]
    pub tax_curr_rate: Option<f64>,
    /// Invoice type code.
    #[serde(default)]
    pub invoice_type: Option<String>,
    /// Payment term.
    #[serde(default)]
    pub pay_term_id: Option<String>,
    /// User or integration that created the invoice.
    #[serde(default)]
    pub creator: Option<String>,
    /// Whether this is an advance invoice.
    #[serde(default)]
    pub adv_inv: Option<bool>,
    /// Whether the invoice was sent as an e-invoice.
    #[serde(default)]
    pub einvoice_sent: Option<bool>,
    /// Expanded invoice lines.
    #[serde(default)]
    pub invoice_item_array: Vec<InvoiceItem>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for InstantInvoice {
    const NAME: &'static str = "InstantInvoice";

    const FIELDS: CastTable = &[
        ("Company", FieldCast::String),
        ("InvoiceId", FieldCast::Number),
        ("Identity", FieldCast::String),
        ("PartyType", FieldCast::String),
        ("InvoiceDate", FieldCast::Date),
        ("DueDate", FieldCast::Date),
        ("Currency", FieldCast::String),
        ("CurrRate", FieldCast::Number),
        ("TaxCurrRate", FieldCast::Number),
        ("InvoiceType", FieldCast::String),
        ("PayTermId", FieldCast::String),
        ("Creator", FieldCast::String),
        ("AdvInv", FieldCast::Boolean),
        ("EinvoiceSent", FieldCast::Boolean),
        ("InvoiceItemArray", FieldCast::NestedList),
    ];
}

/// A customer-order invoice header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomerOrderInvoice {
    /// Owning company.
    pub company: String,
    /// Internal invoice identifier.
    #[serde(default)]
    pub invoice_id: Option<i64>,
    /// Printed invoice number.
    #[serde(default)]
    pub invoice_no: Option<String>,
    /// Customer identity.
    #[serde(default)]
    pub identity: Option<String>,
    /// Invoice date.
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Net amount in invoice currency.
    #[serde(default)]
    pub net_curr_amount: Option<f64>,
    /// VAT amount in invoice currency.
    #[serde(default)]
    pub vat_curr_amount: Option<f64>,
    /// Workflow state, e.g. `Preliminary` or `PostedAuth`.
    #[serde(default)]
    pub objstate: Option<String>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for CustomerOrderInvoice {
    const NAME: &'static str = "CustomerOrderInvoice";

    const FIELDS: CastTable = &[
        ("Company", FieldCast::String),
        ("InvoiceId", FieldCast::Number),
        ("InvoiceNo", FieldCast::String),
        ("Identity", FieldCast::String),
        ("InvoiceDate", FieldCast::Date),
        ("DueDate", FieldCast::Date),
        ("Currency", FieldCast::String),
        ("NetCurrAmount", FieldCast::Number),
        ("VatCurrAmount", FieldCast::Number),
        ("Objstate", FieldCast::String),
    ];
}

/// An invoice header record tied to one projection.
pub trait InvoiceRecord: Resource {
    /// Projection the record is read from.
    const KIND: InvoiceKind;
}

impl InvoiceRecord for InstantInvoice {
    const KIND: InvoiceKind = InvoiceKind::Instant;
}

impl InvoiceRecord for CustomerOrderInvoice {
    const KIND: InvoiceKind = InvoiceKind::CustomerOrder;
}

/// A single invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceItem {
    /// Owning company.
    #[serde(default)]
    pub company: Option<String>,
    /// Invoice the line belongs to.
    #[serde(default)]
    pub invoice_id: Option<i64>,
    /// Line number.
    #[serde(default)]
    pub item_id: Option<i64>,
    /// Line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Net amount in invoice currency.
    #[serde(default)]
    pub net_curr_amount: Option<f64>,
    /// VAT amount in invoice currency.
    #[serde(default)]
    pub vat_curr_amount: Option<f64>,
    /// Tax code.
    #[serde(default)]
    pub vat_code: Option<String>,
    /// Fields not declared above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for InvoiceItem {
    const NAME: &'static str = "InvoiceItem";

    const FIELDS: CastTable = &[
        ("Company", FieldCast::String),
        ("InvoiceId", FieldCast::Number),
        ("ItemId", FieldCast::Number),
        ("Description", FieldCast::String),
        ("NetCurrAmount", FieldCast::Number),
        ("VatCurrAmount", FieldCast::Number),
        ("VatCode", FieldCast::String),
    ];
}
