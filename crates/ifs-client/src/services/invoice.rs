use std::collections::BTreeMap;
use std::marker::PhantomData;

use log::info;
use reqwest::Method;
use serde::Serialize;

use ifs_common::Resource;
use ifs_common::resources::odata::string_literal;
use ifs_common::resources::{InvoiceItem, InvoiceRecord};

use super::{ListQuery, Listing, decode_listing, first_record};
use crate::client::{IfsClient, RequestOptions};
use crate::error::ClientError;

/// Invoice header and line access for one invoice projection.
///
/// The record type picks the projection:
///
/// ```no_run
/// use ifs_client::IfsClient;
/// use ifs_client::services::InvoiceService;
/// use ifs_common::resources::InstantInvoice;
///
/// # async fn run(client: IfsClient) -> Result<(), ifs_client::ClientError> {
/// let invoices = InvoiceService::<InstantInvoice>::new(client);
/// let invoice = invoices.find("10", 5001).await?;
/// println!("{} lines", invoice.invoice_item_array.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InvoiceService<T> {
    client: IfsClient,
    record: PhantomData<fn() -> T>,
}

impl<T> Clone for InvoiceService<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            record: PhantomData,
        }
    }
}

impl<T: InvoiceRecord> InvoiceService<T> {
    /// Creates a service sharing `client`'s token.
    #[must_use]
    pub const fn new(client: IfsClient) -> Self {
        Self {
            client,
            record: PhantomData,
        }
    }

    /// Fetches one invoice header.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`]; decoding failures are
    /// [`ClientError::InvalidResponse`].
    pub async fn find(&self, company: &str, invoice_id: i64) -> Result<T, ClientError> {
        let envelope = self
            .client
            .get(&T::KIND.head(company, invoice_id), &[])
            .await?;
        first_record(envelope)
    }

    /// Lists invoice headers.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn list(&self, query: &ListQuery) -> Result<Listing<T>, ClientError> {
        let options = RequestOptions::builder().query(query.to_pairs()).build();
        let envelope = self
            .client
            .request(Method::GET, T::KIND.head_collection(), options)
            .await?;
        decode_listing(envelope)
    }

    /// Lists the invoices of one party within a company.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn list_for_party(
        &self,
        company: &str,
        identity: &str,
        query: ListQuery,
    ) -> Result<Listing<T>, ClientError> {
        let query = query.and_filter(format!(
            "Company eq {} and Identity eq {}",
            string_literal(company),
            string_literal(identity)
        ));
        self.list(&query).await
    }

    /// Creates an invoice header and returns the stored record.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn create<B: Serialize + ?Sized>(&self, payload: &B) -> Result<T, ClientError> {
        let envelope = self
            .client
            .post(T::KIND.head_collection(), payload)
            .await?;
        let created = first_record(envelope)?;
        info!("Created IFS {}", T::NAME);
        Ok(created)
    }

    /// Applies a partial update to an invoice header.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        company: &str,
        invoice_id: i64,
        changes: &B,
    ) -> Result<T, ClientError> {
        let options = RequestOptions::builder()
            .body(serde_json::to_value(changes)?)
            .headers(BTreeMap::from([
                ("If-Match".to_string(), "*".to_string()),
                ("Prefer".to_string(), "return=representation".to_string()),
            ]))
            .build();
        let envelope = self
            .client
            .request(Method::PATCH, &T::KIND.head(company, invoice_id), options)
            .await?;
        first_record(envelope)
    }

    /// Deletes an invoice header.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn delete(&self, company: &str, invoice_id: i64) -> Result<(), ClientError> {
        let options = RequestOptions::builder()
            .headers(BTreeMap::from([("If-Match".to_string(), "*".to_string())]))
            .build();
        self.client
            .request(Method::DELETE, &T::KIND.head(company, invoice_id), options)
            .await?;
        info!("Deleted IFS {} {company}/{invoice_id}", T::NAME);
        Ok(())
    }

    /// Lists the lines of one invoice.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn lines(
        &self,
        company: &str,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceItem>, ClientError> {
        let query = T::KIND
            .line_filter(company, invoice_id)
            .map(|filter| vec![("$filter".to_string(), filter)])
            .unwrap_or_default();
        let options = RequestOptions::builder().query(query).build();
        let envelope = self
            .client
            .request(Method::GET, &T::KIND.lines(company, invoice_id), options)
            .await?;
        InvoiceItem::collection_from_value(envelope.into_data()).map_err(super::invalid_response)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ifs_common::resources::{CustomerOrderInvoice, InstantInvoice, PartyType};

    use super::*;
    use crate::services::test_support;

    #[tokio::test]
    async fn test_find_instant_invoice() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path(
                "/v1/InstantInvoiceHandling.svc/InstantInvoiceSet(Company='10',InvoiceId=5001)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Company": "10",
                "InvoiceId": 5001,
                "PartyType": "Customer",
                "InvoiceItemArray": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invoice = InvoiceService::<InstantInvoice>::new(client)
            .find("10", 5001)
            .await
            .unwrap();
        assert_eq!(invoice.invoice_id, Some(5001));
        assert_eq!(invoice.party_type, Some(PartyType::Customer));
        assert!(invoice.invoice_item_array.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_party_combines_filters() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomerOrderInvoiceHandling.svc/CustomerOrderInvHeadSet"))
            .and(query_param(
                "$filter",
                "(Objstate eq 'PostedAuth') and (Company eq '10' and Identity eq 'C''1')",
            ))
            .and(query_param("$top", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"Company": "10", "InvoiceId": "7", "InvoiceNo": "CO-7"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ListQuery::builder()
            .top(20)
            .filter("Objstate eq 'PostedAuth'")
            .build();
        let listing = InvoiceService::<CustomerOrderInvoice>::new(client)
            .list_for_party("10", "C'1", query)
            .await
            .unwrap();

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].invoice_id, Some(7));
        assert_eq!(listing.items[0].invoice_no.as_deref(), Some("CO-7"));
    }

    #[tokio::test]
    async fn test_instant_lines_use_navigation_path() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path(
                "/v1/InstantInvoiceHandling.svc/InstantInvoiceSet(Company='10',InvoiceId=1)/InvoiceItemArray",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"ItemId": 1, "NetCurrAmount": "99.5"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let lines = InvoiceService::<InstantInvoice>::new(client)
            .lines("10", 1)
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].net_curr_amount, Some(99.5));
    }

    #[tokio::test]
    async fn test_customer_order_lines_use_filter() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomerOrderInvoiceHandling.svc/CustomerOrderInvLineSet"))
            .and(query_param("$filter", "Company eq '10' and InvoiceId eq 7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let lines = InvoiceService::<CustomerOrderInvoice>::new(client)
            .lines("10", 7)
            .await
            .unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_delete_instant_invoice() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("POST"))
            .and(path("/v1/InstantInvoiceHandling.svc/InstantInvoiceSet"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "Company": "10",
                "InvoiceId": 42,
                "Identity": "C1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/v1/InstantInvoiceHandling.svc/InstantInvoiceSet(Company='10',InvoiceId=42)",
            ))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let service = InvoiceService::<InstantInvoice>::new(client);
        let created = service
            .create(&json!({"Company": "10", "Identity": "C1", "PartyType": "Customer"}))
            .await
            .unwrap();
        assert_eq!(created.invoice_id, Some(42));

        service.delete("10", 42).await.unwrap();
    }
}
