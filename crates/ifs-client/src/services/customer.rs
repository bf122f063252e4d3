use std::collections::BTreeMap;

use log::info;
use reqwest::Method;
use serde::Serialize;

use ifs_common::resources::{Customer, customer};

use super::{ListQuery, Listing, decode_listing, first_record};
use crate::client::{IfsClient, RequestOptions};
use crate::error::ClientError;

/// Customer CRUD over `CustomersHandling.svc`.
#[derive(Debug, Clone)]
pub struct CustomerService {
    client: IfsClient,
}

impl CustomerService {
    /// Creates a service sharing `client`'s token.
    #[must_use]
    pub const fn new(client: IfsClient) -> Self {
        Self { client }
    }

    /// Fetches one customer by id.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] with status 404 for unknown
    /// ids, or [`ClientError::InvalidResponse`] if the record does not
    /// decode.
    pub async fn find(&self, customer_id: &str) -> Result<Customer, ClientError> {
        let envelope = self.client.get(&customer::item(customer_id), &[]).await?;
        first_record(envelope)
    }

    /// Lists customers.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`]; decoding failures are
    /// [`ClientError::InvalidResponse`].
    pub async fn list(&self, query: &ListQuery) -> Result<Listing<Customer>, ClientError> {
        let options = RequestOptions::builder().query(query.to_pairs()).build();
        let envelope = self
            .client
            .request(Method::GET, customer::COLLECTION, options)
            .await?;
        decode_listing(envelope)
    }

    /// Creates a customer and returns the stored record.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn create<B: Serialize + ?Sized>(&self, payload: &B) -> Result<Customer, ClientError> {
        let envelope = self.client.post(customer::COLLECTION, payload).await?;
        let created: Customer = first_record(envelope)?;
        info!("Created IFS customer {}", created.customer_id);
        Ok(created)
    }

    /// Applies a partial update and returns the updated record.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        customer_id: &str,
        changes: &B,
    ) -> Result<Customer, ClientError> {
        let options = RequestOptions::builder()
            .body(serde_json::to_value(changes)?)
            .headers(BTreeMap::from([
                ("If-Match".to_string(), "*".to_string()),
                ("Prefer".to_string(), "return=representation".to_string()),
            ]))
            .build();
        let envelope = self
            .client
            .request(Method::PATCH, &customer::item(customer_id), options)
            .await?;
        first_record(envelope)
    }

    /// Deletes a customer.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn delete(&self, customer_id: &str) -> Result<(), ClientError> {
        let options = RequestOptions::builder()
            .headers(BTreeMap::from([("If-Match".to_string(), "*".to_string())]))
            .build();
        self.client
            .request(Method::DELETE, &customer::item(customer_id), options)
            .await?;
        info!("Deleted IFS customer {customer_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;
    use crate::services::test_support;

    #[tokio::test]
    async fn test_find_customer() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomersHandling.svc/CustomerInfoSet(CustomerId='C1')"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "@odata.etag": "W/\"1\"",
                "CustomerId": "C1",
                "Name": "Acme Shipping",
                "CreationDate": "2024-02-01T00:00:00Z",
                "OneTime": "FALSE"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let customer = CustomerService::new(client).find("C1").await.unwrap();
        assert_eq!(customer.name.as_deref(), Some("Acme Shipping"));
        assert_eq!(customer.creation_date, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(customer.one_time, Some(false));
    }

    #[tokio::test]
    async fn test_find_encodes_reserved_characters_in_key() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomersHandling.svc/CustomerInfoSet(CustomerId='A%231')"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"CustomerId": "A#1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomersHandling.svc/CustomerInfoSet(CustomerId='A%3Fx=1')"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"CustomerId": "A?x=1"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = CustomerService::new(client);
        assert_eq!(service.find("A#1").await.unwrap().customer_id, "A#1");
        assert_eq!(service.find("A?x=1").await.unwrap().customer_id, "A?x=1");
    }

    #[tokio::test]
    async fn test_find_missing_customer() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": "DATABASE_ERROR", "message": "not found"}
            })))
            .mount(&server)
            .await;

        let err = CustomerService::new(client).find("NOPE").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestFailed);
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.to_string(), "API request failed (HTTP 404)");
    }

    #[tokio::test]
    async fn test_list_customers() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path("/v1/CustomersHandling.svc/CustomerInfoSet"))
            .and(query_param("$top", "2"))
            .and(query_param("$select", "CustomerId,Name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"CustomerId": "C1", "Name": "Acme"},
                    {"CustomerId": "C2", "Name": "Globex"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ListQuery::builder().top(2).select("CustomerId,Name").build();
        let listing = CustomerService::new(client).list(&query).await.unwrap();

        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[1].customer_id, "C2");
        assert_eq!(listing.pagination, ifs_common::Pagination::default());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        let item = "/v1/CustomersHandling.svc/CustomerInfoSet(CustomerId='C9')";

        Mock::given(method("POST"))
            .and(path("/v1/CustomersHandling.svc/CustomerInfoSet"))
            .and(body_json(json!({"CustomerId": "C9", "Name": "Initech"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"CustomerId": "C9", "Name": "Initech"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(item))
            .and(header("if-match", "*"))
            .and(body_json(json!({"Name": "Initrode"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"CustomerId": "C9", "Name": "Initrode"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(item))
            .and(header("if-match", "*"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let service = CustomerService::new(client);
        let created = service
            .create(&json!({"CustomerId": "C9", "Name": "Initech"}))
            .await
            .unwrap();
        assert_eq!(created.customer_id, "C9");

        let updated = service
            .update("C9", &json!({"Name": "Initrode"}))
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Initrode"));

        service.delete("C9").await.unwrap();
    }
}
