use log::info;
use reqwest::Method;

use ifs_common::resources::SalesObject;
use ifs_common::resources::sales_object::{COLLECTION, company_filter};

use super::{ListQuery, Listing, decode_listing};
use crate::client::{IfsClient, RequestOptions};
use crate::error::ClientError;

/// Read access to `SalesObjectsHandling.svc`.
#[derive(Debug, Clone)]
pub struct SalesObjectService {
    client: IfsClient,
}

impl SalesObjectService {
    /// Creates a service sharing `client`'s token.
    #[must_use]
    pub const fn new(client: IfsClient) -> Self {
        Self { client }
    }

    /// Lists the sales objects of `company`.
    ///
    /// The company clause is combined with any filter already in `query`.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`]; decoding failures are
    /// [`ClientError::InvalidResponse`].
    pub async fn list(
        &self,
        company: &str,
        query: ListQuery,
    ) -> Result<Listing<SalesObject>, ClientError> {
        info!("Fetching sales objects for company {company}");
        let query = query.and_filter(company_filter(company));
        let options = RequestOptions::builder().query(query.to_pairs()).build();
        let envelope = self.client.request(Method::GET, COLLECTION, options).await?;
        let listing = decode_listing(envelope)?;
        info!("Fetched {} sales objects", listing.items.len());
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;
    use crate::services::test_support;

    const SALES_OBJECTS: &str = "/v1/SalesObjectsHandling.svc/SalesObjectSet";

    #[tokio::test]
    async fn test_list_sales_objects_for_company() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path(SALES_OBJECTS))
            .and(query_param("$filter", "Company eq '10'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {"ObjectId": "PILOT", "Taxable": "TRUE", "Price": "2500", "CodeA": "400100"},
                    {"ObjectId": "BERTH", "Price": 120}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let listing = SalesObjectService::new(client)
            .list("10", ListQuery::default())
            .await
            .unwrap();

        assert_eq!(listing.items.len(), 2);
        assert!(listing.items[0].is_taxable());
        assert_eq!(listing.items[0].price, Some(2500.0));
        assert!(!listing.items[1].is_taxable());
    }

    #[tokio::test]
    async fn test_list_combines_caller_filter() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path(SALES_OBJECTS))
            .and(query_param("$filter", "(Taxable eq true) and (Company eq '10')"))
            .and(query_param("$top", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .expect(1)
            .mount(&server)
            .await;

        let query = ListQuery::builder().top(5).filter("Taxable eq true").build();
        let listing = SalesObjectService::new(client).list("10", query).await.unwrap();
        assert!(listing.items.is_empty());
    }

    #[tokio::test]
    async fn test_list_failure_is_request_failed() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path(SALES_OBJECTS))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"message": "no access to company 99"}
            })))
            .mount(&server)
            .await;

        let err = SalesObjectService::new(client)
            .list("99", ListQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestFailed);
        assert_eq!(err.http_status(), 403);
    }
}
