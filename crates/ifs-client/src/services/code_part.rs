use log::{info, warn};
use reqwest::Method;

use ifs_common::resources::CodePartValue;
use ifs_common::resources::code_part::{VESSEL_FILTER, VESSEL_SELECT, vessels};

use super::{ListQuery, Listing, decode_listing, first_record};
use crate::client::{IfsClient, RequestOptions};
use crate::error::ClientError;

/// Vessel code part values over `CodePartValuesHandling.svc`.
#[derive(Debug, Clone)]
pub struct CodePartService {
    client: IfsClient,
}

impl CodePartService {
    /// Creates a service sharing `client`'s token.
    #[must_use]
    pub const fn new(client: IfsClient) -> Self {
        Self { client }
    }

    /// Registers a vessel as a code part value of its company.
    ///
    /// IFS answers a successful creation with `201 Created`; any other
    /// success status is treated as an unexpected response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidResponse`] if the status is not 201 or
    /// the returned record does not decode, plus the errors of
    /// [`IfsClient::request`].
    pub async fn create_vessel(&self, vessel: &CodePartValue) -> Result<CodePartValue, ClientError> {
        let company = vessel.company.as_deref().ok_or_else(|| {
            ClientError::InvalidResponse("vessel payload has no Company".to_string())
        })?;

        let envelope = self.client.post(&vessels(company), vessel).await?;
        if envelope.status_code() != 201 {
            warn!(
                "Vessel creation returned status {} instead of 201",
                envelope.status_code()
            );
            return Err(ClientError::InvalidResponse(format!(
                "expected 201 Created for vessel, got {}",
                envelope.status_code()
            )));
        }

        let created: CodePartValue = first_record(envelope)?;
        info!(
            "Created vessel {} for company {company}",
            created.code_i.as_deref().unwrap_or_default()
        );
        Ok(created)
    }

    /// Lists the vessels of a company.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`].
    pub async fn list_vessels(
        &self,
        company: &str,
        top: Option<u32>,
    ) -> Result<Listing<CodePartValue>, ClientError> {
        let mut query = ListQuery::builder()
            .filter(VESSEL_FILTER)
            .select(VESSEL_SELECT)
            .build();
        query.top = top;

        let options = RequestOptions::builder().query(query.to_pairs()).build();
        let envelope = self
            .client
            .request(Method::GET, &vessels(company), options)
            .await?;
        decode_listing(envelope)
    }
}
