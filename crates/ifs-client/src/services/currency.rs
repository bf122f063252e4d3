use log::debug;

use ifs_common::resources::currency::fetch_currency_info;
use ifs_common::resources::{CurrencyInfo, CurrencyInfoParams};

use super::first_record;
use crate::client::IfsClient;
use crate::error::ClientError;

/// Currency rate lookups via the `FetchCurrencyInfo` function.
#[derive(Debug, Clone)]
pub struct CurrencyInfoService {
    client: IfsClient,
}

impl CurrencyInfoService {
    /// Creates a service sharing `client`'s token.
    #[must_use]
    pub const fn new(client: IfsClient) -> Self {
        Self { client }
    }

    /// Looks up the currency rate for an invoice.
    ///
    /// Parameters travel in the function-call path, not the query string.
    ///
    /// # Errors
    ///
    /// See [`IfsClient::request`]; decoding failures are
    /// [`ClientError::InvalidResponse`].
    pub async fn fetch(&self, params: &CurrencyInfoParams) -> Result<CurrencyInfo, ClientError> {
        debug!(
            "Fetching currency info for {} {} on {}",
            params.company, params.trans_currency, params.invoice_date
        );
        let envelope = self.client.get(&fetch_currency_info(params), &[]).await?;
        first_record(envelope)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::services::test_support;

    #[tokio::test]
    async fn test_fetch_currency_info() {
        let server = MockServer::start().await;
        let client = test_support::client(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(
                r"^/v1/InstantInvoiceHandling\.svc/FetchCurrencyInfo\(Company='10',.*TransCurrency='EUR',.*InvoiceDate=2025-03-03,.*\)$",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "@odata.context": "$metadata#IfsApp.InstantInvoiceHandling.CurrencyInfoStructure",
                "CurrRate": "11.25",
                "TaxCurrRate": 11.25,
                "DivFactor": 1,
                "CurrencyType": "1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let params = CurrencyInfoParams::builder()
            .company("10")
            .identity("C1")
            .trans_currency("EUR")
            .invoice_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .build();

        let info = CurrencyInfoService::new(client).fetch(&params).await.unwrap();
        assert_eq!(info.curr_rate, Some(11.25));
        assert_eq!(info.div_factor, Some(1.0));
        assert_eq!(info.currency_type.as_deref(), Some("1"));
    }
}
