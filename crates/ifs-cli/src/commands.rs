//! Command implementations for the CLI.

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use log::{debug, info};
use serde_json::Value;

use ifs_client::services::{CustomerService, ListQuery, SalesObjectService};
use ifs_client::{IfsClient, Method, RequestOptions};

use crate::display::{display_envelope, display_pagination};

/// Acquires a token and prints its expiry. The token itself is never shown.
pub async fn token(client: &IfsClient) -> Result<()> {
    let manager = client.token_manager();
    debug!("Requesting a token for {manager:?}");
    manager.token().await?;

    let token = manager
        .current()
        .await
        .context("token manager holds no token after a successful fetch")?;
    let remaining = token.expires_at - Utc::now();
    println!(
        "{} token valid until {} ({} min)",
        "✓".bright_green(),
        token.expires_at.to_rfc3339(),
        remaining.num_minutes()
    );
    Ok(())
}

/// Sends a GET request and prints the envelope.
pub async fn get(client: &IfsClient, path: &str, query: Vec<(String, String)>) -> Result<()> {
    debug!("GET {path} with {} query parameter(s)", query.len());
    let options = RequestOptions::builder().query(query).build();
    let envelope = client.request(Method::GET, path, options).await?;
    display_envelope(&envelope)
}

/// Sends a POST request and prints the envelope.
pub async fn post(client: &IfsClient, path: &str, body: &str) -> Result<()> {
    let body: Value = serde_json::from_str(body).context("--body must be valid JSON")?;
    debug!("POST {path}");
    let envelope = client.post(path, &body).await?;
    display_envelope(&envelope)
}

/// Sends a DELETE request and prints the envelope.
pub async fn delete(client: &IfsClient, path: &str) -> Result<()> {
    info!("Deleting {path}");
    let envelope = client.delete(path).await?;
    display_envelope(&envelope)
}

/// Lists customers as a table.
pub async fn customers(client: &IfsClient, top: u32, filter: Option<String>) -> Result<()> {
    let mut query = ListQuery::builder()
        .top(top)
        .select("CustomerId,Name,Country,CreationDate")
        .build();
    query.filter = filter;

    debug!("Listing customers with {query:?}");
    let listing = CustomerService::new(client.clone()).list(&query).await?;
    for customer in &listing.items {
        println!(
            "{:<12} {:<40} {:<4} {}",
            customer.customer_id.bright_cyan(),
            customer.name.as_deref().unwrap_or("-"),
            customer.country.as_deref().unwrap_or("-"),
            customer
                .creation_date
                .map_or_else(|| "-".to_string(), |d| d.to_string())
                .dimmed()
        );
    }
    display_pagination(listing.items.len(), &listing.pagination);
    Ok(())
}

/// Lists the sales objects of a company.
pub async fn sales_objects(client: &IfsClient, company: &str, top: u32) -> Result<()> {
    let query = ListQuery::builder().top(top).build();
    let listing = SalesObjectService::new(client.clone())
        .list(company, query)
        .await?;
    for object in &listing.items {
        println!(
            "{:<12} {:<40} {:>12} {}",
            object.object_id.bright_cyan(),
            object.description.as_deref().unwrap_or("-"),
            object
                .price
                .map_or_else(|| "-".to_string(), |p| format!("{p:.2}")),
            if object.is_taxable() {
                object.tax_code.as_deref().unwrap_or("taxable").normal()
            } else {
                "no tax".dimmed()
            }
        );
    }
    display_pagination(listing.items.len(), &listing.pagination);
    Ok(())
}
