//! Reqwest-backed PostgREST adapter.
//!
//! Translates [`Query`] and [`Filter`] values into PostgREST query strings
//! (`col=eq.value`, `order=col.asc`) and maps HTTP statuses onto
//! [`DataGatewayError`] variants.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use tracing::debug;

use super::{Connection, describe_failure};
use crate::domain::ports::{DataGateway, DataGatewayError, Filter, Query, Record, Table};

const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// Data gateway speaking the PostgREST HTTP API.
#[derive(Clone)]
pub struct SupabaseRest {
    connection: Arc<Connection>,
}

impl SupabaseRest {
    pub(super) fn new(connection: Arc<Connection>) -> Self {
        Self { connection }
    }

    fn table_url(&self, table: Table) -> Result<Url, DataGatewayError> {
        self.connection
            .url(&format!("rest/v1/{table}"))
            .map_err(|err| DataGatewayError::connection(format!("invalid table url: {err}")))
    }

    fn select_url(&self, table: Table, query: &Query) -> Result<Url, DataGatewayError> {
        let mut url = self.table_url(table)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            for filter in query.filters() {
                pairs.append_pair(filter.column(), &format!("eq.{}", filter.value()));
            }
            if let Some(order) = query.order() {
                pairs.append_pair("order", &format!("{}.asc", order.column));
            }
        }
        Ok(url)
    }

    fn filter_url(&self, table: Table, filter: &Filter) -> Result<Url, DataGatewayError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut()
            .append_pair(filter.column(), &format!("eq.{}", filter.value()));
        Ok(url)
    }
}

#[async_trait]
impl DataGateway for SupabaseRest {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, DataGatewayError> {
        let url = self.select_url(table, query)?;
        debug!(%table, filters = query.filters().len(), "select");
        let response = self
            .connection
            .authorize(self.connection.client.get(url))
            .await
            .send()
            .await
            .map_err(map_transport_error)?;
        let rows = decode_rows(checked(response).await?).await?;
        debug!(%table, rows = rows.len(), "select complete");
        Ok(rows)
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Record, DataGatewayError> {
        let url = self.table_url(table)?;
        debug!(%table, "insert");
        let response = self
            .connection
            .authorize(self.connection.client.post(url))
            .await
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&record)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_rows(checked(response).await?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataGatewayError::decode(format!("insert into {table} returned no row")))
    }

    async fn update(
        &self,
        table: Table,
        patch: Record,
        filter: &Filter,
    ) -> Result<(), DataGatewayError> {
        let url = self.filter_url(table, filter)?;
        debug!(%table, column = filter.column(), "update");
        let response = self
            .connection
            .authorize(self.connection.client.patch(url))
            .await
            .header("Prefer", RETURN_MINIMAL)
            .json(&patch)
            .send()
            .await
            .map_err(map_transport_error)?;
        checked(response).await.map(|_| ())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), DataGatewayError> {
        let url = self.filter_url(table, filter)?;
        debug!(%table, column = filter.column(), "delete");
        let response = self
            .connection
            .authorize(self.connection.client.delete(url))
            .await
            .send()
            .await
            .map_err(map_transport_error)?;
        checked(response).await.map(|_| ())
    }
}

async fn checked(response: Response) -> Result<Response, DataGatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.map_err(map_transport_error)?;
    Err(map_status_error(status, body.as_ref()))
}

async fn decode_rows(response: Response) -> Result<Vec<Record>, DataGatewayError> {
    let body = response.bytes().await.map_err(map_transport_error)?;
    parse_rows(body.as_ref())
}

fn parse_rows(body: &[u8]) -> Result<Vec<Record>, DataGatewayError> {
    serde_json::from_slice(body)
        .map_err(|err| DataGatewayError::decode(format!("invalid PostgREST JSON payload: {err}")))
}

fn map_transport_error(error: reqwest::Error) -> DataGatewayError {
    if error.is_timeout() {
        DataGatewayError::timeout(error.to_string())
    } else {
        DataGatewayError::connection(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> DataGatewayError {
    let message = describe_failure(status, body);
    match status {
        StatusCode::UNAUTHORIZED => DataGatewayError::unauthorized(message),
        StatusCode::FORBIDDEN => DataGatewayError::forbidden(message),
        StatusCode::NOT_FOUND => DataGatewayError::not_found(message),
        StatusCode::CONFLICT => DataGatewayError::conflict(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DataGatewayError::timeout(message)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            DataGatewayError::connection(message)
        }
        _ => DataGatewayError::rejected(status.as_u16(), message),
    }
}
