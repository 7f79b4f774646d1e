//! Driven port for the hosted table store.
//!
//! Records travel as JSON objects so one adapter serves every table. Screens
//! convert to and from typed rows with [`decode_rows`] and [`encode_record`].

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::define_port_error;

define_port_error! {
    /// Errors raised by data gateway adapters.
    pub enum DataGatewayError {
        /// Connection could not be established.
        Connection { message: String } => "data gateway connection failed: {message}",
        /// The request did not complete within the transport timeout.
        Timeout { message: String } => "data gateway timed out: {message}",
        /// Missing or expired credentials.
        Unauthorized { message: String } => "data gateway rejected credentials: {message}",
        /// Row-level policy denied the operation.
        Forbidden { message: String } => "data gateway denied access: {message}",
        /// The table or row does not exist.
        NotFound { message: String } => "data gateway record not found: {message}",
        /// The write conflicts with stored data (duplicate key, foreign key).
        Conflict { message: String } => "data gateway conflict: {message}",
        /// Any other refusal.
        Rejected { status: u16, message: String } => "data gateway rejected request ({status}): {message}",
        /// A row did not match the expected shape.
        Decode { message: String } => "data gateway row could not be decoded: {message}",
    }
}

/// A single table row.
pub type Record = Map<String, Value>;

/// Tables the client reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Profile rows keyed by auth user id.
    Users,
    /// Course modules.
    Modules,
    /// Video chapters.
    Chapters,
}

impl Table {
    /// Table name on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Modules => "modules",
            Self::Chapters => "chapters",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    value: String,
}

impl Filter {
    /// Match rows where `column` equals `value`.
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filtered column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Expected value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when `record` satisfies the filter.
    pub fn matches(&self, record: &Record) -> bool {
        match record.get(&self.column) {
            Some(Value::String(text)) => text == &self.value,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }
}

/// Ascending ordering on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Column to sort by.
    pub column: String,
}

/// Read query: conjunction of equality filters plus an optional ordering.
///
/// # Examples
/// ```
/// use academy_client::domain::ports::Query;
///
/// let query = Query::new().eq("module_id", "m1").eq("status", "live").order_by("title");
/// assert_eq!(query.filters().len(), 2);
/// assert_eq!(query.order().map(|o| o.column.as_str()), Some("title"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Option<Order>,
}

impl Query {
    /// Select every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Sort ascending by `column`.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
        });
        self
    }

    /// Filters in insertion order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Requested ordering.
    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }
}

/// Port for table reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Rows of `table` matching `query`, in the requested order.
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, DataGatewayError>;

    /// Insert `record` and return the stored row.
    async fn insert(&self, table: Table, record: Record) -> Result<Record, DataGatewayError>;

    /// Apply `patch` to rows matching `filter`.
    async fn update(
        &self,
        table: Table,
        patch: Record,
        filter: &Filter,
    ) -> Result<(), DataGatewayError>;

    /// Remove rows matching `filter`.
    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), DataGatewayError>;
}

/// Decode rows into typed values, failing on the first malformed row.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, DataGatewayError> {
    rows.into_iter().map(decode_record).collect()
}

/// Decode one row.
pub fn decode_record<T: DeserializeOwned>(record: Record) -> Result<T, DataGatewayError> {
    serde_json::from_value(Value::Object(record))
        .map_err(|err| DataGatewayError::decode(err.to_string()))
}

/// Encode a typed value as a row. Non-object values are rejected.
pub fn encode_record<T: Serialize>(value: &T) -> Result<Record, DataGatewayError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(DataGatewayError::decode(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(err) => Err(DataGatewayError::decode(err.to_string())),
    }
}
