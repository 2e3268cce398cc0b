use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod embedded;

pub use embedded::{EmbeddedConnection, EmbeddedWarehouse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ScalarValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Text(value) => Some(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<ScalarValue>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    #[must_use]
    pub fn value_at(&self, row_index: usize, column_index: usize) -> Option<&ScalarValue> {
        self.rows.get(row_index)?.get(column_index)
    }

    #[must_use]
    pub fn value(&self, row_index: usize, column_name: &str) -> Option<&ScalarValue> {
        let column_index = self.column_index(column_name)?;
        self.value_at(row_index, column_index)
    }

    #[must_use]
    pub fn column_display_values(&self, column_index: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column_index))
            .filter_map(ScalarValue::display_text)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseError {
    Connection { message: String },
    Query { message: String },
}

impl WarehouseError {
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind_key(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connection_error",
            Self::Query { .. } => "query_execution_error",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Connection { message } | Self::Query { message } => message,
        }
    }
}

impl Display for WarehouseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection { message } => write!(f, "warehouse connection failed: {message}"),
            Self::Query { message } => write!(f, "query execution failed: {message}"),
        }
    }
}

impl std::error::Error for WarehouseError {}

pub trait WarehouseConnection {
    fn execute(&mut self, sql: &str) -> Result<Table, WarehouseError>;
}

pub trait WarehouseConnector {
    type Connection: WarehouseConnection;

    fn connect(&self) -> Result<Self::Connection, WarehouseError>;
}

pub struct QueryExecutor<C: WarehouseConnector> {
    connector: C,
    connection: Option<C::Connection>,
}

impl<C: WarehouseConnector> QueryExecutor<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connection: None,
        }
    }

    pub fn run_query(&mut self, sql: &str) -> Result<Table, WarehouseError> {
        if self.connection.is_none() {
            self.connection = Some(self.connector.connect()?);
        }
        match self.connection.as_mut() {
            Some(connection) => connection.execute(sql),
            None => Err(WarehouseError::connection(
                "warehouse connection unavailable after connect",
            )),
        }
    }

    #[must_use]
    pub fn connection_established(&self) -> bool {
        self.connection.is_some()
    }

    pub fn invalidate(&mut self) {
        self.connection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{ScalarValue, Table, WarehouseError};

    fn sample_table() -> Table {
        Table::new(
            vec!["name".to_string(), "amount".to_string()],
            vec![
                vec![
                    ScalarValue::Text("alpha".to_string()),
                    ScalarValue::Real(12.5),
                ],
                vec![ScalarValue::Null, ScalarValue::Integer(7)],
            ],
        )
    }

    #[test]
    fn column_lookup_finds_named_values() {
        let table = sample_table();
        assert_eq!(table.column_index("amount"), Some(1));
        assert_eq!(
            table.value(0, "name").and_then(ScalarValue::as_str),
            Some("alpha")
        );
        assert_eq!(table.value(1, "amount").and_then(ScalarValue::as_i64), Some(7));
        assert!(table.value(0, "missing").is_none());
    }

    #[test]
    fn display_values_skip_nulls() {
        let table = sample_table();
        assert_eq!(table.column_display_values(0), vec!["alpha".to_string()]);
        assert_eq!(
            table.column_display_values(1),
            vec!["12.5".to_string(), "7".to_string()]
        );
    }

    #[test]
    fn empty_table_keeps_column_names() {
        let table = Table::empty(vec!["catalog".to_string()]);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns, vec!["catalog".to_string()]);
    }

    #[test]
    fn scalar_coercions_are_strict_for_integers() {
        assert_eq!(ScalarValue::Integer(3).as_i64(), Some(3));
        assert_eq!(ScalarValue::Real(3.0).as_i64(), None);
        assert_eq!(ScalarValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(ScalarValue::Null.as_f64(), None);
    }

    #[test]
    fn error_kinds_map_to_stable_codes() {
        let connection = WarehouseError::connection("no database");
        let query = WarehouseError::query("no such table");
        assert_eq!(connection.kind_key(), "connection_error");
        assert_eq!(query.kind_key(), "query_execution_error");
        assert!(connection.to_string().contains("warehouse connection failed"));
        assert!(query.to_string().contains("query execution failed"));
        assert_eq!(query.message(), "no such table");
    }

    #[test]
    fn scalar_values_serialize_untagged() {
        let encoded = serde_json::to_value(vec![
            ScalarValue::Null,
            ScalarValue::Integer(5),
            ScalarValue::Real(2.5),
            ScalarValue::Text("x".to_string()),
        ])
        .expect("scalars should serialize");
        assert_eq!(encoded, serde_json::json!([null, 5, 2.5, "x"]));
    }
}
