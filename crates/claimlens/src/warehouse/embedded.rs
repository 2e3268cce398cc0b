use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::{ClaimRecord, claim_status_key};

use super::{ScalarValue, Table, WarehouseConnection, WarehouseConnector, WarehouseError};

pub const WAREHOUSE_SCHEMA_VERSION: &str = "claimlens.warehouse.v1";
pub const CATALOGS_TABLE: &str = "warehouse_catalogs";
pub const SCHEMAS_TABLE: &str = "warehouse_schemas";
pub const RELATIONS_TABLE: &str = "warehouse_relations";
pub const REGISTRY_META_TABLE: &str = "warehouse_meta";
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 500;

pub const CLAIM_COLUMNS: &[&str] = &[
    "claim_id",
    "member_id",
    "provider_id",
    "provider_name",
    "claim_status",
    "claim_date",
    "diagnosis_code",
    "diagnosis_desc",
    "total_charge",
];

const CREATE_CATALOGS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS warehouse_catalogs (
    catalog_name TEXT NOT NULL PRIMARY KEY
);
"#;

const CREATE_SCHEMAS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS warehouse_schemas (
    catalog_name TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    PRIMARY KEY (catalog_name, schema_name)
);
"#;

const CREATE_RELATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS warehouse_relations (
    catalog_name TEXT NOT NULL,
    schema_name TEXT NOT NULL,
    table_name TEXT NOT NULL,
    PRIMARY KEY (catalog_name, schema_name, table_name)
);
"#;

const CREATE_REGISTRY_META_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS warehouse_meta (
    schema_version TEXT NOT NULL,
    applied_at_utc TEXT NOT NULL
);
"#;

#[must_use]
pub fn registry_statements() -> &'static [&'static str] {
    &[
        CREATE_CATALOGS_TABLE_SQL,
        CREATE_SCHEMAS_TABLE_SQL,
        CREATE_RELATIONS_TABLE_SQL,
        CREATE_REGISTRY_META_TABLE_SQL,
    ]
}

#[must_use]
pub fn create_registry_sql() -> String {
    registry_statements().join("\n")
}

#[derive(Debug, Clone)]
pub struct EmbeddedWarehouse {
    database_path: PathBuf,
}

impl EmbeddedWarehouse {
    #[must_use]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }

    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

impl WarehouseConnector for EmbeddedWarehouse {
    type Connection = EmbeddedConnection;

    fn connect(&self) -> Result<EmbeddedConnection, WarehouseError> {
        if !self.database_path.is_file() {
            return Err(WarehouseError::connection(format!(
                "warehouse database not found: {} (run `claimlens seed` first)",
                self.database_path.display()
            )));
        }

        let connection = Connection::open(&self.database_path).map_err(|error| {
            WarehouseError::connection(format!(
                "failed to open warehouse database {}: {error}",
                self.database_path.display()
            ))
        })?;
        ensure_registry_schema(&connection).map_err(|error| {
            WarehouseError::connection(format!("failed to prepare warehouse registry: {error:#}"))
        })?;

        Ok(EmbeddedConnection { connection })
    }
}

#[derive(Debug)]
pub struct EmbeddedConnection {
    connection: Connection,
}

impl WarehouseConnection for EmbeddedConnection {
    fn execute(&mut self, sql: &str) -> Result<Table, WarehouseError> {
        execute_statement(&self.connection, sql)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShowStatement {
    Catalogs,
    Schemas { catalog: String },
    Tables { catalog: String, schema: String },
}

pub fn execute_statement(connection: &Connection, sql: &str) -> Result<Table, WarehouseError> {
    let statement = strip_trailing_semicolons(sql);
    if is_show_statement(statement) {
        return match parse_show_statement(statement)? {
            ShowStatement::Catalogs => run_show_catalogs(connection),
            ShowStatement::Schemas { catalog } => run_show_schemas(connection, &catalog),
            ShowStatement::Tables { catalog, schema } => {
                run_show_tables(connection, &catalog, &schema)
            }
        };
    }

    run_sql(connection, &rewrite_for_engine(statement))
}

#[must_use]
pub fn strip_trailing_semicolons(raw_sql: &str) -> &str {
    let mut candidate = raw_sql.trim();
    while let Some(stripped) = candidate.strip_suffix(';') {
        candidate = stripped.trim_end();
    }
    candidate
}

fn is_show_statement(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .is_some_and(|token| token.eq_ignore_ascii_case("show"))
}

fn parse_show_statement(sql: &str) -> Result<ShowStatement, WarehouseError> {
    if show_catalogs_regex().is_match(sql) {
        return Ok(ShowStatement::Catalogs);
    }
    if let Some(captures) = show_schemas_regex().captures(sql) {
        return Ok(ShowStatement::Schemas {
            catalog: captures[1].to_string(),
        });
    }
    if let Some(captures) = show_tables_regex().captures(sql) {
        return Ok(ShowStatement::Tables {
            catalog: captures[1].to_string(),
            schema: captures[2].to_string(),
        });
    }

    Err(WarehouseError::query(format!(
        "unsupported SHOW statement: {sql}"
    )))
}

fn run_show_catalogs(connection: &Connection) -> Result<Table, WarehouseError> {
    let names = query_registry_names(
        connection,
        &format!("SELECT catalog_name FROM {CATALOGS_TABLE} ORDER BY catalog_name"),
        &[],
    )?;
    Ok(single_text_column_table("catalog", names))
}

fn run_show_schemas(connection: &Connection, catalog: &str) -> Result<Table, WarehouseError> {
    if !catalog_exists(connection, catalog)? {
        return Err(WarehouseError::query(format!("catalog not found: {catalog}")));
    }

    let names = query_registry_names(
        connection,
        &format!(
            "SELECT schema_name FROM {SCHEMAS_TABLE} WHERE catalog_name = ?1 ORDER BY schema_name"
        ),
        &[catalog],
    )?;
    Ok(single_text_column_table("databaseName", names))
}

fn run_show_tables(
    connection: &Connection,
    catalog: &str,
    schema: &str,
) -> Result<Table, WarehouseError> {
    if !catalog_exists(connection, catalog)? {
        return Err(WarehouseError::query(format!("catalog not found: {catalog}")));
    }
    if !schema_exists(connection, catalog, schema)? {
        return Err(WarehouseError::query(format!(
            "schema not found: {catalog}.{schema}"
        )));
    }

    let names = query_registry_names(
        connection,
        &format!(
            "SELECT table_name FROM {RELATIONS_TABLE} \
             WHERE catalog_name = ?1 AND schema_name = ?2 ORDER BY table_name"
        ),
        &[catalog, schema],
    )?;

    let rows = names
        .into_iter()
        .map(|name| {
            vec![
                ScalarValue::Text(schema.to_string()),
                ScalarValue::Text(name),
                ScalarValue::Integer(0),
            ]
        })
        .collect();
    Ok(Table::new(
        vec![
            "database".to_string(),
            "tableName".to_string(),
            "isTemporary".to_string(),
        ],
        rows,
    ))
}

fn single_text_column_table(column: &str, names: Vec<String>) -> Table {
    let rows = names
        .into_iter()
        .map(|name| vec![ScalarValue::Text(name)])
        .collect();
    Table::new(vec![column.to_string()], rows)
}

fn query_registry_names(
    connection: &Connection,
    sql: &str,
    params: &[&str],
) -> Result<Vec<String>, WarehouseError> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| registry_error("prepare", error))?;
    let rows = statement
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            row.get::<usize, String>(0)
        })
        .map_err(|error| registry_error("execute", error))?;

    let mut names = Vec::new();
    for row in rows {
        names.push(row.map_err(|error| registry_error("decode", error))?);
    }
    Ok(names)
}

fn catalog_exists(connection: &Connection, catalog: &str) -> Result<bool, WarehouseError> {
    registry_row_exists(
        connection,
        &format!("SELECT EXISTS(SELECT 1 FROM {CATALOGS_TABLE} WHERE catalog_name = ?1)"),
        &[catalog],
    )
}

fn schema_exists(
    connection: &Connection,
    catalog: &str,
    schema: &str,
) -> Result<bool, WarehouseError> {
    registry_row_exists(
        connection,
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {SCHEMAS_TABLE} \
             WHERE catalog_name = ?1 AND schema_name = ?2)"
        ),
        &[catalog, schema],
    )
}

fn registry_row_exists(
    connection: &Connection,
    sql: &str,
    params: &[&str],
) -> Result<bool, WarehouseError> {
    let exists = connection
        .query_row(sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get::<usize, i64>(0)
        })
        .map_err(|error| registry_error("read", error))?;
    Ok(exists != 0)
}

fn registry_error(action: &str, error: rusqlite::Error) -> WarehouseError {
    WarehouseError::query(format!("failed to {action} warehouse registry query: {error}"))
}

fn show_catalogs_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*SHOW\s+CATALOGS\s*$").expect("show catalogs regex should compile")
    })
}

fn show_schemas_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)^\s*SHOW\s+SCHEMAS\s+IN\s+([A-Za-z_][A-Za-z0-9_]*)\s*$")
            .expect("show schemas regex should compile")
    })
}

fn show_tables_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*SHOW\s+TABLES\s+IN\s+([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s*$",
        )
        .expect("show tables regex should compile")
    })
}

#[must_use]
pub fn rewrite_for_engine(sql: &str) -> String {
    let qualified = fqn_regex().replace_all(sql, "\"${1}.${2}.${3}\"");
    stddev_regex()
        .replace_all(&qualified, "sqrt(avg(${1} * ${1}) - avg(${1}) * avg(${1}))")
        .into_owned()
}

fn fqn_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"\b([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\b",
        )
        .expect("qualified table name regex should compile")
    })
}

fn stddev_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bSTDDEV\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)")
            .expect("stddev rewrite regex should compile")
    })
}

fn identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should compile")
    })
}

fn run_sql(connection: &Connection, sql: &str) -> Result<Table, WarehouseError> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| WarehouseError::query(format!("failed to prepare statement: {error}")))?;
    let columns = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement
        .query([])
        .map_err(|error| WarehouseError::query(format!("failed to execute statement: {error}")))?;
    let mut materialized = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|error| WarehouseError::query(format!("failed to fetch result row: {error}")))?
    {
        let mut record = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            let value = row.get::<usize, SqlValue>(index).map_err(|error| {
                WarehouseError::query(format!("failed to decode result column: {error}"))
            })?;
            record.push(scalar_from_sql(value));
        }
        materialized.push(record);
    }

    Ok(Table::new(columns, materialized))
}

fn scalar_from_sql(value: SqlValue) -> ScalarValue {
    match value {
        SqlValue::Null => ScalarValue::Null,
        SqlValue::Integer(value) => ScalarValue::Integer(value),
        SqlValue::Real(value) => ScalarValue::Real(value),
        SqlValue::Text(value) => ScalarValue::Text(value),
        SqlValue::Blob(value) => ScalarValue::Text(encode_blob_hex(&value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}

pub fn open_warehouse_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create warehouse parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open warehouse database: {}", path.display()))
}

pub fn ensure_registry_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&create_registry_sql())
        .context("failed to create warehouse registry schema")?;

    if registry_meta_has_version(connection, WAREHOUSE_SCHEMA_VERSION)? {
        return Ok(());
    }

    let applied_at_utc = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format registry schema applied timestamp")?;
    connection
        .execute(
            &format!(
                "INSERT INTO {REGISTRY_META_TABLE} (schema_version, applied_at_utc) VALUES (?1, ?2)"
            ),
            params![WAREHOUSE_SCHEMA_VERSION, applied_at_utc],
        )
        .context("failed to write registry schema meta row")?;

    Ok(())
}

fn registry_meta_has_version(connection: &Connection, schema_version: &str) -> Result<bool> {
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM {REGISTRY_META_TABLE} WHERE schema_version = ?1 LIMIT 1)"
    );
    let exists = connection
        .query_row(&query, [schema_version], |row| row.get::<usize, i64>(0))
        .context("failed to query registry schema version metadata")?;
    Ok(exists != 0)
}

pub fn validate_identifier(name: &str, role: &str) -> Result<()> {
    if !identifier_regex().is_match(name) {
        bail!("{role} must match [A-Za-z_][A-Za-z0-9_]*: {name}");
    }
    Ok(())
}

#[must_use]
pub fn physical_table_name(catalog: &str, schema: &str, table: &str) -> String {
    format!("{catalog}.{schema}.{table}")
}

pub fn register_catalog(connection: &Connection, catalog: &str) -> Result<()> {
    validate_identifier(catalog, "catalog name")?;
    connection
        .execute(
            &format!("INSERT OR IGNORE INTO {CATALOGS_TABLE} (catalog_name) VALUES (?1)"),
            params![catalog],
        )
        .with_context(|| format!("failed to register catalog {catalog}"))?;
    Ok(())
}

pub fn register_schema(connection: &Connection, catalog: &str, schema: &str) -> Result<()> {
    register_catalog(connection, catalog)?;
    validate_identifier(schema, "schema name")?;
    connection
        .execute(
            &format!(
                "INSERT OR IGNORE INTO {SCHEMAS_TABLE} (catalog_name, schema_name) VALUES (?1, ?2)"
            ),
            params![catalog, schema],
        )
        .with_context(|| format!("failed to register schema {catalog}.{schema}"))?;
    Ok(())
}

pub fn create_claims_table(
    connection: &Connection,
    catalog: &str,
    schema: &str,
    table: &str,
) -> Result<String> {
    register_schema(connection, catalog, schema)?;
    validate_identifier(table, "table name")?;

    let physical_name = physical_table_name(catalog, schema, table);
    connection
        .execute_batch(&create_claims_table_sql(&physical_name))
        .with_context(|| format!("failed to create claims table {physical_name}"))?;
    connection
        .execute(
            &format!(
                "INSERT OR IGNORE INTO {RELATIONS_TABLE} \
                 (catalog_name, schema_name, table_name) VALUES (?1, ?2, ?3)"
            ),
            params![catalog, schema, table],
        )
        .with_context(|| format!("failed to register relation {physical_name}"))?;

    Ok(physical_name)
}

fn create_claims_table_sql(physical_name: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{physical_name}" (
    claim_id TEXT NOT NULL PRIMARY KEY,
    member_id TEXT NOT NULL,
    provider_id TEXT NOT NULL,
    provider_name TEXT NOT NULL,
    claim_status TEXT NOT NULL,
    claim_date TEXT NOT NULL,
    diagnosis_code TEXT NOT NULL,
    diagnosis_desc TEXT NOT NULL,
    total_charge REAL NOT NULL,
    CHECK (claim_status IN ('submitted', 'approved', 'denied', 'pending'))
);
"#
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimWriteStats {
    pub input_records: usize,
    pub records_written: usize,
    pub batches_committed: usize,
}

pub fn write_claims_batched(
    connection: &mut Connection,
    physical_name: &str,
    claims: &[ClaimRecord],
    batch_size: usize,
) -> Result<ClaimWriteStats> {
    let batch_size = batch_size.max(1);
    let upsert_sql = build_claim_upsert_sql(physical_name);
    let mut records_written = 0usize;
    let mut batches_committed = 0usize;

    for batch in claims.chunks(batch_size) {
        let tx = connection
            .transaction()
            .context("failed to open warehouse transaction")?;
        {
            let mut statement = tx
                .prepare_cached(&upsert_sql)
                .context("failed to prepare claims upsert statement")?;

            for claim in batch {
                statement
                    .execute(params![
                        claim.claim_id,
                        claim.member_id,
                        claim.provider_id,
                        claim.provider_name,
                        claim_status_key(claim.claim_status),
                        claim.claim_date,
                        claim.diagnosis_code,
                        claim.diagnosis_desc,
                        claim.total_charge,
                    ])
                    .with_context(|| format!("failed to insert claim_id={}", claim.claim_id))?;
                records_written += 1;
            }
        }
        tx.commit()
            .context("failed to commit warehouse batch transaction")?;
        batches_committed += 1;
    }

    Ok(ClaimWriteStats {
        input_records: claims.len(),
        records_written,
        batches_committed,
    })
}

fn build_claim_upsert_sql(physical_name: &str) -> String {
    let placeholders = (1..=CLAIM_COLUMNS.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let upsert_assignments = CLAIM_COLUMNS
        .iter()
        .filter(|column| **column != "claim_id")
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO \"{physical_name}\" ({}) VALUES ({placeholders})
         ON CONFLICT(claim_id) DO UPDATE SET {upsert_assignments}",
        CLAIM_COLUMNS.join(", "),
    )
}
