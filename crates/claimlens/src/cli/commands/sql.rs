use anyhow::{Error, Result};
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::models::{CommandEnvelope, CommandEnvelopeFailure};
use crate::warehouse::embedded::strip_trailing_semicolons;
use crate::warehouse::{EmbeddedWarehouse, Table, WarehouseConnection, WarehouseConnector};

#[derive(Debug, Clone, Args)]
pub struct SqlArgs {
    #[arg(value_name = "SQL")]
    pub sql: String,

    #[arg(long, default_value_t = 1_000)]
    pub row_cap: usize,
}

#[derive(Debug)]
struct SqlGuardrailViolation {
    message: String,
    details: serde_json::Value,
}

pub fn run(args: &SqlArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    if let Err(violation) = validate_read_only_sql(&args.sql) {
        let envelope = CommandEnvelope::error("sql", "sql_guardrail_violation", &violation.message)
            .with_error_details(violation.details);
        return Err(Error::new(CommandEnvelopeFailure::new(envelope)));
    }

    if args.row_cap == 0 {
        let envelope = CommandEnvelope::error(
            "sql",
            "sql_row_cap_invalid",
            "row_cap must be greater than zero",
        )
        .with_error_details(json!({ "row_cap": args.row_cap }));
        return Err(Error::new(CommandEnvelopeFailure::new(envelope)));
    }

    let connector = EmbeddedWarehouse::new(&runtime_paths.warehouse_path);
    let mut connection = connector.connect().map_err(|error| {
        Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error("sql", error.kind_key(), error.message()).with_error_details(
                json!({
                    "warehouse_path": runtime_paths.warehouse_path.display().to_string()
                }),
            ),
        ))
    })?;

    let started = std::time::Instant::now();
    let table = connection.execute(&args.sql).map_err(|error| {
        let duration_ms = started.elapsed().as_millis() as u64;
        Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error("sql", error.kind_key(), error.message())
                .with_meta("duration_ms", json!(duration_ms))
                .with_error_details(json!({ "sql": args.sql })),
        ))
    })?;
    let duration_ms = started.elapsed().as_millis() as u64;

    let (table, truncated) = truncate_table(table, args.row_cap);
    let data = serde_json::to_value(&table).map_err(|error| {
        Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error(
                "sql",
                "sql_response_encode_failed",
                "failed to encode sql response",
            )
            .with_error_details(json!({ "cause": format!("{error:#}") })),
        ))
    })?;

    let mut envelope = CommandEnvelope::ok("sql", data)
        .with_meta("row_count", json!(table.row_count()))
        .with_meta("truncated", json!(truncated))
        .with_meta("row_cap", json!(args.row_cap))
        .with_meta("duration_ms", json!(duration_ms));
    if truncated {
        envelope = envelope
            .with_warning("result_truncated", "result rows truncated to row_cap")
            .with_warning_details(json!({ "row_cap": args.row_cap }));
    }
    let encoded = serde_json::to_string(&envelope).map_err(|error| {
        Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error(
                "sql",
                "sql_response_encode_failed",
                "failed to encode sql response",
            )
            .with_error_details(json!({ "cause": format!("{error:#}") })),
        ))
    })?;
    println!("{encoded}");

    Ok(())
}

fn validate_read_only_sql(raw_sql: &str) -> std::result::Result<(), SqlGuardrailViolation> {
    let candidate = strip_trailing_semicolons(raw_sql);
    if candidate.is_empty() {
        return Err(guardrail_violation(
            "SQL statement is empty; provide a SELECT, CTE, EXPLAIN-SELECT, or SHOW statement",
            json!({"reason":"empty_statement"}),
        ));
    }

    if candidate.contains(';') {
        return Err(guardrail_violation(
            "Multi-statement SQL is not allowed; submit exactly one read-only statement",
            json!({"reason":"multi_statement"}),
        ));
    }

    let normalized = candidate.to_ascii_lowercase();
    if let Some(keyword) = first_mutating_keyword(&normalized) {
        return Err(guardrail_violation(
            format!("Mutating SQL keyword `{keyword}` is not allowed in sql"),
            json!({"reason":"mutating_statement","detected_keyword":keyword}),
        ));
    }

    let allowed = normalized.starts_with("select")
        || normalized.starts_with("with")
        || normalized.starts_with("show")
        || normalized.starts_with("explain select")
        || normalized.starts_with("explain query plan select");
    if !allowed {
        let leading_keyword = leading_keyword(&normalized);
        return Err(guardrail_violation(
            "Only SELECT, WITH ... SELECT, EXPLAIN ... SELECT, and SHOW statements are allowed",
            json!({"reason":"unsupported_statement","leading_keyword":leading_keyword}),
        ));
    }

    Ok(())
}

fn first_mutating_keyword(normalized_sql: &str) -> Option<String> {
    const MUTATING_KEYWORDS: &[&str] = &[
        "insert", "update", "delete", "create", "alter", "drop", "replace", "truncate", "attach",
        "detach", "pragma", "vacuum", "reindex", "analyze", "begin", "commit", "rollback",
    ];

    normalized_sql
        .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .find_map(|token| {
            MUTATING_KEYWORDS
                .contains(&token)
                .then_some(token.to_string())
        })
}

fn leading_keyword(normalized_sql: &str) -> String {
    normalized_sql
        .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .find(|token| !token.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn guardrail_violation(
    message: impl Into<String>,
    details: serde_json::Value,
) -> SqlGuardrailViolation {
    SqlGuardrailViolation {
        message: message.into(),
        details: json!({
            "allowed_forms":[
                "SELECT ...",
                "WITH ... SELECT ...",
                "EXPLAIN SELECT ...",
                "EXPLAIN QUERY PLAN SELECT ...",
                "SHOW CATALOGS",
                "SHOW SCHEMAS IN <catalog>",
                "SHOW TABLES IN <catalog>.<schema>"
            ],
            "guardrail":"read_only_sql_single_statement",
            "violation": details
        }),
    }
}

fn truncate_table(mut table: Table, row_cap: usize) -> (Table, bool) {
    if table.rows.len() > row_cap {
        table.rows.truncate(row_cap);
        (table, true)
    } else {
        (table, false)
    }
}
