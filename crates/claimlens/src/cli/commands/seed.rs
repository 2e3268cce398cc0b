use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::models::{CLAIM_RECORD_SCHEMA_VERSION, ClaimRecord, ClaimStatus, CommandEnvelope};
use crate::warehouse::embedded::{
    DEFAULT_INSERT_BATCH_SIZE, create_claims_table, ensure_registry_schema,
    open_warehouse_database, write_claims_batched,
};

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, value_name = "NAME", default_value = "claims")]
    pub catalog: String,

    #[arg(long, value_name = "NAME", default_value = "main")]
    pub schema: String,

    #[arg(long, value_name = "NAME", default_value = "claims_enriched")]
    pub table: String,

    #[arg(long, value_name = "PATH")]
    pub claims: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &SeedArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    if !args.json {
        println!(
            "seed: start warehouse={} table={}.{}.{}",
            runtime_paths.warehouse_path.display(),
            args.catalog,
            args.schema,
            args.table
        );
    }

    let claims = match &args.claims {
        Some(path) => read_claims_jsonl(path)?,
        None => demo_claims(),
    };
    if claims.is_empty() {
        bail!("no claim records to seed");
    }

    let mut connection = open_warehouse_database(&runtime_paths.warehouse_path)?;
    ensure_registry_schema(&connection)?;
    let physical_table =
        create_claims_table(&connection, &args.catalog, &args.schema, &args.table)?;
    let stats = write_claims_batched(
        &mut connection,
        &physical_table,
        &claims,
        DEFAULT_INSERT_BATCH_SIZE,
    )?;

    if args.json {
        let envelope = CommandEnvelope::ok(
            "seed",
            json!({
                "catalog": args.catalog,
                "schema": args.schema,
                "table": args.table,
                "physical_table": physical_table,
                "input_records": stats.input_records,
                "records_written": stats.records_written,
                "batches_committed": stats.batches_committed,
            }),
        )
        .with_meta("claim_record_schema_version", json!(CLAIM_RECORD_SCHEMA_VERSION))
        .with_meta("source", json!(claims_source_key(args)))
        .with_meta(
            "warehouse_path",
            json!(runtime_paths.warehouse_path.display().to_string()),
        );
        let encoded = serde_json::to_string(&envelope).context("failed to encode seed report")?;
        println!("{encoded}");
    } else {
        println!(
            "seed: complete records={} batches={} table={}",
            stats.records_written, stats.batches_committed, physical_table
        );
    }

    Ok(())
}

fn claims_source_key(args: &SeedArgs) -> &'static str {
    if args.claims.is_some() {
        "claims_file"
    } else {
        "demo_dataset"
    }
}

fn read_claims_jsonl(path: &Path) -> Result<Vec<ClaimRecord>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open claims file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut claims = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("failed to read claims file {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ClaimRecord = serde_json::from_str(&line).with_context(|| {
            format!(
                "invalid claim record on line {} of {}",
                index + 1,
                path.display()
            )
        })?;
        claims.push(record);
    }

    Ok(claims)
}

pub fn demo_claims() -> Vec<ClaimRecord> {
    const LAKESIDE: (&str, &str) = ("P-100", "Lakeside Medical Group");
    const HARBOR: (&str, &str) = ("P-200", "Harbor Health Partners");
    const SUMMIT: (&str, &str) = ("P-300", "Summit Care Clinic");

    const DIABETES: (&str, &str) = ("E11.9", "Type 2 diabetes mellitus without complications");
    const HYPERTENSION: (&str, &str) = ("I10", "Essential (primary) hypertension");
    const ASTHMA: (&str, &str) = ("J45.909", "Unspecified asthma, uncomplicated");
    const BACK_PAIN: (&str, &str) = ("M54.5", "Low back pain");
    const REFLUX: (&str, &str) = ("K21.9", "Gastro-esophageal reflux disease without esophagitis");

    let rows: [(
        &str,
        &str,
        (&str, &str),
        ClaimStatus,
        &str,
        (&str, &str),
        f64,
    ); 24] = [
        ("CLM-1001", "M-1001", LAKESIDE, ClaimStatus::Approved, "2024-01-05", DIABETES, 320.0),
        ("CLM-1002", "M-1001", HARBOR, ClaimStatus::Approved, "2024-02-11", DIABETES, 145.5),
        ("CLM-1003", "M-1002", LAKESIDE, ClaimStatus::Approved, "2024-01-09", HYPERTENSION, 210.0),
        ("CLM-1004", "M-1002", SUMMIT, ClaimStatus::Denied, "2024-02-14", HYPERTENSION, 480.0),
        ("CLM-1005", "M-1003", LAKESIDE, ClaimStatus::Approved, "2024-01-12", ASTHMA, 150.0),
        ("CLM-1006", "M-1003", HARBOR, ClaimStatus::Submitted, "2024-03-02", ASTHMA, 95.0),
        ("CLM-1007", "M-1004", SUMMIT, ClaimStatus::Denied, "2024-01-18", BACK_PAIN, 610.0),
        ("CLM-1008", "M-1004", LAKESIDE, ClaimStatus::Approved, "2024-03-06", BACK_PAIN, 180.0),
        ("CLM-1009", "M-1005", HARBOR, ClaimStatus::Approved, "2024-01-21", DIABETES, 260.0),
        ("CLM-1010", "M-1005", LAKESIDE, ClaimStatus::Pending, "2024-03-09", HYPERTENSION, 130.0),
        ("CLM-1011", "M-1006", SUMMIT, ClaimStatus::Denied, "2024-02-03", BACK_PAIN, 540.0),
        ("CLM-1012", "M-1006", HARBOR, ClaimStatus::Approved, "2024-03-15", REFLUX, 310.0),
        ("CLM-1013", "M-1007", LAKESIDE, ClaimStatus::Approved, "2024-02-07", REFLUX, 420.0),
        ("CLM-1014", "M-1007", HARBOR, ClaimStatus::Submitted, "2024-03-18", HYPERTENSION, 88.0),
        ("CLM-1015", "M-1008", LAKESIDE, ClaimStatus::Denied, "2024-02-19", DIABETES, 350.0),
        ("CLM-1016", "M-1008", SUMMIT, ClaimStatus::Approved, "2024-03-21", ASTHMA, 230.0),
        ("CLM-1017", "M-1009", HARBOR, ClaimStatus::Approved, "2024-01-25", BACK_PAIN, 175.0),
        ("CLM-1018", "M-1009", LAKESIDE, ClaimStatus::Pending, "2024-03-24", DIABETES, 260.0),
        ("CLM-1019", "M-1010", SUMMIT, ClaimStatus::Approved, "2024-01-28", HYPERTENSION, 195.0),
        ("CLM-1020", "M-1010", HARBOR, ClaimStatus::Denied, "2024-02-22", ASTHMA, 405.0),
        ("CLM-1021", "M-1011", LAKESIDE, ClaimStatus::Approved, "2024-02-25", BACK_PAIN, 25000.0),
        ("CLM-1022", "M-1011", SUMMIT, ClaimStatus::Submitted, "2024-03-27", REFLUX, 145.0),
        ("CLM-1023", "M-1012", HARBOR, ClaimStatus::Approved, "2024-01-31", HYPERTENSION, 505.0),
        ("CLM-1024", "M-1012", LAKESIDE, ClaimStatus::Submitted, "2024-03-29", DIABETES, 410.0),
    ];

    rows.into_iter()
        .map(
            |(claim_id, member_id, provider, status, date, diagnosis, charge)| ClaimRecord {
                claim_id: claim_id.to_string(),
                member_id: member_id.to_string(),
                provider_id: provider.0.to_string(),
                provider_name: provider.1.to_string(),
                claim_status: status,
                claim_date: date.to_string(),
                diagnosis_code: diagnosis.0.to_string(),
                diagnosis_desc: diagnosis.1.to_string(),
                total_charge: charge,
            },
        )
        .collect()
}
