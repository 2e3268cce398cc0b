use anyhow::{Context, Error, Result};
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::dashboard::render_pass;
use crate::models::{CommandEnvelope, CommandEnvelopeFailure};
use crate::render::{InputState, PassOutcome, RENDER_PLAN_SCHEMA_VERSION, render_text_plan};
use crate::warehouse::{EmbeddedWarehouse, QueryExecutor};

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub catalog_filter: String,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub schema_filter: String,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub table_filter: String,

    #[arg(long, value_name = "NAME")]
    pub catalog: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub schema: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub table: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl RenderArgs {
    #[must_use]
    pub fn input_state(&self) -> InputState {
        InputState {
            catalog_filter: self.catalog_filter.clone(),
            schema_filter: self.schema_filter.clone(),
            table_filter: self.table_filter.clone(),
            catalog_select: self.catalog.clone(),
            schema_select: self.schema.clone(),
            table_select: self.table.clone(),
        }
    }
}

pub fn run(args: &RenderArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let inputs = args.input_state();
    let connector = EmbeddedWarehouse::new(&runtime_paths.warehouse_path);
    let mut executor = QueryExecutor::new(connector);
    let plan = render_pass(&mut executor, &inputs);

    if let PassOutcome::Failed { kind, message } = &plan.outcome {
        if !args.json {
            print!("{}", render_text_plan(&plan));
        }
        let envelope = CommandEnvelope::error("render", kind, message)
            .with_meta("plan_schema_version", json!(RENDER_PLAN_SCHEMA_VERSION))
            .with_meta(
                "warehouse_path",
                json!(runtime_paths.warehouse_path.display().to_string()),
            )
            .with_meta("queries_issued", json!(plan.issued_queries.len()))
            .with_error_details(json!({ "partial_plan": &plan }));
        return Err(Error::new(CommandEnvelopeFailure::new(envelope)));
    }

    if args.json {
        let data = serde_json::to_value(&plan).context("failed to encode render plan")?;
        let mut envelope = CommandEnvelope::ok("render", data)
            .with_meta("plan_schema_version", json!(RENDER_PLAN_SCHEMA_VERSION))
            .with_meta(
                "warehouse_path",
                json!(runtime_paths.warehouse_path.display().to_string()),
            )
            .with_meta("queries_issued", json!(plan.issued_queries.len()))
            .with_meta("widget_count", json!(plan.widgets.len()));
        if let PassOutcome::Halted { stage, reason } = &plan.outcome {
            envelope = envelope
                .with_warning("render_pass_halted", reason)
                .with_warning_details(json!({ "stage": stage }));
        }
        let encoded =
            serde_json::to_string(&envelope).context("failed to encode render envelope")?;
        println!("{encoded}");
    } else {
        print!("{}", render_text_plan(&plan));
    }

    Ok(())
}
