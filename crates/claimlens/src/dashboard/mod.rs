use crate::analytics::{
    self, decode_kpi_summary, denial_reasons_query, diagnosis_cost_query, kpi_metrics, kpi_query,
    monthly_trend_query, outlier_claims_query, preview_query, provider_denial_rate_query,
    provider_leaderboard_query, status_breakdown_query,
};
use crate::render::{InputState, NoticeSeverity, PassOutcome, RenderPlan, Widget};
use crate::selector::{self, SelectorStage, StageOutcome, StageSelection};
use crate::warehouse::{QueryExecutor, Table, WarehouseConnector, WarehouseError};

pub const DASHBOARD_TITLE: &str =
    "Claims Enriched Table Explorer (Horizontal Filters + Analytics)";

const NO_DATA_NOTICE: &str = "No data found.";
const NO_STATUS_NOTICE: &str = "No claims status data.";
const NO_TREND_NOTICE: &str = "No trend data.";
const NO_DENIAL_REASON_NOTICE: &str = "No denials by reason.";
const NO_PROVIDER_DENIAL_NOTICE: &str = "No denial/provider data.";
const NO_DIAGNOSIS_NOTICE: &str = "No diagnoses data.";
const NO_PROVIDER_NOTICE: &str = "No provider data.";
const NO_OUTLIER_NOTICE: &str = "No outlier claims found.";

pub fn render_pass<C: WarehouseConnector>(
    executor: &mut QueryExecutor<C>,
    inputs: &InputState,
) -> RenderPlan {
    let mut plan = RenderPlan::new(DASHBOARD_TITLE);
    plan.push(Widget::Heading {
        level: 1,
        text: DASHBOARD_TITLE.to_string(),
    });

    let catalogs = match run_recorded_query(executor, &mut plan, &selector::show_catalogs_query())
    {
        Ok(table) => selector::first_column_values(&table),
        Err(error) => return fail_pass(plan, &error),
    };
    let Some(catalog) = resolve_stage_widgets(&mut plan, SelectorStage::Catalog, &catalogs, inputs)
    else {
        return plan;
    };

    let schemas =
        match run_recorded_query(executor, &mut plan, &selector::show_schemas_query(&catalog)) {
            Ok(table) => selector::first_column_values(&table),
            Err(error) => return fail_pass(plan, &error),
        };
    let Some(schema) = resolve_stage_widgets(&mut plan, SelectorStage::Schema, &schemas, inputs)
    else {
        return plan;
    };

    let tables = match run_recorded_query(
        executor,
        &mut plan,
        &selector::show_tables_query(&catalog, &schema),
    ) {
        Ok(table) => match selector::table_name_values(&table) {
            Ok(names) => names,
            Err(error) => return fail_pass(plan, &error),
        },
        Err(error) => return fail_pass(plan, &error),
    };
    let Some(table) = resolve_stage_widgets(&mut plan, SelectorStage::Table, &tables, inputs)
    else {
        return plan;
    };

    let fqn = analytics::table_fqn(&catalog, &schema, &table);
    plan.push(Widget::Heading {
        level: 3,
        text: format!("Data from `{fqn}`"),
    });
    let preview = match run_recorded_query(executor, &mut plan, &preview_query(&fqn)) {
        Ok(table) => table,
        Err(error) => return fail_pass(plan, &error),
    };
    if preview.is_empty() {
        push_info(&mut plan, NO_DATA_NOTICE);
    } else {
        plan.push(Widget::DataTable { table: preview });
    }

    let kpis = match run_recorded_query(executor, &mut plan, &kpi_query(&fqn)) {
        Ok(table) => match decode_kpi_summary(&table) {
            Ok(summary) => summary,
            Err(error) => return fail_pass(plan, &error),
        },
        Err(error) => return fail_pass(plan, &error),
    };
    for (label, value) in kpi_metrics(&kpis) {
        plan.push(Widget::Metric { label, value });
    }

    let status = match run_recorded_query(executor, &mut plan, &status_breakdown_query(&fqn)) {
        Ok(table) => table,
        Err(error) => return fail_pass(plan, &error),
    };
    push_heading(&mut plan, "Claims by Status");
    push_bar_chart(&mut plan, status, "claim_status", "n_claims", NO_STATUS_NOTICE);

    let trend = match run_recorded_query(executor, &mut plan, &monthly_trend_query(&fqn)) {
        Ok(table) => table,
        Err(error) => return fail_pass(plan, &error),
    };
    push_heading(&mut plan, "Monthly Charges & Denials");
    if trend.is_empty() {
        push_info(&mut plan, NO_TREND_NOTICE);
    } else {
        plan.push(Widget::LineChart {
            x_column: "month".to_string(),
            y_columns: vec!["charges".to_string(), "denied_amt".to_string()],
            table: trend,
        });
    }

    let denial_reasons =
        match run_recorded_query(executor, &mut plan, &denial_reasons_query(&fqn)) {
            Ok(table) => table,
            Err(error) => return fail_pass(plan, &error),
        };
    push_heading(&mut plan, "Top Denial Reasons (Diagnosis)");
    push_bar_chart(
        &mut plan,
        denial_reasons,
        "diagnosis_desc",
        "denied_claims",
        NO_DENIAL_REASON_NOTICE,
    );

    let provider_denials =
        match run_recorded_query(executor, &mut plan, &provider_denial_rate_query(&fqn)) {
            Ok(table) => table,
            Err(error) => return fail_pass(plan, &error),
        };
    push_heading(&mut plan, "Providers with Highest Denial Rate");
    push_bar_chart(
        &mut plan,
        provider_denials,
        "provider_name",
        "denial_rate",
        NO_PROVIDER_DENIAL_NOTICE,
    );

    let diagnoses = match run_recorded_query(executor, &mut plan, &diagnosis_cost_query(&fqn)) {
        Ok(table) => table,
        Err(error) => return fail_pass(plan, &error),
    };
    push_heading(&mut plan, "Top Diagnoses by Cost");
    push_bar_chart(
        &mut plan,
        diagnoses,
        "diagnosis_desc",
        "charges",
        NO_DIAGNOSIS_NOTICE,
    );

    let providers =
        match run_recorded_query(executor, &mut plan, &provider_leaderboard_query(&fqn)) {
            Ok(table) => table,
            Err(error) => return fail_pass(plan, &error),
        };
    push_heading(&mut plan, "Top Providers by Total Charge");
    if providers.is_empty() {
        push_info(&mut plan, NO_PROVIDER_NOTICE);
    } else {
        plan.push(Widget::DataTable { table: providers });
    }

    // Unlike the other panels, this heading renders even when the query fails.
    push_heading(&mut plan, "Outlier High-Charge Claims");
    let outliers = match run_recorded_query(executor, &mut plan, &outlier_claims_query(&fqn)) {
        Ok(table) => table,
        Err(error) => return fail_pass(plan, &error),
    };
    if outliers.is_empty() {
        push_info(&mut plan, NO_OUTLIER_NOTICE);
    } else {
        plan.push(Widget::DataTable { table: outliers });
    }

    plan
}

fn run_recorded_query<C: WarehouseConnector>(
    executor: &mut QueryExecutor<C>,
    plan: &mut RenderPlan,
    sql: &str,
) -> Result<Table, WarehouseError> {
    plan.record_query(sql);
    executor.run_query(sql)
}

fn fail_pass(mut plan: RenderPlan, error: &WarehouseError) -> RenderPlan {
    plan.push(Widget::Notice {
        severity: NoticeSeverity::Error,
        text: error.to_string(),
    });
    plan.outcome = PassOutcome::Failed {
        kind: error.kind_key().to_string(),
        message: error.message().to_string(),
    };
    plan
}

fn resolve_stage_widgets(
    plan: &mut RenderPlan,
    stage: SelectorStage,
    candidates: &[String],
    inputs: &InputState,
) -> Option<String> {
    let filter = inputs.filter_for(stage);
    match selector::resolve_stage(stage, candidates, filter, inputs.requested_for(stage)) {
        StageOutcome::NoCandidates => {
            let (severity, text) = stage_no_candidates_notice(stage);
            plan.push(Widget::Notice {
                severity,
                text: text.to_string(),
            });
            plan.outcome = PassOutcome::halted(stage, text);
            None
        }
        StageOutcome::NoFilterMatches => {
            plan.push(text_input_widget(stage, filter));
            let text = stage_no_matches_notice(stage);
            plan.push(Widget::Notice {
                severity: NoticeSeverity::Warning,
                text: text.to_string(),
            });
            plan.outcome = PassOutcome::halted(stage, text);
            None
        }
        StageOutcome::Selected(selection) => {
            plan.push(text_input_widget(stage, filter));
            plan.push(select_box_widget(stage, &selection));
            Some(selection.selected)
        }
    }
}

const fn stage_no_candidates_notice(stage: SelectorStage) -> (NoticeSeverity, &'static str) {
    match stage {
        SelectorStage::Catalog => (
            NoticeSeverity::Error,
            "No catalogs available; check permissions.",
        ),
        SelectorStage::Schema => (NoticeSeverity::Error, "No schemas found."),
        SelectorStage::Table => (NoticeSeverity::Warning, "No tables in this schema."),
    }
}

const fn stage_no_matches_notice(stage: SelectorStage) -> &'static str {
    match stage {
        SelectorStage::Catalog => "No catalogs match.",
        SelectorStage::Schema => "No schemas match.",
        SelectorStage::Table => "No tables match.",
    }
}

fn text_input_widget(stage: SelectorStage, filter: &str) -> Widget {
    Widget::TextInput {
        key: stage.filter_key().to_string(),
        label: stage.filter_label().to_string(),
        value: filter.to_string(),
    }
}

fn select_box_widget(stage: SelectorStage, selection: &StageSelection) -> Widget {
    Widget::SelectBox {
        key: stage.select_key().to_string(),
        label: stage.select_label().to_string(),
        options: selection.options.clone(),
        selected_index: selection.selected_index,
        selected: selection.selected.clone(),
    }
}

fn push_heading(plan: &mut RenderPlan, text: &str) {
    plan.push(Widget::Heading {
        level: 4,
        text: text.to_string(),
    });
}

fn push_info(plan: &mut RenderPlan, text: &str) {
    plan.push(Widget::Notice {
        severity: NoticeSeverity::Info,
        text: text.to_string(),
    });
}

fn push_bar_chart(
    plan: &mut RenderPlan,
    table: Table,
    x_column: &str,
    y_column: &str,
    empty_notice: &str,
) {
    if table.is_empty() {
        push_info(plan, empty_notice);
    } else {
        plan.push(Widget::BarChart {
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            table,
        });
    }
}
