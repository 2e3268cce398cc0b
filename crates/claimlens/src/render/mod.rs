use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::selector::SelectorStage;
use crate::warehouse::Table;

pub const RENDER_PLAN_SCHEMA_VERSION: &str = "claimlens.render-plan.v1";
pub const TEXT_TABLE_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct InputState {
    pub catalog_filter: String,
    pub schema_filter: String,
    pub table_filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_select: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_select: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_select: Option<String>,
}

impl InputState {
    #[must_use]
    pub fn filter_for(&self, stage: SelectorStage) -> &str {
        match stage {
            SelectorStage::Catalog => &self.catalog_filter,
            SelectorStage::Schema => &self.schema_filter,
            SelectorStage::Table => &self.table_filter,
        }
    }

    #[must_use]
    pub fn requested_for(&self, stage: SelectorStage) -> Option<&str> {
        match stage {
            SelectorStage::Catalog => self.catalog_select.as_deref(),
            SelectorStage::Schema => self.schema_select.as_deref(),
            SelectorStage::Table => self.table_select.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

impl NoticeSeverity {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            NoticeSeverity::Info => "info",
            NoticeSeverity::Warning => "warning",
            NoticeSeverity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    Heading {
        level: u8,
        text: String,
    },
    Notice {
        severity: NoticeSeverity,
        text: String,
    },
    TextInput {
        key: String,
        label: String,
        value: String,
    },
    SelectBox {
        key: String,
        label: String,
        options: Vec<String>,
        selected_index: usize,
        selected: String,
    },
    Metric {
        label: String,
        value: String,
    },
    BarChart {
        x_column: String,
        y_column: String,
        table: Table,
    },
    LineChart {
        x_column: String,
        y_columns: Vec<String>,
        table: Table,
    },
    DataTable {
        table: Table,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed,
    Halted { stage: String, reason: String },
    Failed { kind: String, message: String },
}

impl PassOutcome {
    #[must_use]
    pub fn halted(stage: SelectorStage, reason: impl Into<String>) -> Self {
        PassOutcome::Halted {
            stage: stage.key().to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, PassOutcome::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RenderPlan {
    pub title: String,
    pub widgets: Vec<Widget>,
    pub issued_queries: Vec<String>,
    pub outcome: PassOutcome,
}

impl RenderPlan {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            widgets: Vec::new(),
            issued_queries: Vec::new(),
            outcome: PassOutcome::Completed,
        }
    }

    pub fn push(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    pub fn record_query(&mut self, sql: impl Into<String>) {
        self.issued_queries.push(sql.into());
    }

    #[must_use]
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(RenderPlan);
        match serde_json::to_value(schema) {
            Ok(value) => value,
            Err(error) => {
                panic!("failed to serialize generated render plan schema: {error}");
            }
        }
    }
}

#[must_use]
pub fn render_text_plan(plan: &RenderPlan) -> String {
    let mut lines = Vec::new();
    lines.push(plan.title.clone());
    lines.push(format!("outcome: {}", outcome_line(&plan.outcome)));
    lines.push(format!("queries issued: {}", plan.issued_queries.len()));

    for widget in &plan.widgets {
        match widget {
            Widget::Heading { level, text } => {
                lines.push(String::new());
                lines.push(format!("{} {text}", "#".repeat(usize::from(*level))));
            }
            Widget::Notice { severity, text } => {
                lines.push(format!("[{}] {text}", severity.key()));
            }
            Widget::TextInput { key, value, .. } => {
                lines.push(format!("text_input {key} = {value:?}"));
            }
            Widget::SelectBox {
                key,
                options,
                selected,
                ..
            } => {
                lines.push(format!(
                    "select_box {key} = {selected} ({} options)",
                    options.len()
                ));
            }
            Widget::Metric { label, value } => {
                lines.push(format!("metric {label}: {value}"));
            }
            Widget::BarChart {
                x_column,
                y_column,
                table,
            } => {
                lines.push(format!(
                    "bar_chart {x_column} vs {y_column} ({} rows)",
                    table.row_count()
                ));
                lines.extend(table_preview_lines(table));
            }
            Widget::LineChart {
                x_column,
                y_columns,
                table,
            } => {
                lines.push(format!(
                    "line_chart {x_column} -> [{}] ({} rows)",
                    y_columns.join(", "),
                    table.row_count()
                ));
                lines.extend(table_preview_lines(table));
            }
            Widget::DataTable { table } => {
                lines.push(format!(
                    "data_table ({} rows, {} columns)",
                    table.row_count(),
                    table.columns.len()
                ));
                lines.extend(table_preview_lines(table));
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

fn outcome_line(outcome: &PassOutcome) -> String {
    match outcome {
        PassOutcome::Completed => "completed".to_string(),
        PassOutcome::Halted { stage, reason } => format!("halted at {stage}: {reason}"),
        PassOutcome::Failed { kind, message } => format!("failed ({kind}): {message}"),
    }
}

fn table_preview_lines(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();
    if table.is_empty() {
        return lines;
    }

    lines.push(format!("  | {}", table.columns.join(" | ")));
    for row in table.rows.iter().take(TEXT_TABLE_PREVIEW_ROWS) {
        let cells = row
            .iter()
            .map(|value| value.display_text().unwrap_or_default())
            .collect::<Vec<_>>();
        lines.push(format!("  | {}", cells.join(" | ")));
    }
    let hidden = table.row_count().saturating_sub(TEXT_TABLE_PREVIEW_ROWS);
    if hidden > 0 {
        lines.push(format!("  ... {hidden} more rows"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::{
        InputState, NoticeSeverity, PassOutcome, RenderPlan, Widget, render_text_plan,
    };
    use crate::selector::SelectorStage;
    use crate::warehouse::{ScalarValue, Table};

    #[test]
    fn input_state_maps_stage_keys() {
        let inputs = InputState {
            catalog_filter: "cla".to_string(),
            schema_select: Some("main".to_string()),
            ..InputState::default()
        };
        assert_eq!(inputs.filter_for(SelectorStage::Catalog), "cla");
        assert_eq!(inputs.filter_for(SelectorStage::Table), "");
        assert_eq!(inputs.requested_for(SelectorStage::Schema), Some("main"));
        assert_eq!(inputs.requested_for(SelectorStage::Catalog), None);
    }

    #[test]
    fn input_state_deserializes_widget_keys() {
        let inputs: InputState =
            serde_json::from_str(r#"{"table_filter":"enriched","table_select":"claims_enriched"}"#)
                .expect("input state should deserialize");
        assert_eq!(inputs.table_filter, "enriched");
        assert_eq!(inputs.table_select.as_deref(), Some("claims_enriched"));
        assert!(inputs.catalog_filter.is_empty());

        assert!(serde_json::from_str::<InputState>(r#"{"unknown_key":1}"#).is_err());
    }

    #[test]
    fn widgets_serialize_with_kind_tags() {
        let widget = Widget::Notice {
            severity: NoticeSeverity::Warning,
            text: "No tables match.".to_string(),
        };
        let json = serde_json::to_value(&widget).expect("widget should serialize");
        assert_eq!(json["kind"], "notice");
        assert_eq!(json["severity"], "warning");

        let outcome = PassOutcome::halted(SelectorStage::Catalog, "No catalogs match.");
        let json = serde_json::to_value(&outcome).expect("outcome should serialize");
        assert_eq!(json["status"], "halted");
        assert_eq!(json["stage"], "catalog");
    }

    #[test]
    fn text_plan_lists_widgets_and_outcome() {
        let mut plan = RenderPlan::new("Claims Enriched Table Explorer");
        plan.record_query("SHOW CATALOGS");
        plan.push(Widget::Heading {
            level: 1,
            text: "Claims Enriched Table Explorer".to_string(),
        });
        plan.push(Widget::Metric {
            label: "Total Claims".to_string(),
            value: "12".to_string(),
        });
        plan.push(Widget::DataTable {
            table: Table::new(
                vec!["claim_id".to_string()],
                vec![
                    vec![ScalarValue::Text("CLM-1".to_string())],
                    vec![ScalarValue::Null],
                ],
            ),
        });

        let text = render_text_plan(&plan);
        assert!(text.starts_with("Claims Enriched Table Explorer\n"));
        assert!(text.contains("outcome: completed"));
        assert!(text.contains("queries issued: 1"));
        assert!(text.contains("# Claims Enriched Table Explorer"));
        assert!(text.contains("metric Total Claims: 12"));
        assert!(text.contains("data_table (2 rows, 1 columns)"));
        assert!(text.contains("  | claim_id"));
        assert!(text.contains("  | CLM-1"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn long_tables_are_truncated_in_text_output() {
        let rows = (0..25)
            .map(|index| vec![ScalarValue::Integer(index)])
            .collect::<Vec<_>>();
        let mut plan = RenderPlan::new("preview");
        plan.push(Widget::DataTable {
            table: Table::new(vec!["n".to_string()], rows),
        });

        let text = render_text_plan(&plan);
        assert!(text.contains("... 15 more rows"));
    }
}
