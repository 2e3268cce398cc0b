use crate::warehouse::{Table, WarehouseError};

pub const PREFERRED_TABLE_NAME: &str = "claims_enriched";
pub const TABLE_NAME_COLUMN: &str = "tableName";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorStage {
    Catalog,
    Schema,
    Table,
}

impl SelectorStage {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            SelectorStage::Catalog => "catalog",
            SelectorStage::Schema => "schema",
            SelectorStage::Table => "table",
        }
    }

    #[must_use]
    pub const fn filter_key(self) -> &'static str {
        match self {
            SelectorStage::Catalog => "catalog_filter",
            SelectorStage::Schema => "schema_filter",
            SelectorStage::Table => "table_filter",
        }
    }

    #[must_use]
    pub const fn select_key(self) -> &'static str {
        match self {
            SelectorStage::Catalog => "catalog_select",
            SelectorStage::Schema => "schema_select",
            SelectorStage::Table => "table_select",
        }
    }

    #[must_use]
    pub const fn filter_label(self) -> &'static str {
        match self {
            SelectorStage::Catalog => "Catalog filter",
            SelectorStage::Schema => "Schema filter",
            SelectorStage::Table => "Table filter",
        }
    }

    #[must_use]
    pub const fn select_label(self) -> &'static str {
        match self {
            SelectorStage::Catalog => "Catalog",
            SelectorStage::Schema => "Schema",
            SelectorStage::Table => "Table",
        }
    }
}

#[must_use]
pub fn show_catalogs_query() -> String {
    "SHOW CATALOGS".to_string()
}

#[must_use]
pub fn show_schemas_query(catalog: &str) -> String {
    format!("SHOW SCHEMAS IN {catalog}")
}

#[must_use]
pub fn show_tables_query(catalog: &str, schema: &str) -> String {
    format!("SHOW TABLES IN {catalog}.{schema}")
}

#[must_use]
pub fn first_column_values(table: &Table) -> Vec<String> {
    table.column_display_values(0)
}

pub fn table_name_values(table: &Table) -> Result<Vec<String>, WarehouseError> {
    if let Some(index) = table.column_index(TABLE_NAME_COLUMN) {
        return Ok(table.column_display_values(index));
    }
    if table.columns.len() < 2 {
        return Err(WarehouseError::query(format!(
            "SHOW TABLES result must carry a {TABLE_NAME_COLUMN} column or at least two columns, got {}",
            table.columns.len()
        )));
    }
    Ok(table.column_display_values(1))
}

#[must_use]
pub fn filter_candidates(candidates: &[String], filter: &str) -> Vec<String> {
    let needle = filter.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[must_use]
pub fn default_selection_index(stage: SelectorStage, filtered: &[String]) -> usize {
    if stage == SelectorStage::Table {
        if let Some(position) = filtered
            .iter()
            .position(|name| name == PREFERRED_TABLE_NAME)
        {
            return position;
        }
    }
    0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSelection {
    pub selected: String,
    pub selected_index: usize,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Selected(StageSelection),
    NoCandidates,
    NoFilterMatches,
}

#[must_use]
pub fn resolve_stage(
    stage: SelectorStage,
    candidates: &[String],
    filter: &str,
    requested: Option<&str>,
) -> StageOutcome {
    if candidates.is_empty() {
        return StageOutcome::NoCandidates;
    }

    let filtered = filter_candidates(candidates, filter);
    if filtered.is_empty() {
        return StageOutcome::NoFilterMatches;
    }

    let selected_index = requested
        .and_then(|name| filtered.iter().position(|candidate| candidate == name))
        .unwrap_or_else(|| default_selection_index(stage, &filtered));
    StageOutcome::Selected(StageSelection {
        selected: filtered[selected_index].clone(),
        selected_index,
        options: filtered,
    })
}
