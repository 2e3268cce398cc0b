use crate::warehouse::{ScalarValue, Table, WarehouseError};

pub const PREVIEW_ROW_LIMIT: usize = 100;
pub const TOP_N_LIMIT: usize = 10;
pub const PROVIDER_MIN_CLAIMS: i64 = 3;

#[must_use]
pub fn table_fqn(catalog: &str, schema: &str, table: &str) -> String {
    format!("{catalog}.{schema}.{table}")
}

#[must_use]
pub fn preview_query(table_fqn: &str) -> String {
    format!("SELECT * FROM {table_fqn} LIMIT {PREVIEW_ROW_LIMIT}")
}

#[must_use]
pub fn kpi_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT
    COUNT(*) AS total_claims,
    SUM(COALESCE(total_charge, 0)) AS total_charges,
    COUNT(DISTINCT member_id) AS distinct_members,
    COUNT(DISTINCT provider_id) AS distinct_providers,
    SUM(CASE WHEN claim_status = 'denied' THEN 1 ELSE 0 END) * 1.0 / COUNT(*) AS denial_rate
FROM {table_fqn}"#
    )
}

#[must_use]
pub fn status_breakdown_query(table_fqn: &str) -> String {
    format!("SELECT claim_status, COUNT(*) AS n_claims FROM {table_fqn} GROUP BY claim_status")
}

#[must_use]
pub fn monthly_trend_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT
    substr(claim_date, 1, 7) AS month,
    SUM(total_charge) AS charges,
    SUM(CASE WHEN claim_status = 'denied' THEN total_charge ELSE 0 END) AS denied_amt
FROM {table_fqn}
GROUP BY month
ORDER BY month"#
    )
}

#[must_use]
pub fn denial_reasons_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT diagnosis_desc, COUNT(*) AS denied_claims
FROM {table_fqn}
WHERE claim_status = 'denied'
GROUP BY diagnosis_desc
ORDER BY denied_claims DESC
LIMIT {TOP_N_LIMIT}"#
    )
}

#[must_use]
pub fn provider_denial_rate_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT
    provider_name,
    SUM(CASE WHEN claim_status = 'denied' THEN 1 ELSE 0 END) * 1.0 / COUNT(*) AS denial_rate,
    COUNT(*) AS total
FROM {table_fqn}
GROUP BY provider_name
HAVING total >= {PROVIDER_MIN_CLAIMS}
ORDER BY denial_rate DESC
LIMIT {TOP_N_LIMIT}"#
    )
}

#[must_use]
pub fn diagnosis_cost_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT diagnosis_desc, COUNT(*) AS n_claims, SUM(total_charge) AS charges
FROM {table_fqn}
GROUP BY diagnosis_desc
ORDER BY charges DESC
LIMIT {TOP_N_LIMIT}"#
    )
}

#[must_use]
pub fn provider_leaderboard_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT provider_name, SUM(total_charge) AS charges, COUNT(*) AS n_claims
FROM {table_fqn}
GROUP BY provider_name
ORDER BY charges DESC
LIMIT {TOP_N_LIMIT}"#
    )
}

#[must_use]
pub fn outlier_claims_query(table_fqn: &str) -> String {
    format!(
        r#"SELECT *
FROM {table_fqn}
WHERE total_charge > (
    SELECT AVG(total_charge) + 3 * STDDEV(total_charge) FROM {table_fqn}
)
ORDER BY total_charge DESC
LIMIT {TOP_N_LIMIT}"#
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub total_claims: i64,
    pub total_charges: f64,
    pub distinct_members: i64,
    pub distinct_providers: i64,
    pub denial_rate: f64,
}

pub fn decode_kpi_summary(table: &Table) -> Result<KpiSummary, WarehouseError> {
    if table.row_count() != 1 {
        return Err(WarehouseError::query(format!(
            "KPI query must return exactly one row, got {}",
            table.row_count()
        )));
    }

    let total_claims = require_i64(table, "total_claims")?;
    if total_claims == 0 {
        return Err(WarehouseError::query(
            "KPI aggregates are undefined for an empty claims table",
        ));
    }

    Ok(KpiSummary {
        total_claims,
        total_charges: require_f64(table, "total_charges")?,
        distinct_members: require_i64(table, "distinct_members")?,
        distinct_providers: require_i64(table, "distinct_providers")?,
        denial_rate: require_f64(table, "denial_rate")?,
    })
}

#[must_use]
pub fn kpi_metrics(summary: &KpiSummary) -> Vec<(String, String)> {
    vec![
        ("Total Claims".to_string(), summary.total_claims.to_string()),
        ("Total Charges".to_string(), format_usd(summary.total_charges)),
        (
            "Unique Members".to_string(),
            summary.distinct_members.to_string(),
        ),
        (
            "Unique Providers".to_string(),
            summary.distinct_providers.to_string(),
        ),
        ("Denial Rate".to_string(), format_percent(summary.denial_rate)),
    ]
}

fn require_i64(table: &Table, column: &str) -> Result<i64, WarehouseError> {
    table
        .value(0, column)
        .and_then(ScalarValue::as_i64)
        .ok_or_else(|| {
            WarehouseError::query(format!("KPI column {column} is missing or not an integer"))
        })
}

fn require_f64(table: &Table, column: &str) -> Result<f64, WarehouseError> {
    table
        .value(0, column)
        .and_then(ScalarValue::as_f64)
        .ok_or_else(|| {
            WarehouseError::query(format!("KPI column {column} is missing or not numeric"))
        })
}

#[must_use]
pub fn format_usd(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = group_thousands(&(cents / 100).to_string());
    let fraction = cents % 100;
    if value < 0.0 && cents > 0 {
        format!("$-{whole}.{fraction:02}")
    } else {
        format!("${whole}.{fraction:02}")
    }
}

#[must_use]
pub fn format_percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut grouped = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 && (bytes.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*byte as char);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::{
        KpiSummary, decode_kpi_summary, format_percent, format_usd, kpi_metrics, kpi_query,
        outlier_claims_query, preview_query, provider_denial_rate_query, status_breakdown_query,
        table_fqn,
    };
    use crate::warehouse::{ScalarValue, Table, WarehouseError};

    fn kpi_table(
        total_claims: i64,
        total_charges: Option<f64>,
        denial_rate: Option<f64>,
    ) -> Table {
        Table::new(
            vec![
                "total_claims".to_string(),
                "total_charges".to_string(),
                "distinct_members".to_string(),
                "distinct_providers".to_string(),
                "denial_rate".to_string(),
            ],
            vec![vec![
                ScalarValue::Integer(total_claims),
                total_charges.map_or(ScalarValue::Null, ScalarValue::Real),
                ScalarValue::Integer(4),
                ScalarValue::Integer(3),
                denial_rate.map_or(ScalarValue::Null, ScalarValue::Real),
            ]],
        )
    }

    #[test]
    fn queries_substitute_the_selected_table() {
        let fqn = table_fqn("claims", "main", "claims_enriched");
        assert_eq!(
            preview_query(&fqn),
            "SELECT * FROM claims.main.claims_enriched LIMIT 100"
        );
        assert_eq!(
            status_breakdown_query(&fqn),
            "SELECT claim_status, COUNT(*) AS n_claims FROM claims.main.claims_enriched GROUP BY claim_status"
        );
        assert!(kpi_query(&fqn).contains("COUNT(DISTINCT provider_id) AS distinct_providers"));
        assert!(provider_denial_rate_query(&fqn).contains("HAVING total >= 3"));
        assert!(outlier_claims_query(&fqn).contains("3 * STDDEV(total_charge)"));
    }

    #[test]
    fn kpi_summary_decodes_one_row() {
        let summary = decode_kpi_summary(&kpi_table(12, Some(4321.5), Some(0.25)))
            .expect("summary should decode");
        assert_eq!(
            summary,
            KpiSummary {
                total_claims: 12,
                total_charges: 4321.5,
                distinct_members: 4,
                distinct_providers: 3,
                denial_rate: 0.25,
            }
        );
    }

    #[test]
    fn kpi_summary_rejects_empty_tables() {
        let error =
            decode_kpi_summary(&kpi_table(0, None, None)).expect_err("zero claims must fail");
        assert!(matches!(error, WarehouseError::Query { .. }));
        assert!(error.to_string().contains("empty claims table"));
    }

    #[test]
    fn kpi_summary_rejects_missing_rows_and_columns() {
        let no_rows = Table::new(vec!["total_claims".to_string()], Vec::new());
        assert!(decode_kpi_summary(&no_rows)
            .expect_err("zero rows must fail")
            .to_string()
            .contains("exactly one row"));

        let wrong_columns = Table::new(
            vec!["total_claims".to_string()],
            vec![vec![ScalarValue::Integer(5)]],
        );
        assert!(decode_kpi_summary(&wrong_columns)
            .expect_err("missing columns must fail")
            .to_string()
            .contains("total_charges"));
    }

    #[test]
    fn metrics_format_like_the_dashboard() {
        let summary = KpiSummary {
            total_claims: 1200,
            total_charges: 1234567.891,
            distinct_members: 310,
            distinct_providers: 42,
            denial_rate: 0.1234,
        };
        assert_eq!(
            kpi_metrics(&summary),
            vec![
                ("Total Claims".to_string(), "1200".to_string()),
                ("Total Charges".to_string(), "$1,234,567.89".to_string()),
                ("Unique Members".to_string(), "310".to_string()),
                ("Unique Providers".to_string(), "42".to_string()),
                ("Denial Rate".to_string(), "12.3%".to_string()),
            ]
        );
    }

    #[test]
    fn usd_formatting_groups_and_rounds() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(75.5), "$75.50");
        assert_eq!(format_usd(-1234.5), "$-1,234.50");
    }

    #[test]
    fn percent_formatting_keeps_one_decimal() {
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(0.3333), "33.3%");
        assert_eq!(format_percent(1.0), "100.0%");
    }
}
