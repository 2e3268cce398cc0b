use claimlens::models::CommandEnvelope;
use claimlens::render::{InputState, RenderPlan};
use serde_json::Value;

#[test]
fn render_plan_schema_marks_core_fields_as_required() {
    let schema = RenderPlan::json_schema();
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .expect("schema must include required list");

    for field in ["title", "widgets", "issued_queries", "outcome"] {
        assert!(required.iter().any(|value| value.as_str() == Some(field)));
    }
}

#[test]
fn claim_record_schema_marks_every_column_as_required() {
    let schema = claimlens::models::json_schema();
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .expect("schema must include required list");

    for field in [
        "claim_id",
        "member_id",
        "provider_id",
        "provider_name",
        "claim_status",
        "claim_date",
        "diagnosis_code",
        "diagnosis_desc",
        "total_charge",
    ] {
        assert!(required.iter().any(|value| value.as_str() == Some(field)));
    }
}

#[test]
fn command_envelope_schema_marks_contract_fields_as_required() {
    let schema = CommandEnvelope::json_schema();
    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .expect("schema must include required list");

    for field in ["ok", "command", "generated_at_utc", "meta", "warnings"] {
        assert!(required.iter().any(|value| value.as_str() == Some(field)));
    }
    let optional = schema
        .get("properties")
        .and_then(Value::as_object)
        .expect("schema must describe properties");
    assert!(optional.contains_key("data"));
    assert!(optional.contains_key("error"));
}

#[test]
fn input_state_serialization_omits_missing_selections() {
    let value = serde_json::to_value(InputState::default())
        .expect("input state serialization should succeed");
    let object = value
        .as_object()
        .expect("serialized input state should be a json object");

    assert_eq!(
        object.get("catalog_filter").and_then(Value::as_str),
        Some("")
    );
    assert!(!object.contains_key("catalog_select"));
    assert!(!object.contains_key("schema_select"));
    assert!(!object.contains_key("table_select"));
}

#[test]
fn render_plans_round_trip_through_json() {
    let mut plan = RenderPlan::new("Claims Enriched Table Explorer");
    plan.record_query("SHOW CATALOGS");

    let encoded = serde_json::to_string(&plan).expect("plan serialization should succeed");
    let decoded: RenderPlan =
        serde_json::from_str(&encoded).expect("plan deserialization should succeed");
    assert_eq!(decoded, plan);
    assert!(decoded.outcome.is_completed());
}
