use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CLAIM_RECORD_SCHEMA_VERSION: &str = "claimlens.claim-record.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Submitted,
    Approved,
    Denied,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub member_id: String,
    pub provider_id: String,
    pub provider_name: String,
    pub claim_status: ClaimStatus,
    pub claim_date: String,
    pub diagnosis_code: String,
    pub diagnosis_desc: String,
    pub total_charge: f64,
}

#[must_use]
pub const fn claim_status_key(status: ClaimStatus) -> &'static str {
    match status {
        ClaimStatus::Submitted => "submitted",
        ClaimStatus::Approved => "approved",
        ClaimStatus::Denied => "denied",
        ClaimStatus::Pending => "pending",
    }
}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(ClaimRecord);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated claim record schema: {error}");
        }
    }
}
