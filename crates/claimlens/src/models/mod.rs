pub mod claims;
pub mod envelope;

pub use claims::{
    CLAIM_RECORD_SCHEMA_VERSION, ClaimRecord, ClaimStatus, claim_status_key, json_schema,
};
pub use envelope::{
    COMMAND_ENVELOPE_SCHEMA_VERSION, CommandEnvelope, CommandEnvelopeError,
    CommandEnvelopeFailure, CommandEnvelopeMeta, CommandEnvelopeWarning,
};
