use crate::determinism::json_canonical;
use crate::documents::model::{DocumentId, OwnerId};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    DocumentSubmitted,
    DocumentStateChanged,
    DocumentFailed,
    DocumentCancelled,
    TransactionRecategorized,
    InsightsGenerated,
    DisputeGenerated,
    DisputeStatusChanged,
}

impl AuditEventType {
    pub fn required_detail_keys(&self) -> &'static [&'static str] {
        match self {
            AuditEventType::DocumentSubmitted => &["document_type", "media_type", "size_bytes", "sha256"],
            AuditEventType::DocumentStateChanged => &["from_state", "to_state", "step"],
            AuditEventType::DocumentFailed => &["step", "error_kind", "message"],
            AuditEventType::DocumentCancelled => &["requested_in_state"],
            AuditEventType::TransactionRecategorized => &["transaction_id", "from_category", "to_category"],
            AuditEventType::InsightsGenerated => &["generation", "insight_count"],
            AuditEventType::DisputeGenerated => &[
                "dispute_id",
                "transaction_id",
                "reason_code",
                "version",
                "amount_cents",
                "letter_sha256",
            ],
            AuditEventType::DisputeStatusChanged => &["dispute_id", "from_status", "to_status"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub ts_utc: String, // RFC3339 UTC
    pub event_type: AuditEventType,
    pub document_id: String,
    pub owner_id: String,
    pub actor: Actor,
    /// Integer-only JSON; money is recorded in cents.
    pub details: serde_json::Value,
    pub prev_event_hash: String,
    pub event_hash: String,
}

pub const ZERO_HASH_64: &str = "0000000000000000000000000000000000000000000000000000000000000000";

impl AuditEvent {
    pub fn now(
        event_type: AuditEventType,
        document_id: &DocumentId,
        owner_id: &OwnerId,
        actor: Actor,
        details: serde_json::Value,
    ) -> CoreResult<Self> {
        let ts_utc = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| CoreError::InvalidInput(format!("timestamp format: {}", e)))?;
        Ok(Self {
            ts_utc,
            event_type,
            document_id: document_id.to_string(),
            owner_id: owner_id.to_string(),
            actor,
            details,
            prev_event_hash: ZERO_HASH_64.to_string(),
            event_hash: ZERO_HASH_64.to_string(),
        })
    }
}

/// SHA-256 over the canonical envelope with `event_hash` zeroed.
pub fn compute_event_hash(event: &AuditEvent) -> CoreResult<String> {
    let mut e = event.clone();
    e.event_hash = ZERO_HASH_64.to_string();
    let bytes = json_canonical::to_canonical_bytes(&e)?;
    let mut h = Sha256::new();
    h.update(bytes);
    Ok(hex::encode(h.finalize()))
}

pub fn finalize_event(mut event: AuditEvent) -> CoreResult<AuditEvent> {
    if event.prev_event_hash.len() != 64
        || !event.prev_event_hash.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(CoreError::InvalidInput(
            "prev_event_hash must be 64 hex chars".to_string(),
        ));
    }
    validate_details(&event)?;
    event.event_hash = compute_event_hash(&event)?;
    Ok(event)
}

fn validate_details(event: &AuditEvent) -> CoreResult<()> {
    for k in event.event_type.required_detail_keys() {
        if event.details.get(*k).is_none() {
            return Err(CoreError::InvalidInput(format!(
                "event {:?} missing details.{}",
                event.event_type, k
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submitted(details: serde_json::Value) -> AuditEvent {
        AuditEvent::now(
            AuditEventType::DocumentSubmitted,
            &DocumentId::from("doc_1"),
            &OwnerId::from("u1"),
            Actor::User,
            details,
        )
        .unwrap()
    }

    #[test]
    fn missing_detail_key_is_rejected() {
        let e = submitted(json!({"document_type": "receipt"}));
        assert!(finalize_event(e).is_err());
    }

    #[test]
    fn float_details_are_rejected() {
        let e = submitted(json!({
            "document_type": "receipt",
            "media_type": "png",
            "size_bytes": 10,
            "sha256": "ab",
            "amount": 1.5
        }));
        assert!(matches!(finalize_event(e), Err(CoreError::DeterminismViolation(_))));
    }

    #[test]
    fn hash_ignores_stored_event_hash() {
        let e = finalize_event(submitted(json!({
            "document_type": "receipt",
            "media_type": "png",
            "size_bytes": 10,
            "sha256": "ab"
        })))
        .unwrap();
        assert_eq!(compute_event_hash(&e).unwrap(), e.event_hash);
        assert_eq!(
            serde_json::to_value(e.event_type).unwrap(),
            json!("DOCUMENT_SUBMITTED")
        );
    }
}
