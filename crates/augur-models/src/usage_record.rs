//! Usage history records.
//!
//! A usage record is the persisted row for one service invocation. Its
//! response payload stays empty until the server finishes generating the
//! report, which is how polling detects completion.

use serde::{Deserialize, Serialize};

use crate::credit::CreditJournalEntry;
use crate::service::ServiceType;

/// One service invocation and its (eventually present) result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    pub service_type: ServiceType,
    /// JSON-encoded request body as submitted
    #[serde(default, rename = "request_data")]
    pub request_payload: String,
    /// JSON-encoded result, absent while the job is pending
    #[serde(default, rename = "response_data", skip_serializing_if = "Option::is_none")]
    pub response_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_journal: Option<CreditJournalEntry>,
}

impl UsageRecord {
    pub fn new(id: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            id: id.into(),
            service_type,
            request_payload: String::new(),
            response_payload: None,
            credit_journal: None,
        }
    }

    pub fn with_request(mut self, payload: impl Into<String>) -> Self {
        self.request_payload = payload.into();
        self
    }

    pub fn with_response(mut self, payload: impl Into<String>) -> Self {
        self.response_payload = Some(payload.into());
        self
    }

    /// The populated response payload, if the job has finished.
    ///
    /// Blank strings and JSON `null` count as not ready.
    pub fn ready_payload(&self) -> Option<&str> {
        self.response_payload
            .as_deref()
            .map(str::trim)
            .filter(|payload| !payload.is_empty() && *payload != "null")
    }

    pub fn is_ready(&self) -> bool {
        self.ready_payload().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_record_from_wire() {
        let record: UsageRecord = serde_json::from_str(
            r#"{"id": "u-1", "service_type": "transit_report", "request_data": "{}", "response_data": null}"#,
        )
        .unwrap();
        assert_eq!(record.service_type, ServiceType::TransitReport);
        assert!(!record.is_ready());
    }

    #[test]
    fn test_ready_record_from_wire() {
        let record: UsageRecord = serde_json::from_str(
            r#"{
                "id": "u-2",
                "service_type": "ask_secret_diary",
                "request_data": "{\"entry\":\"hi\"}",
                "response_data": "{\"id\":\"42\",\"date\":\"2024-01-01\"}",
                "credit_journal": {"credits_before": 5, "credits_used": 1, "credits_after": 4, "credit_type": "silver"}
            }"#,
        )
        .unwrap();
        assert_eq!(record.ready_payload(), Some(r#"{"id":"42","date":"2024-01-01"}"#));
        assert!(record.credit_journal.unwrap().is_consistent());
    }

    #[test]
    fn test_blank_payloads_are_not_ready() {
        let base = UsageRecord::new("u-3", ServiceType::TransitReport);
        assert!(!base.clone().with_response("").is_ready());
        assert!(!base.clone().with_response("  ").is_ready());
        assert!(!base.clone().with_response("null").is_ready());
        assert!(base.with_response("{}").is_ready());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: UsageRecord =
            serde_json::from_str(r#"{"id": "u-4", "service_type": "unknown_type"}"#).unwrap();
        assert_eq!(record.request_payload, "");
        assert!(record.response_payload.is_none());
        assert!(!record.service_type.is_known());
    }
}
