//! Result routing.
//!
//! Maps a finished usage record to the view that presents it and the typed
//! payload that view expects. The navigation layer consumes the serialized
//! form `{"targetView": ..., "payload": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use augur_models::{ServiceType, UsageRecord};

use crate::error::{FlowError, FlowResult};

/// Presentation that renders a finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetView {
    LoveForecastResult,
    AffinityResults,
    FortuneReportResult,
    RelationReportResult,
    EchoDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityResult {
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoDate {
    #[serde(rename = "dateString")]
    pub date_string: String,
}

/// Navigation target plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "targetView", content = "payload")]
pub enum Route {
    LoveForecastResult {
        result: Value,
    },
    AffinityResults {
        question: String,
        #[serde(rename = "affinityResult")]
        affinity_result: AffinityResult,
    },
    FortuneReportResult {
        result: Value,
    },
    RelationReportResult {
        result: Value,
        #[serde(rename = "partnerProfile")]
        partner_profile: Value,
    },
    EchoDetail {
        id: Value,
        date: EchoDate,
    },
}

impl Route {
    pub fn target_view(&self) -> TargetView {
        match self {
            Route::LoveForecastResult { .. } => TargetView::LoveForecastResult,
            Route::AffinityResults { .. } => TargetView::AffinityResults,
            Route::FortuneReportResult { .. } => TargetView::FortuneReportResult,
            Route::RelationReportResult { .. } => TargetView::RelationReportResult,
            Route::EchoDetail { .. } => TargetView::EchoDetail,
        }
    }
}

/// Compute the route for a finished record.
///
/// Unknown service types yield `Ok(None)` with a warning. A known type whose
/// response (or required request field) is missing or not JSON is a
/// [`FlowError::MalformedPayload`].
pub fn dispatch(record: &UsageRecord) -> FlowResult<Option<Route>> {
    let service = &record.service_type;
    if let ServiceType::Unknown(key) = service {
        warn!(service_type = %key, record_id = %record.id, "Unsupported report type");
        return Ok(None);
    }

    let result = parse_response(record)?;

    let route = match service {
        ServiceType::LoveForecast12Month => Route::LoveForecastResult { result },
        ServiceType::TransitReport => Route::FortuneReportResult { result },
        ServiceType::AskAnyQuestion => {
            let request = parse_request(record)?;
            let question = request
                .get("question")
                .and_then(Value::as_str)
                .ok_or_else(|| FlowError::malformed(service.key(), "request has no question"))?
                .to_string();
            Route::AffinityResults {
                question,
                affinity_result: AffinityResult { data: result },
            }
        }
        ServiceType::RelationshipCompatibility => {
            let partner_profile = parse_request(record)?.get("partner").cloned().unwrap_or(Value::Null);
            Route::RelationReportResult { result, partner_profile }
        }
        ServiceType::AskSecretDiary => {
            let id = result
                .get("id")
                .cloned()
                .ok_or_else(|| FlowError::malformed(service.key(), "response has no id"))?;
            let date_string = result
                .get("date")
                .and_then(Value::as_str)
                .ok_or_else(|| FlowError::malformed(service.key(), "response has no date"))?
                .to_string();
            Route::EchoDetail {
                id,
                date: EchoDate { date_string },
            }
        }
        ServiceType::Unknown(_) => return Ok(None),
    };

    debug!(record_id = %record.id, target_view = ?route.target_view(), "Record dispatched");
    Ok(Some(route))
}

fn parse_response(record: &UsageRecord) -> FlowResult<Value> {
    let key = record.service_type.key();
    let raw = record
        .ready_payload()
        .ok_or_else(|| FlowError::malformed(key, "response payload is empty"))?;
    serde_json::from_str(raw).map_err(|e| FlowError::malformed(key, format!("response is not JSON: {}", e)))
}

fn parse_request(record: &UsageRecord) -> FlowResult<Value> {
    let key = record.service_type.key();
    if record.request_payload.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&record.request_payload)
        .map_err(|e| FlowError::malformed(key, format!("request is not JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_echo_detail() {
        let record =
            UsageRecord::new("u-1", ServiceType::AskSecretDiary).with_response(r#"{"id":"42","date":"2024-01-01"}"#);

        let route = dispatch(&record).unwrap().unwrap();
        assert_eq!(
            route,
            Route::EchoDetail {
                id: json!("42"),
                date: EchoDate {
                    date_string: "2024-01-01".to_string()
                },
            }
        );
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            json!({"targetView": "EchoDetail", "payload": {"id": "42", "date": {"dateString": "2024-01-01"}}})
        );
    }

    #[test]
    fn test_unknown_type_has_no_target() {
        let record = UsageRecord::new("u-2", ServiceType::from_key("palm_reading")).with_response("{}");
        assert_eq!(dispatch(&record).unwrap(), None);
    }

    #[test]
    fn test_affinity_results_take_question_from_request() {
        let record = UsageRecord::new("u-3", ServiceType::AskAnyQuestion)
            .with_request(r#"{"question": "Will it rain?"}"#)
            .with_response(r#"{"score": 72}"#);

        let route = dispatch(&record).unwrap().unwrap();
        assert_eq!(route.target_view(), TargetView::AffinityResults);
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            json!({
                "targetView": "AffinityResults",
                "payload": {"question": "Will it rain?", "affinityResult": {"data": {"score": 72}}}
            })
        );
    }

    #[test]
    fn test_question_missing_is_malformed() {
        let record = UsageRecord::new("u-4", ServiceType::AskAnyQuestion)
            .with_request("{}")
            .with_response(r#"{"score": 1}"#);
        assert!(matches!(dispatch(&record), Err(FlowError::MalformedPayload { .. })));
    }

    #[test]
    fn test_relation_report_carries_partner() {
        let record = UsageRecord::new("u-5", ServiceType::RelationshipCompatibility)
            .with_request(r#"{"partner": {"name": "Sam", "birth_date": "1990-04-02"}}"#)
            .with_response(r#"{"match": "high"}"#);

        match dispatch(&record).unwrap().unwrap() {
            Route::RelationReportResult { result, partner_profile } => {
                assert_eq!(result, json!({"match": "high"}));
                assert_eq!(partner_profile["name"], "Sam");
            }
            other => panic!("unexpected route: {:?}", other),
        }
    }

    #[test]
    fn test_relation_report_without_partner() {
        let record =
            UsageRecord::new("u-6", ServiceType::RelationshipCompatibility).with_response(r#"{"match": "low"}"#);

        match dispatch(&record).unwrap().unwrap() {
            Route::RelationReportResult { partner_profile, .. } => assert_eq!(partner_profile, Value::Null),
            other => panic!("unexpected route: {:?}", other),
        }
    }

    #[test]
    fn test_forecast_and_transit_routes() {
        let forecast =
            UsageRecord::new("u-7", ServiceType::LoveForecast12Month).with_response(r#"{"months": []}"#);
        assert_eq!(
            dispatch(&forecast).unwrap().unwrap().target_view(),
            TargetView::LoveForecastResult
        );

        let transit = UsageRecord::new("u-8", ServiceType::TransitReport).with_response(r#"{"text": "ok"}"#);
        assert_eq!(
            dispatch(&transit).unwrap().unwrap(),
            Route::FortuneReportResult { result: json!({"text": "ok"}) }
        );
    }

    #[test]
    fn test_invalid_response_json_is_malformed() {
        let record = UsageRecord::new("u-9", ServiceType::TransitReport).with_response("not json");
        assert!(matches!(dispatch(&record), Err(FlowError::MalformedPayload { .. })));

        let pending = UsageRecord::new("u-10", ServiceType::TransitReport);
        assert!(matches!(dispatch(&pending), Err(FlowError::MalformedPayload { .. })));
    }
}
