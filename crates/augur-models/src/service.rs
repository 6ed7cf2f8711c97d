//! Report service types.
//!
//! The server identifies each service by a string discriminant. Known
//! services map to a closed set of variants; anything else is kept as
//! [`ServiceType::Unknown`] so callers must handle it explicitly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Report service offered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceType {
    /// Twelve-month personalized love forecast
    LoveForecast12Month,
    /// Free-form question answered with an affinity reading
    AskAnyQuestion,
    /// Transit (fortune) report
    TransitReport,
    /// Compatibility report against a partner profile
    RelationshipCompatibility,
    /// Secret diary ("echo") entry
    AskSecretDiary,
    /// Discriminant not known to this client
    Unknown(String),
}

impl ServiceType {
    /// All known services.
    pub const KNOWN: &'static [ServiceType] = &[
        ServiceType::LoveForecast12Month,
        ServiceType::AskAnyQuestion,
        ServiceType::TransitReport,
        ServiceType::RelationshipCompatibility,
        ServiceType::AskSecretDiary,
    ];

    /// Parse a server discriminant; never fails.
    pub fn from_key(key: &str) -> Self {
        match key {
            "personalized_love_forecast_12mth" => ServiceType::LoveForecast12Month,
            "ask_any_question" => ServiceType::AskAnyQuestion,
            "transit_report" => ServiceType::TransitReport,
            "relationship_compatibility" => ServiceType::RelationshipCompatibility,
            "ask_secret_diary" => ServiceType::AskSecretDiary,
            other => ServiceType::Unknown(other.to_string()),
        }
    }

    /// Service key as used by the server and in price config keys.
    pub fn key(&self) -> &str {
        match self {
            ServiceType::LoveForecast12Month => "personalized_love_forecast_12mth",
            ServiceType::AskAnyQuestion => "ask_any_question",
            ServiceType::TransitReport => "transit_report",
            ServiceType::RelationshipCompatibility => "relationship_compatibility",
            ServiceType::AskSecretDiary => "ask_secret_diary",
            ServiceType::Unknown(key) => key,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ServiceType::Unknown(_))
    }

    /// Endpoint the generation request is posted to.
    ///
    /// `None` for unknown services, which cannot be submitted.
    pub fn submit_path(&self) -> Option<&'static str> {
        match self {
            ServiceType::LoveForecast12Month => Some("/v1/love-forecasts"),
            ServiceType::AskAnyQuestion => Some("/v1/questions"),
            ServiceType::TransitReport => Some("/v1/transit-reports"),
            ServiceType::RelationshipCompatibility => Some("/v1/relationship-compatibility"),
            ServiceType::AskSecretDiary => Some("/v1/secret-diary"),
            ServiceType::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Strict parse: rejects unknown discriminants.
impl FromStr for ServiceType {
    type Err = ServiceTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ServiceType::from_key(s) {
            ServiceType::Unknown(_) => Err(ServiceTypeParseError(s.to_string())),
            known => Ok(known),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unsupported report type: {0}")]
pub struct ServiceTypeParseError(String);

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ServiceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(ServiceType::from_key(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_roundtrip() {
        for service in ServiceType::KNOWN {
            assert_eq!(&ServiceType::from_key(service.key()), service);
            assert!(service.submit_path().is_some());
        }
    }

    #[test]
    fn test_unknown_key_is_preserved() {
        let service = ServiceType::from_key("tarot_spread");
        assert_eq!(service, ServiceType::Unknown("tarot_spread".to_string()));
        assert_eq!(service.key(), "tarot_spread");
        assert!(!service.is_known());
        assert!(service.submit_path().is_none());
        assert!("tarot_spread".parse::<ServiceType>().is_err());
    }

    #[test]
    fn test_serde_uses_server_discriminant() {
        let json = serde_json::to_string(&ServiceType::AskSecretDiary).unwrap();
        assert_eq!(json, "\"ask_secret_diary\"");

        let parsed: ServiceType = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(parsed, ServiceType::Unknown("something_new".to_string()));
    }
}
