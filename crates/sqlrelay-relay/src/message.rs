//! Messages exchanged with the host runtime

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as Json};
use sqlrelay_core::{Params, Result, SqlRelayError, Value};

/// A message as delivered by the host.
///
/// `topic` carries the SQL statement and `payload` the named parameters.
/// Every other field is kept as-is and travels with the result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub topic: Json,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub payload: Option<Json>,
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

// Distinguishes `"payload": null` (Some(Null)) from an absent payload (None)
fn present_field<'de, D>(deserializer: D) -> std::result::Result<Option<Json>, D::Error>
where
    D: Deserializer<'de>,
{
    Json::deserialize(deserializer).map(Some)
}

impl Message {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Json::String(topic.into()),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: Json) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach an extra field that is carried through untouched
    pub fn with_field(mut self, key: impl Into<String>, value: Json) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A validated query extracted from a [`Message`]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub statement: String,
    pub params: Option<Params>,
}

impl QueryRequest {
    /// Validate a message.
    ///
    /// The topic must be a non-empty string. The payload may be absent, but
    /// when present it must be an object; arrays, scalars and `null` are
    /// rejected.
    pub fn from_message(message: &Message) -> Result<Self> {
        let statement = match &message.topic {
            Json::String(s) if !s.is_empty() => s.clone(),
            _ => {
                return Err(SqlRelayError::Validation(
                    "topic should be a string containing the SQL query".into(),
                ));
            }
        };

        let params = match &message.payload {
            None => None,
            Some(Json::Object(map)) => Some(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect::<Params>(),
            ),
            Some(_) => {
                return Err(SqlRelayError::Validation(
                    "payload should be an object containing the query arguments".into(),
                ));
            }
        };

        Ok(Self { statement, params })
    }
}
