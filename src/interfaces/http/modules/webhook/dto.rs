//! Webhook payload decoding
//!
//! The simulator posts loosely typed JSON: timestamps arrive as ISO-8601
//! strings or epoch milliseconds, coordinates as numbers or numeric strings.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq)]
pub enum EventDecodeError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unknown event_type `{0}`")]
    UnknownEventType(String),

    #[error("`{field}` is not an ISO-8601 timestamp or epoch milliseconds: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("`{field}` is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

/// A decoded simulator event
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Entry {
        license_plate: String,
        entry_time: DateTime<Utc>,
    },
    Parked {
        license_plate: String,
        lat: f64,
        lng: f64,
    },
    Exit {
        license_plate: String,
        exit_time: DateTime<Utc>,
    },
}

impl WebhookEvent {
    /// Decode `payload`; absent timestamps default to `received_at`.
    pub fn decode(payload: &Value, received_at: DateTime<Utc>) -> Result<Self, EventDecodeError> {
        let fields = payload.as_object().ok_or(EventDecodeError::NotAnObject)?;

        let event_type = fields
            .get("event_type")
            .and_then(Value::as_str)
            .ok_or(EventDecodeError::MissingField("event_type"))?;
        let license_plate = fields
            .get("license_plate")
            .and_then(Value::as_str)
            .ok_or(EventDecodeError::MissingField("license_plate"))?
            .to_string();

        match event_type.trim().to_ascii_uppercase().as_str() {
            "ENTRY" => Ok(Self::Entry {
                license_plate,
                entry_time: timestamp(fields, "entry_time")?.unwrap_or(received_at),
            }),
            "PARKED" => Ok(Self::Parked {
                license_plate,
                lat: number(fields, "lat")?,
                lng: number(fields, "lng")?,
            }),
            "EXIT" => Ok(Self::Exit {
                license_plate,
                exit_time: timestamp(fields, "exit_time")?.unwrap_or(received_at),
            }),
            _ => Err(EventDecodeError::UnknownEventType(event_type.to_string())),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Entry { .. } => "ENTRY",
            Self::Parked { .. } => "PARKED",
            Self::Exit { .. } => "EXIT",
        }
    }

    pub fn license_plate(&self) -> &str {
        match self {
            Self::Entry { license_plate, .. }
            | Self::Parked { license_plate, .. }
            | Self::Exit { license_plate, .. } => license_plate,
        }
    }
}

fn timestamp(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, EventDecodeError> {
    let invalid = |value: &Value| EventDecodeError::InvalidTimestamp {
        field,
        value: value.to_string(),
    };

    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| invalid(&Value::String(s.clone()))),
        Some(v @ Value::Number(n)) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(Some)
            .ok_or_else(|| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}

fn number(fields: &Map<String, Value>, field: &'static str) -> Result<f64, EventDecodeError> {
    let invalid = |value: &Value| EventDecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    };

    let parsed = match fields.get(field) {
        None | Some(Value::Null) => return Err(EventDecodeError::MissingField(field)),
        Some(v @ Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(v))?,
        Some(v @ Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid(v))?,
        Some(other) => return Err(invalid(other)),
    };

    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(invalid(&Value::String(parsed.to_string())))
    }
}

/// Documented shape of a webhook body. Decoding goes through
/// [`WebhookEvent::decode`], which is more lenient than this schema.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookPayload {
    /// `ENTRY`, `PARKED` or `EXIT`
    pub event_type: String,
    pub license_plate: String,
    /// ISO-8601 or epoch milliseconds; defaults to receipt time
    pub entry_time: Option<String>,
    /// ISO-8601 or epoch milliseconds; defaults to receipt time
    pub exit_time: Option<String>,
    /// Required for `PARKED`
    pub lat: Option<f64>,
    /// Required for `PARKED`
    pub lng: Option<f64>,
}

/// Acknowledgement returned for every accepted event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub event_type: String,
    pub license_plate: String,
}

impl From<&WebhookEvent> for WebhookAck {
    fn from(event: &WebhookEvent) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            license_plate: event.license_plate().to_string(),
        }
    }
}
