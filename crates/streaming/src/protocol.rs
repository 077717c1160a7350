//! Live-update protocol between the survey server and map clients.
//!
//! This module defines:
//! - The named events a client consumes (server → client)
//! - The `submission` event a client emits (client → server)
//! - The socket frame encoding shared by both directions
//!
//! A frame is a JSON array `["<event>", <payload>]`. Frames relayed through a
//! Socket.IO server may carry the numeric packet prefix (`42[...]`); decoding
//! accepts and strips it. `connect`/`disconnect` never travel as frames: the
//! transport synthesizes them from the socket lifecycle.

use foundation::MarkerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameError;

pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";
pub const EVENT_ALL_DATA: &str = "all_data";
pub const EVENT_DATA_UPDATED: &str = "data_updated";
pub const EVENT_DATA_REMOVED: &str = "data_removed";
pub const EVENT_DATA_RESPONSE: &str = "data_response";
pub const EVENT_SUBMISSION: &str = "submission";

/// Event delivered by the transport, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connect,
    Disconnect,
    /// Full snapshot: row-key → row object, as JSON text or decoded JSON.
    AllData(Value),
    /// Merge-only update, same payload shape as [`TransportEvent::AllData`].
    DataUpdated(Value),
    /// Offsets from the end of the visible sequence.
    DataRemoved(Value),
    /// Server acknowledgement; logged only.
    DataResponse(Value),
    Unknown { name: String, payload: Value },
}

impl TransportEvent {
    pub fn from_parts(name: &str, payload: Value) -> Self {
        match name {
            EVENT_CONNECT => Self::Connect,
            EVENT_DISCONNECT => Self::Disconnect,
            EVENT_ALL_DATA => Self::AllData(payload),
            EVENT_DATA_UPDATED => Self::DataUpdated(payload),
            EVENT_DATA_REMOVED => Self::DataRemoved(payload),
            EVENT_DATA_RESPONSE => Self::DataResponse(payload),
            _ => Self::Unknown {
                name: name.to_string(),
                payload,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Connect => EVENT_CONNECT,
            Self::Disconnect => EVENT_DISCONNECT,
            Self::AllData(_) => EVENT_ALL_DATA,
            Self::DataUpdated(_) => EVENT_DATA_UPDATED,
            Self::DataRemoved(_) => EVENT_DATA_REMOVED,
            Self::DataResponse(_) => EVENT_DATA_RESPONSE,
            Self::Unknown { name, .. } => name,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Connect | Self::Disconnect => None,
            Self::AllData(p)
            | Self::DataUpdated(p)
            | Self::DataRemoved(p)
            | Self::DataResponse(p) => Some(p),
            Self::Unknown { payload, .. } => Some(payload),
        }
    }
}

/// Decodes one socket text frame into an event.
pub fn decode_frame(text: &str) -> Result<TransportEvent, FrameError> {
    let body = text.trim().trim_start_matches(|c: char| c.is_ascii_digit());
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(mut parts) = value else {
        return Err(FrameError::NotAnEvent);
    };
    if parts.is_empty() {
        return Err(FrameError::NotAnEvent);
    }
    let payload = if parts.len() > 1 {
        parts.swap_remove(1)
    } else {
        Value::Null
    };
    match &parts[0] {
        Value::String(name) => Ok(TransportEvent::from_parts(name, payload)),
        _ => Err(FrameError::NotAnEvent),
    }
}

pub fn encode_frame(name: &str, payload: &Value) -> String {
    Value::Array(vec![Value::String(name.to_string()), payload.clone()]).to_string()
}

/// A field edit sent back to the server. Fire and forget: nothing waits for
/// an acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub row: MarkerId,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub verified: bool,
    pub markings: bool,
    pub signal: bool,
    pub other: String,
}

impl Submission {
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        let payload = serde_json::to_value(self)?;
        Ok(encode_frame(EVENT_SUBMISSION, &payload))
    }
}
