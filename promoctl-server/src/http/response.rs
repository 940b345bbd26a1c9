//! Success envelope: `{"ok": true, "message"?: ..., <key>: <entity>}`

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Successful response body
#[derive(Debug)]
pub struct Envelope<T> {
    message: Option<&'static str>,
    entity: Option<(&'static str, T)>,
}

impl<T> Envelope<T> {
    /// Body carrying `value` under `key`.
    pub fn data(key: &'static str, value: T) -> Self {
        Self {
            message: None,
            entity: Some((key, value)),
        }
    }

    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Envelope<()> {
    /// Body with a message and no entity, e.g. after a delete.
    pub fn message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            entity: None,
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("ok", &true)?;
        if let Some(message) = self.message {
            map.serialize_entry("message", message)?;
        }
        if let Some((key, value)) = &self.entity {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
