// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured `(id, params)` envelope carried inside command/status telegrams.
//!
//! Serialized as compact JSON: `{"id":"hardwaredetect","params":{...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::code::TelegramCode;
use crate::error::WireError;
use crate::telegram::Telegram;

/// Routing/correlation envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    #[serde(default = "empty_params")]
    params: Value,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

impl Message {
    pub fn new(id: impl Into<String>, params: Value) -> Self {
        Self { id: id.into(), params }
    }

    /// Message with an empty params object.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, empty_params())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn params(&self) -> &Value {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn set_params(&mut self, params: Value) {
        self.params = params;
    }

    /// Insert one param, turning non-object params into an object first.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.params.is_object() {
            self.params = empty_params();
        }
        if let Value::Object(map) = &mut self.params {
            map.insert(key.into(), value.into());
        }
        self
    }

    pub fn to_text(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(|e| WireError::FrameDecode(e.to_string()))
    }

    pub fn from_text(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(|e| WireError::FrameDecode(e.to_string()))
    }

    /// Serialize into a telegram, normally [`TelegramCode::Command`].
    pub fn to_telegram(&self, code: TelegramCode) -> Result<Telegram, WireError> {
        Telegram::text(code, &self.to_text()?)
    }

    pub fn from_telegram(telegram: &Telegram) -> Result<Self, WireError> {
        let text = telegram.to_text().map_err(|e| WireError::FrameDecode(e.to_string()))?;
        Self::from_text(text)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
