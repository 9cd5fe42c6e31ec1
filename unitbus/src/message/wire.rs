/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::{Channel, UnitId};
use crate::message::{Message, MessageCategory, MessageError, MessageKind, MessagePayload, MessageTypeRegistry};

/// Keys owned by the envelope; a body field may not reuse them.
const ENVELOPE_KEYS: [&str; 10] = [
    "name", "origin", "sender", "target", "hops", "trace", "unique", "success", "message", "payload",
];

/// The JSON form of a [`Message`] as it crosses the network.
///
/// Body fields are flattened next to the envelope fields, so a `PingCommand`
/// carrying `{"echo": "hi"}` travels as
/// `{"name": "command/system/ping", ..., "unique": "cmd_...", "echo": "hi", "payload": {}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Registered message name.
    pub name: String,
    /// Component that started the chain.
    pub origin: UnitId,
    /// Component that last forwarded the message.
    pub sender: UnitId,
    /// Destination channel.
    pub target: Channel,
    /// Components the message passed through.
    pub hops: Vec<UnitId>,
    /// Chain identifier.
    pub trace: String,
    /// Command correlation id, present on commands and replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<String>,
    /// Reply outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Reply outcome description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Out-of-band entries.
    #[serde(default)]
    pub payload: MessagePayload,
    /// Type-specific body fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WireEnvelope {
    /// Flattens a message into its wire form.
    ///
    /// # Errors
    ///
    /// [`MessageError::Serialization`] when the body does not encode as an object or
    /// one of its fields collides with an envelope key, and
    /// [`MessageError::UnknownMessageType`] when the body type is not registered.
    pub fn from_message(message: &Message, registry: &MessageTypeRegistry) -> Result<Self, MessageError> {
        let fields = match registry.serialize(message.body())? {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                return Err(MessageError::Serialization(format!(
                    "body of '{}' must encode as an object, got {other}",
                    message.name()
                )))
            }
        };
        if let Some(key) = fields.keys().find(|key| ENVELOPE_KEYS.contains(&key.as_str())) {
            return Err(MessageError::Serialization(format!(
                "body field '{key}' of '{}' collides with an envelope field",
                message.name()
            )));
        }

        let (unique, success, outcome) = match message.kind() {
            MessageKind::Command { unique } => (Some(unique.clone()), None, None),
            MessageKind::CommandReply {
                unique,
                success,
                message,
            } => (Some(unique.clone()), Some(*success), Some(message.clone())),
            MessageKind::Event => (None, None, None),
        };

        Ok(Self {
            name: message.name().to_string(),
            origin: message.origin().clone(),
            sender: message.sender().clone(),
            target: message.target().clone(),
            hops: message.hops().to_vec(),
            trace: message.trace().to_string(),
            unique,
            success,
            message: outcome,
            payload: message.payload().clone(),
            fields,
        })
    }

    /// Rebuilds the typed message, resolving the body type by name.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownMessageType`] for unregistered names and
    /// [`MessageError::Serialization`] for missing correlation fields or bodies
    /// that do not decode.
    pub fn into_message(self, registry: &MessageTypeRegistry) -> Result<Message, MessageError> {
        let registered = registry
            .find_type(&self.name)
            .ok_or_else(|| MessageError::UnknownMessageType(self.name.clone()))?;

        let kind = match registered.category() {
            MessageCategory::Command => MessageKind::Command {
                unique: self.require_unique()?,
            },
            MessageCategory::CommandReply => MessageKind::CommandReply {
                unique: self.require_unique()?,
                success: self.success.unwrap_or(false),
                message: self.message.clone().unwrap_or_default(),
            },
            MessageCategory::Event => MessageKind::Event,
        };
        let body = registry.deserialize(&self.name, Value::Object(self.fields))?;

        Ok(Message {
            name: self.name,
            origin: self.origin,
            sender: self.sender,
            target: self.target,
            hops: self.hops,
            trace: self.trace,
            kind,
            body,
            payload: self.payload,
        })
    }

    /// Encodes the envelope as JSON bytes.
    ///
    /// # Errors
    ///
    /// Fails if JSON encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        serde_json::to_vec(self).map_err(MessageError::from)
    }

    /// Decodes an envelope from JSON bytes.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not a valid envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(bytes).map_err(MessageError::from)
    }

    fn require_unique(&self) -> Result<String, MessageError> {
        self.unique.clone().ok_or_else(|| {
            MessageError::Serialization(format!("'{}' arrived without a unique", self.name))
        })
    }
}
