//! Catalog mapping message names to concrete body types.

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

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::message::{MessageCategory, MessageError};
use crate::network::{ClientConnectedEvent, ClientConnectionErrorEvent, ClientDisconnectedEvent};
use crate::traits::{BusMessage, MessageBody};

/// Rebuilds a typed body from the JSON fields carried on the wire.
type DeserializerFn = Arc<dyn Fn(Value) -> Result<Box<dyn MessageBody>, serde_json::Error> + Send + Sync>;

/// Everything the registry knows about one message type.
#[derive(Clone)]
pub struct RegisteredType {
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    category: MessageCategory,
    deserializer: DeserializerFn,
}

impl RegisteredType {
    fn of<M: BusMessage>() -> Self {
        let deserializer: DeserializerFn = Arc::new(
            |fields: Value| -> Result<Box<dyn MessageBody>, serde_json::Error> {
                // Unit structs encode as `null` but travel as an empty field set.
                let body: M = match serde_json::from_value(fields.clone()) {
                    Ok(body) => body,
                    Err(err) => match fields {
                        Value::Object(map) if map.is_empty() => {
                            serde_json::from_value(Value::Null).map_err(|_| err)?
                        }
                        _ => return Err(err),
                    },
                };
                Ok(Box::new(body))
            },
        );
        Self {
            name: M::NAME,
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            category: M::CATEGORY,
            deserializer,
        }
    }

    /// The registered message name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the body type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust path of the body type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Category of the body type.
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        self.category
    }

    /// Returns `true` if this entry describes `M`.
    #[must_use]
    pub fn is<M: BusMessage>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }
}

impl fmt::Debug for RegisteredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredType")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Maps message names to the body types they decode into.
///
/// Every concrete message type is registered once at start-up. The network engine
/// uses the registry to turn a wire name back into a typed body; registering a
/// second, different type under a taken name is rejected.
///
/// The registry is constructed explicitly and shared through an `Arc`, so each bus
/// (and each test) owns its own catalog.
///
/// ```rust,ignore
/// let registry = MessageTypeRegistry::new();
/// registry.register::<PingCommand>()?;
/// assert!(registry.is_registered("command/system/ping"));
/// ```
#[derive(Default)]
pub struct MessageTypeRegistry {
    types: DashMap<String, RegisteredType>,
}

impl fmt::Debug for MessageTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageTypeRegistry")
            .field("registered_types", &self.types.len())
            .finish()
    }
}

impl MessageTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Registers `M` under [`BusMessage::NAME`].
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`MessageError::DuplicateTypeRegistration`] if a different type already owns
    /// the name.
    pub fn register<M: BusMessage>(&self) -> Result<(), MessageError> {
        match self.types.entry(M::NAME.to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().is::<M>() {
                    trace!(message_name = M::NAME, "message type already registered");
                    Ok(())
                } else {
                    Err(MessageError::DuplicateTypeRegistration {
                        name: M::NAME.to_string(),
                        existing: existing.get().type_name,
                        requested: type_name::<M>(),
                    })
                }
            }
            Entry::Vacant(slot) => {
                debug!(message_name = M::NAME, category = %M::CATEGORY, "registered message type");
                slot.insert(RegisteredType::of::<M>());
                Ok(())
            }
        }
    }

    /// Registers the events the bus raises for transport state changes.
    ///
    /// # Errors
    ///
    /// Fails only if an application type already took one of the built-in names.
    pub fn register_builtin_message_types(&self) -> Result<(), MessageError> {
        self.register::<ClientConnectedEvent>()?;
        self.register::<ClientDisconnectedEvent>()?;
        self.register::<ClientConnectionErrorEvent>()?;
        Ok(())
    }

    /// Looks up the type registered under `name`.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<RegisteredType> {
        self.types.get(name).map(|entry| entry.value().clone())
    }

    /// Checks whether `name` is registered.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Rebuilds a typed body from its JSON fields.
    ///
    /// # Errors
    ///
    /// * [`MessageError::UnknownMessageType`] if `name` is not registered.
    /// * [`MessageError::Serialization`] if the fields do not decode into the type.
    pub fn deserialize(&self, name: &str, fields: Value) -> Result<Box<dyn MessageBody>, MessageError> {
        let deserializer = self
            .types
            .get(name)
            .map(|entry| Arc::clone(&entry.deserializer))
            .ok_or_else(|| MessageError::UnknownMessageType(name.to_string()))?;
        deserializer(fields).map_err(MessageError::from)
    }

    /// Encodes a body into its JSON fields.
    ///
    /// # Errors
    ///
    /// * [`MessageError::UnknownMessageType`] if the body's type is not registered.
    /// * [`MessageError::Serialization`] if encoding fails.
    pub fn serialize(&self, body: &dyn MessageBody) -> Result<Value, MessageError> {
        if !self.is_registered(body.body_name()) {
            return Err(MessageError::UnknownMessageType(body.body_name().to_string()));
        }
        body.to_value().map_err(MessageError::from)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn type_names(&self) -> impl Iterator<Item = String> + '_ {
        self.types.iter().map(|entry| entry.key().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[bus_message(command = "command/test/store")]
    struct StoreCommand {
        key: String,
        value: i64,
    }

    #[bus_message(command = "command/test/store")]
    struct ImpostorCommand {
        key: String,
    }

    #[bus_message(event = "event/test/tick")]
    struct TickEvent;

    #[test]
    fn registration_is_idempotent_per_type() -> anyhow::Result<()> {
        let registry = MessageTypeRegistry::new();
        registry.register::<StoreCommand>()?;
        registry.register::<StoreCommand>()?;
        assert_eq!(registry.len(), 1);

        let found = registry.find_type("command/test/store");
        assert!(found.as_ref().is_some_and(RegisteredType::is::<StoreCommand>));
        assert_eq!(found.map(|t| t.category()), Some(MessageCategory::Command));
        Ok(())
    }

    #[test]
    fn a_second_type_cannot_take_a_registered_name() -> anyhow::Result<()> {
        let registry = MessageTypeRegistry::new();
        registry.register::<StoreCommand>()?;
        let result = registry.register::<ImpostorCommand>();
        assert!(matches!(
            result,
            Err(MessageError::DuplicateTypeRegistration { ref name, .. }) if name == "command/test/store"
        ));
        assert!(registry.find_type("command/test/store").is_some_and(|t| t.is::<StoreCommand>()));
        Ok(())
    }

    #[test]
    fn deserializes_registered_bodies() -> anyhow::Result<()> {
        let registry = MessageTypeRegistry::new();
        registry.register::<StoreCommand>()?;
        registry.register::<TickEvent>()?;

        let body = registry.deserialize(
            "command/test/store",
            serde_json::json!({ "key": "answer", "value": 42 }),
        )?;
        let store = body.as_any().downcast_ref::<StoreCommand>();
        assert_eq!(store.map(|s| s.value), Some(42));

        let tick = registry.deserialize("event/test/tick", serde_json::json!({}))?;
        assert_eq!(tick.body_name(), "event/test/tick");

        assert!(matches!(
            registry.deserialize("event/test/unknown", serde_json::json!({})),
            Err(MessageError::UnknownMessageType(_))
        ));
        assert!(matches!(
            registry.deserialize("command/test/store", serde_json::json!({ "key": 1 })),
            Err(MessageError::Serialization(_))
        ));
        Ok(())
    }

    #[test]
    fn builtin_types_are_events() -> anyhow::Result<()> {
        let registry = MessageTypeRegistry::new();
        registry.register_builtin_message_types()?;
        assert_eq!(registry.len(), 3);
        let names: Vec<String> = registry.type_names().collect();
        assert!(names
            .iter()
            .filter_map(|name| registry.find_type(name))
            .all(|t| t.category() == MessageCategory::Event));
        Ok(())
    }
}
