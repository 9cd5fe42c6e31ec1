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

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::common::{Channel, MessageBus};
use crate::composer::message_builder::EmitCounters;
use crate::message::{
    new_trace, Message, MessageError, MessageKind, MessageMetaInformation, MessagePayload,
    PayloadEntry,
};
use crate::traits::BusMessage;

/// Callback run on the finished message right before it is dispatched.
pub type BeforeCallback = Box<dyn FnOnce(&mut Message, &mut MessageMetaInformation) + Send>;

/// Category-specific steps of composing a message.
pub trait ComposeStage: Send {
    /// Checks the composer before anything is built. Problems are logged, not
    /// returned.
    fn verify(&self, _name: &str) {}

    /// Produces the category fields of the envelope.
    fn compose(&mut self) -> MessageKind;

    /// Produces the local bookkeeping for the message.
    fn meta_information(&mut self) -> MessageMetaInformation;
}

/// Accumulates everything needed to emit one message of type `M`.
///
/// The category aliases [`CommandComposer`](crate::composer::CommandComposer),
/// [`CommandReplyComposer`](crate::composer::CommandReplyComposer) and
/// [`EventComposer`](crate::composer::EventComposer) add their own builder methods
/// and `emit`. Composers are obtained from a
/// [`MessageBuilder`](crate::composer::MessageBuilder).
pub struct MessageComposer<M: BusMessage, S: ComposeStage> {
    bus: MessageBus,
    body: M,
    fields: Vec<(String, Value)>,
    chain: Option<(String, Vec<crate::common::UnitId>)>,
    payload: MessagePayload,
    before: Vec<BeforeCallback>,
    submitted: Arc<EmitCounters>,
    pub(crate) stage: S,
}

impl<M: BusMessage, S: ComposeStage> MessageComposer<M, S> {
    pub(crate) fn new(bus: MessageBus, body: M, stage: S, submitted: Arc<EmitCounters>) -> Self {
        Self {
            bus,
            body,
            fields: Vec::new(),
            chain: None,
            payload: MessagePayload::new(),
            before: Vec::new(),
            submitted,
            stage,
        }
    }

    /// Overrides a body field by name.
    ///
    /// Unknown names surface as [`MessageError::UnknownField`] when the message is
    /// emitted.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Links the new message to `predecessor`, inheriting its trace and hops.
    #[must_use]
    pub fn chain(mut self, predecessor: &Message) -> Self {
        self.chain = Some((predecessor.trace().to_string(), predecessor.hops().to_vec()));
        self
    }

    /// Adds an out-of-band payload entry.
    #[must_use]
    pub fn payload(mut self, key: impl Into<String>, entry: impl Into<PayloadEntry>) -> Self {
        self.payload.insert(key, entry);
        self
    }

    /// Registers a callback that may adjust the message and its meta information
    /// just before dispatch.
    #[must_use]
    pub fn before(
        mut self,
        callback: impl FnOnce(&mut Message, &mut MessageMetaInformation) + Send + 'static,
    ) -> Self {
        self.before.push(Box::new(callback));
        self
    }

    /// The body as composed so far.
    #[must_use]
    pub const fn body(&self) -> &M {
        &self.body
    }

    /// Mutable access to the body.
    pub fn body_mut(&mut self) -> &mut M {
        &mut self.body
    }

    /// Builds the message and hands it to the bus.
    ///
    /// Returns the message exactly as it was dispatched.
    pub(crate) fn submit(self, target: Channel) -> Result<Message, MessageError> {
        let Self {
            bus,
            body,
            fields,
            chain,
            payload,
            before,
            submitted,
            mut stage,
        } = self;

        stage.verify(M::NAME);
        let kind = stage.compose();
        let mut meta = stage.meta_information();

        let component = bus.component_id().clone();
        let (trace, hops) = match chain {
            Some((trace, mut hops)) => {
                if hops.last() != Some(&component) {
                    hops.push(component.clone());
                }
                (trace, hops)
            }
            None => (new_trace(), vec![component.clone()]),
        };

        let body = apply_fields(body, fields)?;
        let mut message = Message {
            name: M::NAME.to_string(),
            origin: component.clone(),
            sender: component,
            target,
            hops,
            trace,
            kind,
            body: Box::new(body),
            payload: MessagePayload::new(),
        };
        message.payload_mut().merge(payload);

        for callback in before {
            callback(&mut message, &mut meta);
        }

        let total = submitted.record(M::CATEGORY);
        trace!(message_name = M::NAME, trace = message.trace(), total, "emitting message");
        bus.dispatch(message.clone(), meta);
        Ok(message)
    }
}

impl<M: BusMessage, S: ComposeStage> fmt::Debug for MessageComposer<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageComposer")
            .field("name", &M::NAME)
            .field("body", &self.body)
            .field("fields", &self.fields)
            .field("chained", &self.chain.is_some())
            .field("payload", &self.payload.len())
            .field("before", &self.before.len())
            .finish_non_exhaustive()
    }
}

/// Applies named field overrides by round-tripping the body through JSON.
fn apply_fields<M: BusMessage>(body: M, fields: Vec<(String, Value)>) -> Result<M, MessageError> {
    if fields.is_empty() {
        return Ok(body);
    }
    let mut encoded = serde_json::to_value(&body)?;
    for (key, value) in fields {
        let slot = match &mut encoded {
            Value::Object(map) => map.get_mut(&key),
            _ => None,
        };
        match slot {
            Some(slot) => *slot = value,
            None => {
                return Err(MessageError::UnknownField {
                    message: M::NAME.to_string(),
                    field: key,
                })
            }
        }
    }
    serde_json::from_value(encoded).map_err(MessageError::from)
}
