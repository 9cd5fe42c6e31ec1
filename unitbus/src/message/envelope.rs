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

use static_assertions::assert_impl_all;

use crate::common::{Channel, UnitId};
use crate::message::{MessageCategory, MessageKind, MessagePayload};
use crate::traits::{BusMessage, MessageBody};

/// The envelope every message travels in.
///
/// An envelope pairs the category-specific [`MessageKind`] fields with a typed
/// body and the routing metadata shared by all categories. Envelopes are created by
/// composers or rebuilt from wire data by the network engine; user code reads them
/// in handlers and callbacks.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) name: String,
    pub(crate) origin: UnitId,
    pub(crate) sender: UnitId,
    pub(crate) target: Channel,
    pub(crate) hops: Vec<UnitId>,
    pub(crate) trace: String,
    pub(crate) kind: MessageKind,
    pub(crate) body: Box<dyn MessageBody>,
    pub(crate) payload: MessagePayload,
}

impl Message {
    /// Stable type tag of the body.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The category, derived from the envelope kind.
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        self.kind.category()
    }

    /// Category-specific envelope fields.
    #[must_use]
    pub const fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// Component that started the causal chain.
    #[must_use]
    pub const fn origin(&self) -> &UnitId {
        &self.origin
    }

    /// Component that most recently forwarded the message.
    #[must_use]
    pub const fn sender(&self) -> &UnitId {
        &self.sender
    }

    /// Destination channel.
    #[must_use]
    pub const fn target(&self) -> &Channel {
        &self.target
    }

    /// Redirects the message. Only meaningful before it is dispatched.
    pub fn set_target(&mut self, target: Channel) {
        self.target = target;
    }

    /// Components the message has passed through, oldest first.
    #[must_use]
    pub fn hops(&self) -> &[UnitId] {
        &self.hops
    }

    pub(crate) fn push_hop(&mut self, hop: UnitId) {
        self.hops.push(hop);
    }

    /// Identifier shared across a causally linked chain of messages.
    #[must_use]
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// Correlation identifier of commands and replies.
    #[must_use]
    pub fn unique(&self) -> Option<&str> {
        self.kind.unique()
    }

    /// Reply outcome flag; `None` for other categories.
    #[must_use]
    pub const fn success(&self) -> Option<bool> {
        match &self.kind {
            MessageKind::CommandReply { success, .. } => Some(*success),
            _ => None,
        }
    }

    /// Reply outcome description; `None` for other categories.
    #[must_use]
    pub fn outcome(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::CommandReply { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Out-of-band payload entries.
    #[must_use]
    pub const fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Mutable access to the payload.
    pub fn payload_mut(&mut self) -> &mut MessagePayload {
        &mut self.payload
    }

    /// The body as a trait object.
    #[must_use]
    pub fn body(&self) -> &dyn MessageBody {
        self.body.as_ref()
    }

    /// Downcasts the body to a concrete message type.
    #[must_use]
    pub fn body_as<T: BusMessage>(&self) -> Option<&T> {
        self.body.as_ref().as_any().downcast_ref::<T>()
    }

    /// Mutably downcasts the body to a concrete message type.
    pub fn body_as_mut<T: BusMessage>(&mut self) -> Option<&mut T> {
        self.body.as_mut().as_any_mut().downcast_mut::<T>()
    }

    /// Returns `true` when the message was composed by `component` itself.
    #[must_use]
    pub fn originated_at(&self, component: &UnitId) -> bool {
        &self.origin == component
    }
}

assert_impl_all!(Message: Send, Sync, Clone);

/// Generates a fresh trace identifier.
pub(crate) fn new_trace() -> String {
    use mti::prelude::*;
    "trace".create_type_id::<V7>().to_string()
}

/// Generates a fresh command correlation identifier.
pub(crate) fn new_unique() -> String {
    use mti::prelude::*;
    "cmd".create_type_id::<V7>().to_string()
}
