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

use std::sync::Arc;

use static_assertions::assert_impl_all;
use tracing::{error, warn, Span};

use crate::common::{BusConfig, ComponentData, MessageBus, UnitId};
use crate::composer::MessageEmitter;
use crate::message::{Message, MessageEntrypoint, MessageError, MessageMetaInformation};
use crate::traits::CommandReply;

/// Everything a handler gets besides the message body.
///
/// A fresh context is built for every handler invocation. It carries a clone of
/// the triggering envelope, an emitter bound to this component for replying or
/// raising further messages, and a tracing span tagged with the message trace.
#[derive(Debug)]
pub struct MessageContext {
    message: Message,
    entrypoint: MessageEntrypoint,
    service: String,
    emitter: MessageEmitter,
    component: Arc<ComponentData>,
    span: Span,
    requires_reply: bool,
    errors: Vec<String>,
}

impl MessageContext {
    pub(crate) fn new(
        bus: &MessageBus,
        message: &Message,
        meta: &MessageMetaInformation,
        service: &str,
    ) -> Self {
        let span = tracing::info_span!(
            "handler",
            service,
            message_name = message.name(),
            trace = message.trace()
        );
        Self {
            message: message.clone(),
            entrypoint: meta.entrypoint(),
            service: service.to_string(),
            emitter: MessageEmitter::new(bus.clone()),
            component: bus.component_data(),
            span,
            requires_reply: false,
            errors: Vec::new(),
        }
    }

    /// The message being handled.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Where the message entered this process.
    #[must_use]
    pub const fn entrypoint(&self) -> MessageEntrypoint {
        self.entrypoint
    }

    /// Name of the service whose handler runs.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Emitter for messages raised while handling this one.
    #[must_use]
    pub const fn emitter(&self) -> &MessageEmitter {
        &self.emitter
    }

    /// Identity of this component.
    #[must_use]
    pub fn component_id(&self) -> &UnitId {
        self.component.id()
    }

    /// Configuration of this component.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        self.component.config()
    }

    /// Span tagged with the message trace; enter it for log lines that belong to
    /// this invocation.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Errors reported during this unit of work.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Replies to the command being handled.
    ///
    /// # Errors
    ///
    /// Fails when the message being handled is not a command, or when composing the
    /// reply fails.
    pub fn reply<R: CommandReply>(
        &self,
        body: R,
        success: bool,
        message: impl Into<String>,
    ) -> Result<Message, MessageError> {
        self.emitter
            .build_command_reply(&self.message, body, success, message)?
            .emit()
    }

    /// Starts the unit of work for one handler invocation.
    pub fn begin(&mut self, requires_reply: bool) {
        self.requires_reply = requires_reply;
        self.errors.clear();
    }

    /// Ends the unit of work, warning when a command went unanswered.
    pub fn end(&mut self) {
        if self.requires_reply && self.emitter.replies_emitted() == 0 {
            self.span.in_scope(|| {
                warn!(
                    message_name = self.message.name(),
                    unique = self.message.unique(),
                    failed = !self.errors.is_empty(),
                    "handler finished without replying to a command"
                );
            });
        }
    }

    /// Records a handler failure.
    pub fn report_error(&mut self, err: &anyhow::Error) {
        self.span.in_scope(|| {
            error!(message_name = self.message.name(), "handler failed: {err:#}");
        });
        self.errors.push(format!("{err:#}"));
    }
}

assert_impl_all!(MessageContext: Send);
