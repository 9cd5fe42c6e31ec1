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

use crate::common::MessageBus;
use crate::composer::{CommandComposer, CommandReplyComposer, EventComposer, MessageBuilder};
use crate::message::{Message, MessageCategory, MessageError};
use crate::traits::{Command, CommandReply, Event};

/// A [`MessageBuilder`] scoped to one handler invocation.
///
/// Each handler context gets a fresh emitter, so its counters describe only what
/// that handler emitted.
#[derive(Debug, Clone)]
pub struct MessageEmitter {
    builder: MessageBuilder,
}

impl MessageEmitter {
    /// Creates an emitter with a fresh builder.
    #[must_use]
    pub fn new(bus: MessageBus) -> Self {
        Self {
            builder: MessageBuilder::new(bus),
        }
    }

    /// See [`MessageBuilder::build_command`].
    pub fn build_command<M: Command>(&self, body: M) -> CommandComposer<M> {
        self.builder.build_command(body)
    }

    /// See [`MessageBuilder::build_command_reply`].
    ///
    /// # Errors
    ///
    /// [`MessageError::NotACommand`] if `command` is not a command.
    pub fn build_command_reply<M: CommandReply>(
        &self,
        command: &Message,
        body: M,
        success: bool,
        message: impl Into<String>,
    ) -> Result<CommandReplyComposer<M>, MessageError> {
        self.builder.build_command_reply(command, body, success, message)
    }

    /// See [`MessageBuilder::build_event`].
    pub fn build_event<M: Event>(&self, body: M) -> EventComposer<M> {
        self.builder.build_event(body)
    }

    /// Replies emitted through this emitter. Reply composers that were dropped
    /// or failed to emit are not counted.
    #[must_use]
    pub fn replies_emitted(&self) -> usize {
        self.builder.submitted(MessageCategory::CommandReply)
    }

    /// The underlying builder.
    #[must_use]
    pub const fn builder(&self) -> &MessageBuilder {
        &self.builder
    }
}
