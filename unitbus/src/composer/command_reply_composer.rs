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

use crate::common::{Channel, UnitId};
use crate::composer::{ComposeStage, MessageComposer};
use crate::message::{
    CommandReplyMetaInformation, Message, MessageEntrypoint, MessageError, MessageKind,
    MessageMetaInformation,
};
use crate::traits::CommandReply;

/// Composes the reply to a command. The target is derived from the command.
pub type CommandReplyComposer<M> = MessageComposer<M, CommandReplyStage>;

/// Reply-specific composer state.
#[derive(Debug)]
pub struct CommandReplyStage {
    unique: String,
    command_origin: UnitId,
    success: bool,
    message: String,
    handled_externally: bool,
}

impl CommandReplyStage {
    /// Captures what the reply needs from `command`.
    pub(crate) fn new(
        command: &Message,
        component: &UnitId,
        success: bool,
        message: String,
    ) -> Result<Self, MessageError> {
        let MessageKind::Command { unique } = command.kind() else {
            return Err(MessageError::NotACommand(command.name().to_string()));
        };
        Ok(Self {
            unique: unique.clone(),
            command_origin: command.origin().clone(),
            success,
            message,
            handled_externally: !command.originated_at(component),
        })
    }

    fn target(&self) -> Channel {
        if self.handled_externally {
            Channel::direct(&self.command_origin)
        } else {
            Channel::Local
        }
    }
}

impl ComposeStage for CommandReplyStage {
    fn compose(&mut self) -> MessageKind {
        MessageKind::CommandReply {
            unique: self.unique.clone(),
            success: self.success,
            message: self.message.clone(),
        }
    }

    fn meta_information(&mut self) -> MessageMetaInformation {
        MessageMetaInformation::command_reply(
            MessageEntrypoint::Local,
            CommandReplyMetaInformation {
                is_handled_externally: self.handled_externally,
            },
        )
    }
}

impl<M: CommandReply> MessageComposer<M, CommandReplyStage> {
    /// Emits the reply: locally when the command originated in this component,
    /// otherwise directly back to the command's origin.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownField`] if a field override names a missing field.
    pub fn emit(self) -> Result<Message, MessageError> {
        let target = self.stage.target();
        self.submit(target)
    }

    /// Whether the reply resolves a command sent by another component.
    #[must_use]
    pub const fn is_handled_externally(&self) -> bool {
        self.stage.handled_externally
    }
}
