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

use tracing::warn;

use crate::common::Channel;
use crate::composer::{ComposeStage, MessageComposer};
use crate::message::{
    new_unique, CommandFailType, CommandMetaInformation, Message, MessageEntrypoint, MessageError,
    MessageKind, MessageMetaInformation,
};
use crate::traits::Command;

/// Composes a command and collects the callbacks that resolve it.
pub type CommandComposer<M> = MessageComposer<M, CommandStage>;

/// Command-specific composer state.
#[derive(Debug)]
pub struct CommandStage {
    meta: CommandMetaInformation,
}

impl CommandStage {
    pub(crate) fn new(timeout: u64) -> Self {
        Self {
            meta: CommandMetaInformation::new(timeout),
        }
    }
}

impl ComposeStage for CommandStage {
    fn verify(&self, name: &str) {
        if self.meta.timeout() > 0 && self.meta.failed_count() == 0 {
            warn!(
                message_name = name,
                timeout = self.meta.timeout(),
                "command has a timeout but no fail callback; a timeout will go unnoticed"
            );
        }
    }

    fn compose(&mut self) -> MessageKind {
        MessageKind::Command {
            unique: new_unique(),
        }
    }

    fn meta_information(&mut self) -> MessageMetaInformation {
        MessageMetaInformation::command(MessageEntrypoint::Local, std::mem::take(&mut self.meta))
    }
}

impl<M: Command> MessageComposer<M, CommandStage> {
    /// Registers a callback invoked with `(reply, success, message)` when the
    /// reply arrives.
    #[must_use]
    pub fn done(mut self, callback: impl Fn(&Message, bool, &str) + Send + Sync + 'static) -> Self {
        self.stage.meta.add_done(Arc::new(callback));
        self
    }

    /// Registers a callback invoked with `(fail_type, message)` when the command
    /// fails without a reply.
    #[must_use]
    pub fn failed(
        mut self,
        callback: impl Fn(CommandFailType, &str) + Send + Sync + 'static,
    ) -> Self {
        self.stage.meta.add_failed(Arc::new(callback));
        self
    }

    /// Sets the timeout in seconds; 0 disables it.
    #[must_use]
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.stage.meta.timeout = seconds;
        self
    }

    /// Emits the command to `target`.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownField`] if a field override names a missing field.
    pub fn emit(self, target: Channel) -> Result<Message, MessageError> {
        self.submit(target)
    }
}
