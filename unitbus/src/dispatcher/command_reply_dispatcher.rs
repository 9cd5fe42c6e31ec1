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

use tracing::trace;

use crate::dispatcher::{CommandDispatcher, MessageDispatcher};
use crate::message::{CommandFailType, Message, MessageCategory, MessageError, MessageMetaInformation};

/// Resolves commands as their replies pass through the bus.
#[derive(Debug, Clone)]
pub struct CommandReplyDispatcher {
    commands: Arc<CommandDispatcher>,
}

impl CommandReplyDispatcher {
    /// Creates a reply dispatcher resolving commands tracked by `commands`.
    #[must_use]
    pub const fn new(commands: Arc<CommandDispatcher>) -> Self {
        Self { commands }
    }
}

impl MessageDispatcher for CommandReplyDispatcher {
    fn category(&self) -> MessageCategory {
        MessageCategory::CommandReply
    }

    /// Invokes the command's callbacks before any handler runs, so callers are
    /// resolved whether or not a handler exists for the reply.
    fn pre_dispatch(&self, message: &Message, meta: &MessageMetaInformation) -> Result<(), MessageError> {
        self.verify_meta(meta)?;
        if meta.as_command_reply().is_some_and(|reply| reply.is_handled_externally) {
            trace!(message_name = message.name(), "reply resolves a foreign command");
            return Ok(());
        }
        if let Some(unique) = message.unique() {
            self.commands
                .invoke_reply_callback(unique, Some(message), CommandFailType::None, "");
        }
        Ok(())
    }
}
