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

use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

use crate::dispatcher::message_dispatcher::panic_message;
use crate::dispatcher::MessageDispatcher;
use crate::message::{
    CommandFailType, Message, MessageCategory, MessageContext, MessageEntrypoint, MessageError,
    MessageMetaInformation, MessageMetaInformationList,
};

/// Text delivered to fail callbacks when a command expires.
pub const COMMAND_TIMED_OUT: &str = "The command timed out";

/// Tracks commands sent from this component until they are resolved.
///
/// A command is resolved exactly once: by its reply, by its timeout, or by a
/// failing handler. Whichever comes first removes the in-flight entry, so later
/// outcomes find nothing to resolve.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    in_flight: Mutex<MessageMetaInformationList>,
}

impl CommandDispatcher {
    /// Creates a dispatcher with no commands in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the command registered under `unique`.
    ///
    /// With a reply, every done callback receives `(reply, success, message)`;
    /// without one, every fail callback receives `(fail_type, fail_message)`.
    /// Callback panics are logged and swallowed. Returns `false` when nothing was in
    /// flight under `unique`.
    pub fn invoke_reply_callback(
        &self,
        unique: &str,
        reply: Option<&Message>,
        fail_type: CommandFailType,
        fail_message: &str,
    ) -> bool {
        let removed = self.in_flight.lock().remove(unique);
        let Some(entry) = removed else {
            trace!(unique, "no command in flight, nothing to resolve");
            return false;
        };

        let meta = entry.meta();
        match reply {
            Some(reply) => {
                let success = reply.success().unwrap_or(false);
                let outcome = reply.outcome().unwrap_or_default();
                debug!(unique, success, "resolving command with its reply");
                for callback in &meta.done {
                    guard_callback(unique, || callback(reply, success, outcome));
                }
            }
            None => {
                debug!(unique, %fail_type, fail_message, "resolving command as failed");
                for callback in &meta.failed {
                    guard_callback(unique, || callback(fail_type, fail_message));
                }
            }
        }
        true
    }

    /// Number of commands waiting for a reply.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Returns `true` while `unique` awaits its reply.
    #[must_use]
    pub fn is_in_flight(&self, unique: &str) -> bool {
        self.in_flight.lock().find(unique).is_some()
    }

    /// Fails every command whose timeout elapsed before `now`.
    pub fn sweep(&self, now: Instant) {
        let expired = self.in_flight.lock().expired(now);
        for unique in expired {
            warn!(unique = %unique, "command timed out");
            self.invoke_reply_callback(&unique, None, CommandFailType::Timeout, COMMAND_TIMED_OUT);
        }
    }
}

impl MessageDispatcher for CommandDispatcher {
    fn category(&self) -> MessageCategory {
        MessageCategory::Command
    }

    fn pre_dispatch(&self, message: &Message, meta: &MessageMetaInformation) -> Result<(), MessageError> {
        self.verify_meta(meta)?;
        if meta.entrypoint() != MessageEntrypoint::Local {
            return Ok(());
        }
        if let (Some(unique), Some(command)) = (message.unique(), meta.as_command()) {
            if self.in_flight.lock().add(unique, command.clone()) {
                trace!(unique, timeout = command.timeout(), "command in flight");
            }
        }
        Ok(())
    }

    fn process(&self) {
        self.sweep(Instant::now());
    }

    fn context_error(
        &self,
        message: &Message,
        _meta: &MessageMetaInformation,
        context: &MessageContext,
        error: &anyhow::Error,
    ) {
        let Some(unique) = message.unique() else {
            return;
        };
        // A reply already queued resolves the command when it is delivered.
        if context.emitter().replies_emitted() > 0 {
            debug!(unique, "handler failed after replying, leaving the command to its reply");
            return;
        }
        self.invoke_reply_callback(unique, None, CommandFailType::Exception, &format!("{error:#}"));
    }
}

fn guard_callback(unique: &str, callback: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        error!(
            unique,
            "command callback panicked: {}",
            panic_message(panic.as_ref())
        );
    }
}
