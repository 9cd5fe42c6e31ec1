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

use crate::message::{Message, MessageCategory};

/// Where a message entered the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageEntrypoint {
    /// Composed inside this process.
    Local,
    /// Received from the network.
    Server,
}

/// How a command ended when it did not receive a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFailType {
    /// Not failed.
    None,
    /// No reply arrived before the deadline.
    Timeout,
    /// A handler or its context failed while processing the command.
    Exception,
    /// Reserved.
    Unknown,
}

impl fmt::Display for CommandFailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Timeout => "timeout",
            Self::Exception => "exception",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Called with `(reply, success, message)` once a command's reply arrives.
pub type DoneCallback = Arc<dyn Fn(&Message, bool, &str) + Send + Sync>;

/// Called with `(fail_type, message)` once a command fails without a reply.
pub type FailCallback = Arc<dyn Fn(CommandFailType, &str) + Send + Sync>;

/// Bookkeeping for a command: reply callbacks and timeout.
#[derive(Clone, Default)]
pub struct CommandMetaInformation {
    pub(crate) done: Vec<DoneCallback>,
    pub(crate) failed: Vec<FailCallback>,
    pub(crate) timeout: u64,
}

impl CommandMetaInformation {
    /// Creates meta information with the given timeout in seconds (0 disables it).
    #[must_use]
    pub fn new(timeout: u64) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Registers a done callback.
    pub fn add_done(&mut self, callback: DoneCallback) {
        self.done.push(callback);
    }

    /// Registers a fail callback.
    pub fn add_failed(&mut self, callback: FailCallback) {
        self.failed.push(callback);
    }

    /// Timeout in seconds; 0 means the command never times out.
    #[must_use]
    pub const fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Number of registered done callbacks.
    #[must_use]
    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    /// Number of registered fail callbacks.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl fmt::Debug for CommandMetaInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMetaInformation")
            .field("done", &self.done.len())
            .field("failed", &self.failed.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Bookkeeping for a command reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandReplyMetaInformation {
    /// Set when the reply answers a command that another component sent, so the
    /// local reply callbacks do not apply.
    pub is_handled_externally: bool,
}

/// Bookkeeping for an event. Events carry nothing beyond the common fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventMetaInformation;

/// Category-specific part of [`MessageMetaInformation`].
#[derive(Debug, Clone)]
pub enum MetaInformationKind {
    /// Command bookkeeping.
    Command(CommandMetaInformation),
    /// Reply bookkeeping.
    CommandReply(CommandReplyMetaInformation),
    /// Event bookkeeping.
    Event(EventMetaInformation),
}

/// Local-only information attached to a message for the duration of its dispatch.
///
/// Never transmitted. Created when a message is composed (entrypoint `Local`) or
/// decoded from the network (entrypoint `Server`).
#[derive(Debug, Clone)]
pub struct MessageMetaInformation {
    entrypoint: MessageEntrypoint,
    kind: MetaInformationKind,
}

impl MessageMetaInformation {
    /// Creates meta information for a command.
    #[must_use]
    pub fn command(entrypoint: MessageEntrypoint, meta: CommandMetaInformation) -> Self {
        Self {
            entrypoint,
            kind: MetaInformationKind::Command(meta),
        }
    }

    /// Creates meta information for a command reply.
    #[must_use]
    pub const fn command_reply(
        entrypoint: MessageEntrypoint,
        meta: CommandReplyMetaInformation,
    ) -> Self {
        Self {
            entrypoint,
            kind: MetaInformationKind::CommandReply(meta),
        }
    }

    /// Creates meta information for an event.
    #[must_use]
    pub const fn event(entrypoint: MessageEntrypoint) -> Self {
        Self {
            entrypoint,
            kind: MetaInformationKind::Event(EventMetaInformation),
        }
    }

    /// Where the message entered this process.
    #[must_use]
    pub const fn entrypoint(&self) -> MessageEntrypoint {
        self.entrypoint
    }

    /// Category-specific part.
    #[must_use]
    pub const fn kind(&self) -> &MetaInformationKind {
        &self.kind
    }

    /// Mutable category-specific part.
    pub fn kind_mut(&mut self) -> &mut MetaInformationKind {
        &mut self.kind
    }

    /// The category this meta information was built for.
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        match self.kind {
            MetaInformationKind::Command(_) => MessageCategory::Command,
            MetaInformationKind::CommandReply(_) => MessageCategory::CommandReply,
            MetaInformationKind::Event(_) => MessageCategory::Event,
        }
    }

    /// Only commands require a reply.
    #[must_use]
    pub const fn requires_reply(&self) -> bool {
        matches!(self.kind, MetaInformationKind::Command(_))
    }

    /// The command part, if this is command meta information.
    #[must_use]
    pub const fn as_command(&self) -> Option<&CommandMetaInformation> {
        match &self.kind {
            MetaInformationKind::Command(meta) => Some(meta),
            _ => None,
        }
    }

    /// The reply part, if this is reply meta information.
    #[must_use]
    pub const fn as_command_reply(&self) -> Option<&CommandReplyMetaInformation> {
        match &self.kind {
            MetaInformationKind::CommandReply(meta) => Some(meta),
            _ => None,
        }
    }
}
