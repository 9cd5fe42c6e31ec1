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

use serde::{Deserialize, Serialize};

/// The three message categories the bus distinguishes.
///
/// Each category has its own dispatcher and lifecycle: commands demand exactly one
/// reply, replies resolve commands, events are fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCategory {
    /// A request that must eventually receive one [`MessageCategory::CommandReply`].
    Command,
    /// The outcome of a command, correlated through its `unique`.
    CommandReply,
    /// A notification that requires no reply.
    Event,
}

impl MessageCategory {
    /// All categories, in dispatcher order.
    pub const ALL: [Self; 3] = [Self::Command, Self::CommandReply, Self::Event];

    /// Stable label used in logs and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::CommandReply => "CommandReply",
            Self::Event => "Event",
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific envelope fields.
///
/// This is the closed part of the message model; the typed body carried next to it
/// is the open part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Command fields.
    Command {
        /// Per-command correlation identifier.
        unique: String,
    },
    /// Command reply fields.
    CommandReply {
        /// Copied from the originating command.
        unique: String,
        /// Whether the command succeeded.
        success: bool,
        /// Human-readable outcome description.
        message: String,
    },
    /// Events carry no extra envelope fields.
    Event,
}

impl MessageKind {
    /// The category this kind belongs to.
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        match self {
            Self::Command { .. } => MessageCategory::Command,
            Self::CommandReply { .. } => MessageCategory::CommandReply,
            Self::Event => MessageCategory::Event,
        }
    }

    /// The correlation identifier for commands and replies.
    #[must_use]
    pub fn unique(&self) -> Option<&str> {
        match self {
            Self::Command { unique } | Self::CommandReply { unique, .. } => Some(unique),
            Self::Event => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_reports_its_category() {
        let command = MessageKind::Command {
            unique: "cmd_1".into(),
        };
        let reply = MessageKind::CommandReply {
            unique: "cmd_1".into(),
            success: true,
            message: String::new(),
        };
        assert_eq!(command.category(), MessageCategory::Command);
        assert_eq!(reply.category(), MessageCategory::CommandReply);
        assert_eq!(MessageKind::Event.category(), MessageCategory::Event);
        assert_eq!(command.unique(), reply.unique());
        assert_eq!(MessageKind::Event.unique(), None);
    }
}
