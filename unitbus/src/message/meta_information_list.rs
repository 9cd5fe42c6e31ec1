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

use std::collections::HashMap;
use std::time::Duration;

use derive_new::new;
use tokio::time::Instant;
use tracing::trace;

use crate::message::CommandMetaInformation;

/// One command waiting for its reply.
#[derive(Debug, Clone, new)]
pub struct InFlightCommand {
    meta: CommandMetaInformation,
    timeout: u64,
    sequence: u64,
    #[new(value = "Instant::now()")]
    created: Instant,
}

impl InFlightCommand {
    /// Callbacks registered when the command was composed.
    #[must_use]
    pub const fn meta(&self) -> &CommandMetaInformation {
        &self.meta
    }

    /// Timeout in seconds; 0 disables expiry.
    #[must_use]
    pub const fn timeout(&self) -> u64 {
        self.timeout
    }

    /// When the command was registered.
    #[must_use]
    pub const fn created(&self) -> Instant {
        self.created
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.timeout > 0
            && now.saturating_duration_since(self.created) > Duration::from_secs(self.timeout)
    }
}

/// Registry of commands that are still waiting for a reply, keyed by `unique`.
#[derive(Debug, Default)]
pub struct MessageMetaInformationList {
    entries: HashMap<String, InFlightCommand>,
    next_sequence: u64,
}

impl MessageMetaInformationList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command. Returns `false` and leaves the existing entry alone if
    /// `unique` is already present.
    pub fn add(&mut self, unique: &str, meta: CommandMetaInformation) -> bool {
        if self.entries.contains_key(unique) {
            trace!(unique, "command already in flight, ignoring duplicate");
            return false;
        }
        let timeout = meta.timeout();
        let entry = InFlightCommand::new(meta, timeout, self.next_sequence);
        self.next_sequence += 1;
        self.entries.insert(unique.to_string(), entry);
        true
    }

    /// Looks up an in-flight command.
    #[must_use]
    pub fn find(&self, unique: &str) -> Option<&InFlightCommand> {
        self.entries.get(unique)
    }

    /// Removes an entry. Removing an unknown `unique` is a no-op.
    pub fn remove(&mut self, unique: &str) -> Option<InFlightCommand> {
        self.entries.remove(unique)
    }

    /// Returns the uniques of every entry whose timeout elapsed before `now`,
    /// oldest first.
    #[must_use]
    pub fn expired(&self, now: Instant) -> Vec<String> {
        let mut expired: Vec<(&String, &InFlightCommand)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .collect();
        expired.sort_by_key(|(_, entry)| (entry.created, entry.sequence));
        expired.into_iter().map(|(unique, _)| unique.clone()).collect()
    }

    /// Number of commands in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn duplicate_adds_keep_the_first_entry() {
        let mut list = MessageMetaInformationList::new();
        assert!(list.add("cmd_a", CommandMetaInformation::new(5)));
        assert!(!list.add("cmd_a", CommandMetaInformation::new(9)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.find("cmd_a").map(InFlightCommand::timeout), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_respects_timeout_and_order() {
        let mut list = MessageMetaInformationList::new();
        list.add("never", CommandMetaInformation::new(0));
        list.add("first", CommandMetaInformation::new(1));
        tokio::time::advance(Duration::from_millis(500)).await;
        list.add("second", CommandMetaInformation::new(1));

        assert!(list.expired(Instant::now()).is_empty());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(list.expired(Instant::now()), vec!["first", "second"]);

        list.remove("first");
        list.remove("first");
        assert_eq!(list.expired(Instant::now()), vec!["second"]);
        assert!(list.find("never").is_some());
    }
}
