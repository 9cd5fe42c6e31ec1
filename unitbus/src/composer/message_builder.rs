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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::common::MessageBus;
use crate::composer::{
    CommandComposer, CommandReplyComposer, CommandReplyStage, CommandStage, EventComposer,
    EventStage, MessageComposer,
};
use crate::message::{Message, MessageCategory, MessageError};
use crate::traits::{Command, CommandReply, Event};

#[derive(Debug, Default)]
pub(crate) struct EmitCounters {
    commands: AtomicUsize,
    replies: AtomicUsize,
    events: AtomicUsize,
}

impl EmitCounters {
    const fn counter(&self, category: MessageCategory) -> &AtomicUsize {
        match category {
            MessageCategory::Command => &self.commands,
            MessageCategory::CommandReply => &self.replies,
            MessageCategory::Event => &self.events,
        }
    }

    pub(crate) fn record(&self, category: MessageCategory) -> usize {
        self.counter(category).fetch_add(1, Ordering::Relaxed) + 1
    }

    fn get(&self, category: MessageCategory) -> usize {
        self.counter(category).load(Ordering::Relaxed)
    }
}

/// Factory for composers bound to one bus.
///
/// Two sets of counters are kept: composers built and messages actually handed to
/// the bus. Clones share both.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    bus: MessageBus,
    counters: Arc<EmitCounters>,
    submitted: Arc<EmitCounters>,
}

impl MessageBuilder {
    /// Creates a builder with zeroed counters.
    #[must_use]
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            counters: Arc::default(),
            submitted: Arc::default(),
        }
    }

    fn count(&self, category: MessageCategory, name: &str) {
        let total = self.counters.record(category);
        trace!(category = %category, message_name = name, total, "built composer");
    }

    /// Starts a command. The timeout defaults to `messaging.command_timeout_secs`.
    pub fn build_command<M: Command>(&self, body: M) -> CommandComposer<M> {
        self.count(MessageCategory::Command, M::NAME);
        let timeout = self.bus.config().messaging.command_timeout_secs;
        MessageComposer::new(
            self.bus.clone(),
            body,
            CommandStage::new(timeout),
            self.submitted_counters(),
        )
    }

    /// Starts the reply to `command`, chained onto it.
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
        let stage = CommandReplyStage::new(command, self.bus.component_id(), success, message.into())?;
        self.count(MessageCategory::CommandReply, M::NAME);
        let composer = MessageComposer::new(self.bus.clone(), body, stage, self.submitted_counters());
        Ok(composer.chain(command))
    }

    /// Starts an event.
    pub fn build_event<M: Event>(&self, body: M) -> EventComposer<M> {
        self.count(MessageCategory::Event, M::NAME);
        MessageComposer::new(self.bus.clone(), body, EventStage, self.submitted_counters())
    }

    /// Composers of `category` built so far.
    #[must_use]
    pub fn emitted(&self, category: MessageCategory) -> usize {
        self.counters.get(category)
    }

    /// Messages of `category` that were composed and handed to the bus.
    ///
    /// Unlike [`emitted`](Self::emitted) this ignores composers that were dropped
    /// or whose `emit` failed.
    #[must_use]
    pub fn submitted(&self, category: MessageCategory) -> usize {
        self.submitted.get(category)
    }

    fn submitted_counters(&self) -> Arc<EmitCounters> {
        Arc::clone(&self.submitted)
    }
}
