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

use crate::common::Channel;
use crate::composer::{ComposeStage, MessageComposer};
use crate::message::{Message, MessageEntrypoint, MessageError, MessageKind, MessageMetaInformation};
use crate::traits::Event;

/// Composes a fire-and-forget event.
pub type EventComposer<M> = MessageComposer<M, EventStage>;

/// Events add nothing to the base composer.
#[derive(Debug, Default)]
pub struct EventStage;

impl ComposeStage for EventStage {
    fn compose(&mut self) -> MessageKind {
        MessageKind::Event
    }

    fn meta_information(&mut self) -> MessageMetaInformation {
        MessageMetaInformation::event(MessageEntrypoint::Local)
    }
}

impl<M: Event> MessageComposer<M, EventStage> {
    /// Emits the event to `target`.
    ///
    /// # Errors
    ///
    /// [`MessageError::UnknownField`] if a field override names a missing field.
    pub fn emit(self, target: Channel) -> Result<Message, MessageError> {
        self.submit(target)
    }
}
