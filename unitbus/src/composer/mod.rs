//! Fluent construction of messages.
//!
//! A [`MessageBuilder`] hands out composers; a composer collects the body, field
//! overrides, payload, chain predecessor and callbacks, then `emit` runs the
//! category hooks and submits the message to the bus.

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

pub use command_composer::{CommandComposer, CommandStage};
pub use command_reply_composer::{CommandReplyComposer, CommandReplyStage};
pub use event_composer::{EventComposer, EventStage};
pub use message_builder::MessageBuilder;
pub use message_composer::{BeforeCallback, ComposeStage, MessageComposer};
pub use message_emitter::MessageEmitter;

mod command_composer;
mod command_reply_composer;
mod event_composer;
mod message_builder;
mod message_composer;
mod message_emitter;
