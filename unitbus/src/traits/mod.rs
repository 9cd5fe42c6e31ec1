//! Traits every message type implements.
//!
//! *   [`BusMessage`]: Name and category of a message type.
//! *   [`Command`], [`CommandReply`] and [`Event`]: Category markers that decide
//!     which composer a type can be built with.
//! *   [`MessageBody`]: Object-safe view of a body stored in a [`Message`](crate::message::Message).

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

pub use bus_message::{BusMessage, Command, CommandReply, Event, MessageBody};

/// Defines [`BusMessage`] and the category markers.
mod bus_message;
