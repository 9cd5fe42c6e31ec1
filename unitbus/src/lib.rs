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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # unitbus
//!
//! A typed message bus for components that talk to each other both inside one
//! process and across a socket connection. Every message passes through a single
//! [`MessageBus`](common::MessageBus), which decides whether it reaches local
//! handlers, the network, or both.
//!
//! ## Key Concepts
//!
//! - **Messages**: Envelopes ([`Message`](message::Message)) carrying routing data
//!   and a typed body declared with [`bus_message`](prelude::bus_message). Bodies are
//!   commands, command replies or events.
//! - **Composers**: Builders obtained from a [`MessageBuilder`](composer::MessageBuilder)
//!   that stamp origin, hops and trace, attach callbacks and emit.
//! - **Dispatchers**: Per-category hooks around handler execution. The command
//!   dispatcher tracks in-flight commands and resolves each exactly once, by reply,
//!   timeout or handler failure.
//! - **Services**: Named tables of handlers matched by exact name or glob pattern.
//! - **Network**: A TCP client that carries JSON envelopes in length-prefixed frames
//!   to and from a server.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unitbus::prelude::*;
//!
//! #[bus_message(command = "command/ping")]
//! struct PingCommand;
//!
//! #[bus_message(reply = "command/ping/reply")]
//! struct PingReply;
//! ```

extern crate self as unitbus;

/// Component identity, configuration and the bus itself.
pub mod common;

/// Builders that turn bodies into emitted messages.
pub mod composer;

/// Per-category dispatch hooks.
pub mod dispatcher;

/// Envelopes, meta information, type registration and the wire format.
pub mod message;

/// Serialization, framing and the TCP transport.
pub mod network;

/// Routing decisions.
pub mod router;

/// Traits implemented by message types.
pub mod traits;

#[doc(hidden)]
pub mod __private {
    pub use serde;
}

/// A prelude module for conveniently importing the most commonly used items.
///
/// ## Macros (from `unitbus-macro`)
/// *   [`unitbus_macro::bus_message`]: Attribute macro for declaring message types.
///
/// ## Core Types
/// *   [`crate::common::MessageBus`]: The message bus.
/// *   [`crate::common::MessageService`]: A named group of handlers.
/// *   [`crate::common::BusConfig`]: Configuration.
/// *   [`crate::common::UnitId`] and [`crate::common::Channel`]: Addressing.
/// *   [`crate::composer::MessageBuilder`]: Entry point for composing messages.
/// *   [`crate::message::Message`]: The envelope handed to handlers.
/// *   [`crate::message::MessageContext`]: What a handler gets besides the body.
/// *   [`crate::message::MessageTypeRegistry`]: Message types known to this process.
pub mod prelude {
    pub use unitbus_macro::bus_message;

    pub use crate::common::{
        init_tracing, BusConfig, BusStats, Channel, ComponentData, MessageBus, MessageService,
        UnitId,
    };
    pub use crate::composer::{
        CommandComposer, CommandReplyComposer, EventComposer, MessageBuilder, MessageEmitter,
    };
    pub use crate::message::{
        CommandFailType, Message, MessageCategory, MessageContext, MessageEntrypoint,
        MessageError, MessageMetaInformation, MessagePayload, MessageTypeRegistry, PayloadEntry,
        RoutingError,
    };
    pub use crate::traits::{BusMessage, Command, CommandReply, Event, MessageBody};
}
