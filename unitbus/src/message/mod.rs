//! Message envelopes, meta information, type registration and the wire format.
//!
//! # Key Components
//!
//! *   [`Message`]: The envelope handed to handlers, carrying routing data and a
//!     typed body.
//! *   [`MessageMetaInformation`]: Process-local bookkeeping that travels beside a
//!     message through dispatch but never over the network.
//! *   [`MessageTypeRegistry`]: Maps message names to body types so that network
//!     messages can be rebuilt.
//! *   [`MessageContext`]: What a handler gets besides the body.

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

// --- Public Re-exports ---
pub use category::{MessageCategory, MessageKind};
pub use envelope::Message;
pub use message_context::MessageContext;
pub use message_error::{MessageError, RoutingError};
pub use meta_information::{
    CommandFailType, CommandMetaInformation, CommandReplyMetaInformation, DoneCallback,
    EventMetaInformation, FailCallback, MessageEntrypoint, MessageMetaInformation,
    MetaInformationKind,
};
pub use meta_information_list::{InFlightCommand, MessageMetaInformationList};
pub use payload::{MessagePayload, PayloadEntry};
pub use registry::{MessageTypeRegistry, RegisteredType};
pub use wire::WireEnvelope;

// --- Crate-Internal Re-exports ---
pub(crate) use envelope::{new_trace, new_unique};

// --- Submodules ---

mod category;
/// Defines [`Message`].
mod envelope;
/// Defines [`MessageContext`] passed to handlers.
mod message_context;
/// Defines [`MessageError`].
mod message_error;
mod meta_information;
/// Defines the in-flight command registry.
mod meta_information_list;
mod payload;
/// Defines [`MessageTypeRegistry`].
mod registry;
mod wire;
