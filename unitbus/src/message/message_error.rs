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

use thiserror::Error;

use crate::message::MessageCategory;

/// Errors raised while registering, composing, routing or transporting messages.
///
/// Registration errors are fatal at start-up, composition errors are fatal to the
/// single `emit` call that produced them, and routing errors abandon delivery of a
/// single message while the bus keeps running.
#[derive(Debug, Error)]
pub enum MessageError {
    /// A different type was registered under a name that is already taken.
    #[error("message name '{name}' is already registered to {existing}, refusing {requested}")]
    DuplicateTypeRegistration {
        /// The contested message name.
        name: String,
        /// Rust type already bound to the name.
        existing: &'static str,
        /// Rust type that attempted to take the name.
        requested: &'static str,
    },

    /// No type is registered under the given name.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A field override named a field the message type does not have.
    #[error("message '{message}' has no field named '{field}'")]
    UnknownField {
        /// Name of the message being composed.
        message: String,
        /// The offending field key.
        field: String,
    },

    /// The meta information kind does not belong to the message category.
    #[error("expected {expected} meta information, found {found}")]
    InvalidMetaInformationType {
        /// Category the dispatcher handles.
        expected: MessageCategory,
        /// Category of the supplied meta information.
        found: MessageCategory,
    },

    /// A reply was requested for a message that is not a command.
    #[error("message '{0}' is not a command and cannot be replied to")]
    NotACommand(String),

    /// The message body could not be downcast to the type a handler expects.
    #[error("message '{name}' does not carry a {expected} body")]
    UnexpectedBodyType {
        /// Name of the message.
        name: String,
        /// Rust type the handler expected.
        expected: &'static str,
    },

    /// The message is not legal at the boundary that inspected it.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A unit identifier string could not be parsed.
    #[error("invalid unit id '{0}'")]
    InvalidUnitId(String),

    /// A handler name pattern could not be compiled.
    #[error("invalid handler pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Parser error.
        reason: String,
    },

    /// Encoding or decoding of a message failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The transport is unavailable or failed.
    #[error("network error: {0}")]
    Network(String),
}

/// Legality failures detected by the bus router or the network router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// A component addressed itself directly instead of using the local channel.
    #[error("message '{name}' is directly addressed to its own component {target}")]
    SelfDirectedMessage {
        /// Message name.
        name: String,
        /// The resolved target.
        target: String,
    },

    /// A message arrived from the network for a different component.
    #[error("message '{name}' for {target} was delivered to {component}")]
    MisroutedMessage {
        /// Message name.
        name: String,
        /// The resolved target.
        target: String,
        /// The component that received it.
        component: String,
    },

    /// A local message claims to have entered from the network.
    #[error("local message '{0}' did not originate in this process")]
    ForeignLocalMessage(String),

    /// A local message reached the network engine.
    #[error("local message '{0}' must never reach the network")]
    LocalMessageToNetwork(String),

    /// A direct message has no resolvable target.
    #[error("message '{0}' carries no resolvable target")]
    MissingTarget(String),
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for MessageError {
    fn from(err: std::io::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Converts a `SendError` from Tokio's MPSC channel to a `MessageError`.
impl<T> From<tokio::sync::mpsc::error::SendError<T>> for MessageError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Network("transport channel closed".into())
    }
}
