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

use derive_new::new;

use crate::common::{Channel, UnitId};
use crate::message::{Message, MessageEntrypoint, MessageMetaInformation, RoutingError};

/// Decides whether a message reaches local handlers, the network, or both.
///
/// Applied by the bus to every message before delivery.
#[derive(Debug, Clone, new)]
pub struct MessageRouter {
    component: UnitId,
}

impl MessageRouter {
    /// The component this router decides for.
    #[must_use]
    pub const fn component(&self) -> &UnitId {
        &self.component
    }

    /// Checks that the message is legal given where it entered the process.
    ///
    /// # Errors
    ///
    /// * [`RoutingError::ForeignLocalMessage`] for a local message that arrived from
    ///   the network.
    /// * [`RoutingError::MissingTarget`] for a direct message without a resolvable
    ///   target.
    /// * [`RoutingError::SelfDirectedMessage`] for a locally composed message
    ///   addressed directly to this component.
    /// * [`RoutingError::MisroutedMessage`] for a network message addressed to
    ///   another component.
    pub fn verify_message(
        &self,
        message: &Message,
        meta: &MessageMetaInformation,
    ) -> Result<(), RoutingError> {
        match message.target() {
            Channel::Local => match meta.entrypoint() {
                MessageEntrypoint::Local => Ok(()),
                MessageEntrypoint::Server => Err(RoutingError::ForeignLocalMessage(message.name().to_string())),
            },
            Channel::Direct { target } => {
                let resolved = message
                    .target()
                    .unit_id()
                    .ok_or_else(|| RoutingError::MissingTarget(message.name().to_string()))?;
                match meta.entrypoint() {
                    MessageEntrypoint::Local if resolved == self.component => {
                        Err(RoutingError::SelfDirectedMessage {
                            name: message.name().to_string(),
                            target: target.clone(),
                        })
                    }
                    MessageEntrypoint::Server if resolved != self.component => {
                        Err(RoutingError::MisroutedMessage {
                            name: message.name().to_string(),
                            target: target.clone(),
                            component: self.component.to_string(),
                        })
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    /// `true` when the message is for handlers in this component.
    #[must_use]
    pub fn check_local_routing(&self, message: &Message, _meta: &MessageMetaInformation) -> bool {
        match message.target() {
            Channel::Local => true,
            Channel::Direct { .. } => message.target().unit_id().as_ref() == Some(&self.component),
        }
    }

    /// `true` when the message must be handed to the network engine. Only messages
    /// that entered here are forwarded, so nothing echoes back out.
    #[must_use]
    pub fn check_remote_routing(&self, message: &Message, meta: &MessageMetaInformation) -> bool {
        !message.target().is_local() && meta.entrypoint() == MessageEntrypoint::Local
    }
}
