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
use crate::message::{Message, RoutingError};

/// Legality checks at the transport boundary.
///
/// Local messages are never serialized, so seeing one here in either direction is
/// a hard failure.
#[derive(Debug, Clone, new)]
pub struct NetworkRouter {
    component: UnitId,
}

impl NetworkRouter {
    /// Checks a message about to be sent.
    ///
    /// # Errors
    ///
    /// [`RoutingError::LocalMessageToNetwork`], [`RoutingError::MissingTarget`] or
    /// [`RoutingError::SelfDirectedMessage`].
    pub fn verify_outbound(&self, message: &Message) -> Result<(), RoutingError> {
        let target = self.resolve(message)?;
        if target == self.component {
            return Err(RoutingError::SelfDirectedMessage {
                name: message.name().to_string(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    /// Checks a message that just arrived.
    ///
    /// # Errors
    ///
    /// [`RoutingError::LocalMessageToNetwork`] or [`RoutingError::MissingTarget`].
    pub fn verify_inbound(&self, message: &Message) -> Result<(), RoutingError> {
        self.resolve(message).map(|_| ())
    }

    fn resolve(&self, message: &Message) -> Result<UnitId, RoutingError> {
        match message.target() {
            Channel::Local => Err(RoutingError::LocalMessageToNetwork(message.name().to_string())),
            Channel::Direct { .. } => message
                .target()
                .unit_id()
                .ok_or_else(|| RoutingError::MissingTarget(message.name().to_string())),
        }
    }
}
