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

use std::any::Any;
use std::fmt::Debug;

use dyn_clone::DynClone;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::message::MessageCategory;

/// A concrete message type with a stable wire name.
///
/// Implemented by the [`bus_message`](unitbus_macro::bus_message) attribute, which
/// also implements exactly one of the category marker traits ([`Command`],
/// [`CommandReply`], [`Event`]). The name follows the
/// `<category>/<domain>/<action>[/reply]` convention and must be unique within a
/// [`MessageTypeRegistry`](crate::message::MessageTypeRegistry).
pub trait BusMessage:
    Any + Send + Sync + Debug + Clone + Serialize + DeserializeOwned + 'static
{
    /// Stable type tag carried on the wire.
    const NAME: &'static str;
    /// The category the type belongs to.
    const CATEGORY: MessageCategory;
}

/// Marker for command bodies.
pub trait Command: BusMessage {}

/// Marker for command reply bodies.
pub trait CommandReply: BusMessage {}

/// Marker for event bodies.
pub trait Event: BusMessage {}

/// Object-safe view of a message body stored inside an envelope.
///
/// A blanket implementation covers every [`BusMessage`], so user code never
/// implements this directly.
pub trait MessageBody: DynClone + Any + Send + Sync + Debug {
    /// Returns the body as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the body as mutable [`Any`] for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The registered name of the body type.
    fn body_name(&self) -> &'static str;

    /// Encodes the body into a JSON value.
    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error>;
}

dyn_clone::clone_trait_object!(MessageBody);

impl<T: BusMessage> MessageBody for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn body_name(&self) -> &'static str {
        T::NAME
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
