//! Events the bus raises locally when the transport changes state.

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

use crate::prelude::*;

/// The transport connected to the configured server.
#[bus_message(event = "event/network/client-connected")]
pub struct ClientConnectedEvent {
    /// Address of the server.
    pub server: String,
}

/// The transport lost its connection.
#[bus_message(event = "event/network/client-disconnected")]
pub struct ClientDisconnectedEvent {
    /// Address of the server.
    pub server: String,
}

/// Connecting or talking to the server failed.
#[bus_message(event = "event/network/client-connection-error")]
pub struct ClientConnectionErrorEvent {
    /// Address of the server.
    pub server: String,
    /// Description of the failure.
    pub reason: String,
}
