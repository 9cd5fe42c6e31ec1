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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::common::{NetworkConfig, UnitId};
use crate::message::{
    CommandMetaInformation, CommandReplyMetaInformation, Message, MessageCategory,
    MessageEntrypoint, MessageError, MessageMetaInformation, MessageTypeRegistry, WireEnvelope,
};
use crate::network::{Client, ClientEvent, OutboundFrame};
use crate::router::NetworkRouter;

/// The boundary between the bus and the transport.
///
/// Outbound messages are checked by the [`NetworkRouter`], serialized into a
/// [`WireEnvelope`] and queued as frames for the [`Client`]. Inbound frames are
/// decoded back into typed messages with entrypoint `Server`.
#[derive(Debug)]
pub struct NetworkEngine {
    component: UnitId,
    registry: Arc<MessageTypeRegistry>,
    router: NetworkRouter,
    config: NetworkConfig,
    outbound_tx: UnboundedSender<OutboundFrame>,
    outbound_rx: Mutex<Option<UnboundedReceiver<OutboundFrame>>>,
    attached: AtomicBool,
    connected: AtomicBool,
    last_keepalive: Mutex<Instant>,
    cancel: CancellationToken,
}

impl NetworkEngine {
    /// Creates an engine for `component`.
    pub fn new(component: UnitId, registry: Arc<MessageTypeRegistry>, config: NetworkConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            router: NetworkRouter::new(component.clone()),
            component,
            registry,
            config,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            attached: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            last_keepalive: Mutex::new(Instant::now()),
            cancel: CancellationToken::new(),
        }
    }

    /// Serializes `message` and queues it for the server.
    ///
    /// # Errors
    ///
    /// Routing errors from [`NetworkRouter::verify_outbound`], serialization errors,
    /// or [`MessageError::Network`] when no transport will ever read the frame
    /// (no server address and nobody took the outbound queue) or the engine has
    /// shut down.
    pub fn send(&self, message: &Message) -> Result<(), MessageError> {
        self.router.verify_outbound(message)?;
        if !self.has_transport() {
            return Err(MessageError::Network("no transport configured".to_string()));
        }
        let bytes = WireEnvelope::from_message(message, &self.registry)?.to_bytes()?;
        trace!(message_name = message.name(), bytes = bytes.len(), "queueing outbound message");
        self.outbound_tx.send(OutboundFrame::Message(bytes))?;
        Ok(())
    }

    /// Rebuilds a message received from the network.
    ///
    /// The body type is resolved by name, this component is appended to the hops
    /// and the meta information is built with entrypoint `Server`.
    ///
    /// # Errors
    ///
    /// Decoding errors, or routing errors from [`NetworkRouter::verify_inbound`].
    pub fn decode_inbound(&self, bytes: &[u8]) -> Result<(Message, MessageMetaInformation), MessageError> {
        let mut message = WireEnvelope::from_bytes(bytes)?.into_message(&self.registry)?;
        message.push_hop(self.component.clone());
        self.router.verify_inbound(&message)?;

        let meta = match message.category() {
            MessageCategory::Command => {
                MessageMetaInformation::command(MessageEntrypoint::Server, CommandMetaInformation::new(0))
            }
            MessageCategory::CommandReply => MessageMetaInformation::command_reply(
                MessageEntrypoint::Server,
                CommandReplyMetaInformation::default(),
            ),
            MessageCategory::Event => MessageMetaInformation::event(MessageEntrypoint::Server),
        };
        trace!(message_name = message.name(), trace = message.trace(), "decoded inbound message");
        Ok((message, meta))
    }

    /// Takes the receiving end of the outbound frame queue.
    ///
    /// Returns `None` once taken, either by [`start`](Self::start) or a previous
    /// call.
    pub fn take_outbound(&self) -> Option<UnboundedReceiver<OutboundFrame>> {
        let outbound = self.outbound_rx.lock().take();
        if outbound.is_some() {
            self.attached.store(true, Ordering::Release);
        }
        outbound
    }

    /// Whether outbound frames have somewhere to go: a configured server or a
    /// consumer of [`take_outbound`](Self::take_outbound).
    #[must_use]
    pub fn has_transport(&self) -> bool {
        self.config.server_address.is_some() || self.attached.load(Ordering::Acquire)
    }

    /// Spawns the transport client when a server address is configured.
    ///
    /// Returns the stream of client events for the bus to consume.
    pub fn start(&self) -> Option<UnboundedReceiver<ClientEvent>> {
        let address = self.config.server_address.clone()?;
        let Some(outbound) = self.take_outbound() else {
            debug!("outbound queue already taken, not starting the client");
            return None;
        };
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let client = Client::new(address, &self.config, events_tx, self.cancel.child_token());
        tokio::spawn(client.run(outbound));
        Some(events_rx)
    }

    /// Server address from the configuration, if any.
    #[must_use]
    pub fn server_address(&self) -> Option<&str> {
        self.config.server_address.as_deref()
    }

    /// Whether the client currently holds a connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
        if connected {
            *self.last_keepalive.lock() = Instant::now();
        }
    }

    /// Queues a heartbeat when connected and the keep-alive interval has elapsed.
    pub fn process(&self) {
        let Some(interval) = self.config.keepalive_interval() else {
            return;
        };
        if !self.is_connected() {
            return;
        }
        let now = Instant::now();
        let mut last = self.last_keepalive.lock();
        if now.saturating_duration_since(*last) >= interval {
            *last = now;
            if self.outbound_tx.send(OutboundFrame::Heartbeat).is_err() {
                trace!("outbound queue closed, heartbeat dropped");
            }
        }
    }

    /// Stops the transport client.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.set_connected(false);
    }
}
