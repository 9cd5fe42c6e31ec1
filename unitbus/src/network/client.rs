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

use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::common::NetworkConfig;
use crate::message::MessageError;
use crate::network::protocol::{read_frame, write_frame, write_heartbeat, FrameType};

/// A frame waiting to be written to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// A serialized wire envelope.
    Message(Vec<u8>),
    /// A keep-alive.
    Heartbeat,
}

/// What the client reports back to the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A connection was established.
    Connected,
    /// The connection was lost or closed.
    Disconnected,
    /// Connecting or reading failed.
    ConnectionError(String),
    /// A message frame arrived.
    Frame(Vec<u8>),
}

/// Keeps one TCP connection to the configured server alive.
///
/// Outbound frames queue up while disconnected and are written once a connection
/// exists. After a failure the client waits `reconnect_delay` and tries again
/// until cancelled.
#[derive(Debug)]
pub struct Client {
    address: String,
    reconnect_delay: Duration,
    max_frame_size: usize,
    events: UnboundedSender<ClientEvent>,
    cancel: CancellationToken,
}

impl Client {
    /// Creates a client for `address`.
    pub fn new(
        address: impl Into<String>,
        config: &NetworkConfig,
        events: UnboundedSender<ClientEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            address: address.into(),
            reconnect_delay: config.reconnect_delay(),
            max_frame_size: config.max_frame_size,
            events,
            cancel,
        }
    }

    /// Connects, serves and reconnects until cancelled.
    pub async fn run(self, mut outbound: UnboundedReceiver<OutboundFrame>) {
        loop {
            let connect = tokio::select! {
                () = self.cancel.cancelled() => break,
                result = TcpStream::connect(&self.address) => result,
            };
            match connect {
                Ok(stream) => {
                    info!(address = %self.address, "connected");
                    self.notify(ClientEvent::Connected);
                    let outcome = self.serve(stream, &mut outbound).await;
                    if let Err(err) = outcome {
                        self.notify(ClientEvent::ConnectionError(err.to_string()));
                    }
                    self.notify(ClientEvent::Disconnected);
                }
                Err(err) => {
                    warn!(address = %self.address, "connection failed: {err}");
                    self.notify(ClientEvent::ConnectionError(err.to_string()));
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        debug!(address = %self.address, "client stopped");
    }

    fn notify(&self, event: ClientEvent) {
        if self.events.send(event).is_err() {
            trace!("client event dropped, bus is gone");
        }
    }

    async fn serve(
        &self,
        stream: TcpStream,
        outbound: &mut UnboundedReceiver<OutboundFrame>,
    ) -> Result<(), MessageError> {
        let (reader, mut writer) = stream.into_split();
        let connection = self.cancel.child_token();
        let reader_task = tokio::spawn(read_loop(
            reader,
            self.max_frame_size,
            self.events.clone(),
            connection.clone(),
        ));

        let written = loop {
            tokio::select! {
                () = connection.cancelled() => break Ok(()),
                frame = outbound.recv() => match frame {
                    Some(frame) => {
                        if let Err(err) = write_outbound(&mut writer, frame).await {
                            break Err(err);
                        }
                    }
                    None => break Ok(()),
                },
            }
        };
        connection.cancel();

        let read = reader_task
            .await
            .map_err(|err| MessageError::Network(format!("reader task failed: {err}")))
            .and_then(|result| result);
        written.and(read)
    }
}

async fn write_outbound(writer: &mut OwnedWriteHalf, frame: OutboundFrame) -> Result<(), MessageError> {
    match frame {
        OutboundFrame::Message(bytes) => write_frame(writer, FrameType::Message, &bytes).await,
        OutboundFrame::Heartbeat => write_heartbeat(writer).await,
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    max_frame_size: usize,
    events: UnboundedSender<ClientEvent>,
    connection: CancellationToken,
) -> Result<(), MessageError> {
    let result = loop {
        tokio::select! {
            () = connection.cancelled() => break Ok(()),
            frame = read_frame(&mut reader, max_frame_size) => match frame {
                Ok(Some((FrameType::Message, bytes))) => {
                    if events.send(ClientEvent::Frame(bytes)).is_err() {
                        break Ok(());
                    }
                }
                Ok(Some((FrameType::Heartbeat, _))) => trace!("heartbeat received"),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            },
        }
    };
    connection.cancel();
    result
}
