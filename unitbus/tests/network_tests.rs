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
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use unitbus::network::protocol::{read_frame, write_frame, FrameType, MAX_FRAME_SIZE};
use unitbus::network::{
    ClientConnectedEvent, ClientConnectionErrorEvent, ClientDisconnectedEvent, OutboundFrame,
};
use unitbus::prelude::*;
use unitbus_test::prelude::*;

use crate::setup::messages::{AuditEvent, CreateProject, CreateProjectReply};
use crate::setup::{test_bus, test_bus_with, test_config};

mod setup;

const WAIT: Duration = Duration::from_secs(5);

fn next_message(outbound: &mut UnboundedReceiver<OutboundFrame>) -> Vec<u8> {
    loop {
        match outbound.try_recv() {
            Ok(OutboundFrame::Message(bytes)) => return bytes,
            Ok(OutboundFrame::Heartbeat) => continue,
            Err(err) => panic!("expected a queued message frame: {err}"),
        }
    }
}

async fn next_event(events: &mut UnboundedReceiver<String>) -> String {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for a bus event")
        .expect("event channel closed")
}

async fn next_server_message(stream: &mut TcpStream) -> anyhow::Result<Vec<u8>> {
    loop {
        let frame = tokio::time::timeout(WAIT, read_frame(stream, MAX_FRAME_SIZE)).await??;
        match frame {
            Some((FrameType::Message, bytes)) => return Ok(bytes),
            Some((FrameType::Heartbeat, _)) => continue,
            None => anyhow::bail!("client closed the connection"),
        }
    }
}

fn network_service(events: mpsc::UnboundedSender<String>) -> MessageService {
    let connected = events.clone();
    let disconnected = events.clone();
    let failed = events.clone();
    MessageService::new("network")
        .on::<ClientConnectedEvent>(move |event, _| {
            let _ = connected.send(format!("connected:{}", event.server));
            Ok(())
        })
        .on::<ClientDisconnectedEvent>(move |_, _| {
            let _ = disconnected.send("disconnected".to_string());
            Ok(())
        })
        .on::<ClientConnectionErrorEvent>(move |_, _| {
            let _ = failed.send("connection-error".to_string());
            Ok(())
        })
        .on::<AuditEvent>(move |event, context| {
            let entrypoint = match context.entrypoint() {
                MessageEntrypoint::Local => "local",
                MessageEntrypoint::Server => "server",
            };
            let _ = events.send(format!("audit:{entrypoint}:{}", event.entry));
            Ok(())
        })
}

#[unitbus_test]
async fn command_round_trip_between_components() -> anyhow::Result<()> {
    let front = test_bus("front")?;
    let backend = test_bus("backend")?;
    let mut front_out = front.network().take_outbound().expect("outbound queue is available");
    let mut backend_out = backend.network().take_outbound().expect("outbound queue is available");

    backend.add_service(MessageService::new("projects").on::<CreateProject>(|command, context| {
        assert_eq!(context.entrypoint(), MessageEntrypoint::Server);
        assert_eq!(context.message().payload().binary("logo"), Some(&[1_u8, 2, 3][..]));
        context.reply(
            CreateProjectReply { project_id: 42 },
            true,
            format!("created {}", command.name),
        )?;
        Ok(())
    }));

    let replies = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&replies);
    let command = front
        .builder()
        .build_command(CreateProject {
            name: "alpha".to_string(),
            public: true,
        })
        .timeout(5)
        .payload("logo", vec![1_u8, 2, 3])
        .done(move |reply, success, message| {
            seen.lock().push((reply.clone(), success, message.to_string()));
        })
        .failed(|_, _| {})
        .emit(Channel::direct("component/backend"))?;
    let unique = command.unique().expect("commands carry a unique id").to_string();
    assert!(front.command_dispatcher().is_in_flight(&unique));

    backend.receive(&next_message(&mut front_out));
    assert_eq!(backend.command_dispatcher().in_flight(), 0);
    assert_eq!(backend.stats().forwarded(), 1);

    front.receive(&next_message(&mut backend_out));

    assert!(!front.command_dispatcher().is_in_flight(&unique));
    let replies = replies.lock();
    assert_eq!(replies.len(), 1);
    let (reply, success, message) = &replies[0];
    assert!(*success);
    assert_eq!(message, "created alpha");
    assert_eq!(reply.unique(), Some(unique.as_str()));
    assert_eq!(reply.trace(), command.trace());
    assert_eq!(
        reply.body_as::<CreateProjectReply>().map(|body| body.project_id),
        Some(42)
    );
    assert_eq!(reply.origin(), &UnitId::new("component", "backend"));
    assert_eq!(
        reply.hops(),
        &[
            UnitId::new("component", "front"),
            UnitId::new("component", "backend"),
            UnitId::new("component", "front"),
        ][..]
    );
    Ok(())
}

#[unitbus_test]
async fn messages_for_other_components_are_not_accepted() -> anyhow::Result<()> {
    let front = test_bus("front")?;
    let backend = test_bus("backend")?;
    let mut front_out = front.network().take_outbound().expect("outbound queue is available");
    let (events, mut received) = mpsc::unbounded_channel();
    backend.add_service(network_service(events));

    front
        .builder()
        .build_event(AuditEvent {
            entry: "misrouted".to_string(),
        })
        .emit(Channel::direct("component/archive"))?;
    backend.receive(&next_message(&mut front_out));

    assert!(received.try_recv().is_err());
    assert_eq!(backend.stats().routing_errors(), 1);
    Ok(())
}

#[unitbus_test]
async fn unregistered_types_are_dropped_on_receive() -> anyhow::Result<()> {
    let front = test_bus("front")?;
    let mut front_out = front.network().take_outbound().expect("outbound queue is available");
    let bare = MessageBus::from_config(test_config("backend"), Arc::new(MessageTypeRegistry::new()))?;

    front
        .builder()
        .build_event(AuditEvent {
            entry: "unknown".to_string(),
        })
        .emit(Channel::direct("component/backend"))?;
    bare.receive(&next_message(&mut front_out));

    assert_eq!(bare.stats().received(), 1);
    assert_eq!(bare.stats().dispatched(), 0);
    assert_eq!(bare.stats().routing_errors(), 1);
    Ok(())
}

#[unitbus_test]
async fn client_exchanges_frames_with_the_server() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();
    let mut config = test_config("front");
    config.network.server_address = Some(address.clone());
    config.network.reconnect_delay_ms = 50;
    config.messaging.tick_interval_ms = 10;
    let front = test_bus_with(config)?;
    let backend = test_bus("backend")?;
    let mut backend_out = backend.network().take_outbound().expect("outbound queue is available");

    let (events, mut received) = mpsc::unbounded_channel();
    front.add_service(network_service(events));
    let runner = front.clone();
    let run = tokio::spawn(async move { runner.run().await });

    let (mut stream, _) = tokio::time::timeout(WAIT, listener.accept()).await??;
    assert_eq!(next_event(&mut received).await, format!("connected:{address}"));
    assert!(front.network().is_connected());

    backend
        .builder()
        .build_event(AuditEvent {
            entry: "from backend".to_string(),
        })
        .emit(Channel::direct("component/front"))?;
    write_frame(&mut stream, FrameType::Message, &next_message(&mut backend_out)).await?;
    assert_eq!(next_event(&mut received).await, "audit:server:from backend");

    front
        .builder()
        .build_event(AuditEvent {
            entry: "from front".to_string(),
        })
        .emit(Channel::direct("component/backend"))?;
    let bytes = next_server_message(&mut stream).await?;
    let (message, meta) = backend.network().decode_inbound(&bytes)?;
    assert_eq!(message.name(), "event/audit/entry");
    assert_eq!(meta.entrypoint(), MessageEntrypoint::Server);
    assert_eq!(
        message.body_as::<AuditEvent>().map(|event| event.entry.as_str()),
        Some("from front")
    );

    drop(stream);
    assert_eq!(next_event(&mut received).await, "disconnected");
    let (_stream, _) = tokio::time::timeout(WAIT, listener.accept()).await??;
    assert_eq!(next_event(&mut received).await, format!("connected:{address}"));

    front.shutdown();
    tokio::time::timeout(WAIT, run).await???;
    assert!(!front.network().is_connected());
    Ok(())
}

#[unitbus_test]
async fn unreachable_server_raises_connection_errors() -> anyhow::Result<()> {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        listener.local_addr()?.to_string()
    };
    let mut config = test_config("front");
    config.network.server_address = Some(address);
    config.network.reconnect_delay_ms = 20;
    let front = test_bus_with(config)?;
    let (events, mut received) = mpsc::unbounded_channel();
    front.add_service(network_service(events));
    let runner = front.clone();
    let run = tokio::spawn(async move { runner.run().await });

    assert_eq!(next_event(&mut received).await, "connection-error");
    assert_eq!(next_event(&mut received).await, "connection-error");
    assert!(!front.network().is_connected());

    front.shutdown();
    tokio::time::timeout(WAIT, run).await???;
    Ok(())
}

#[unitbus_test]
async fn run_without_server_only_ticks() -> anyhow::Result<()> {
    let mut config = test_config("front");
    config.messaging.tick_interval_ms = 5;
    let front = test_bus_with(config)?;
    assert!(front.network().server_address().is_none());

    let runner = front.clone();
    let run = tokio::spawn(async move { runner.run().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    front.shutdown();
    tokio::time::timeout(WAIT, run).await???;

    assert!(front.network().take_outbound().is_some());
    Ok(())
}
