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

use std::collections::VecDeque;
use std::fmt;
use std::future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::common::{BusConfig, BusStats, Channel, ComponentData, MessageHandler, MessageService, UnitId};
use crate::composer::MessageBuilder;
use crate::dispatcher::{CommandDispatcher, CommandReplyDispatcher, EventDispatcher, MessageDispatcher};
use crate::message::{
    Message, MessageCategory, MessageContext, MessageError, MessageMetaInformation, MessageTypeRegistry,
};
use crate::network::{
    ClientConnectedEvent, ClientConnectionErrorEvent, ClientDisconnectedEvent, ClientEvent, NetworkEngine,
};
use crate::router::MessageRouter;

type Queued = (Message, MessageMetaInformation);

struct BusInner {
    component: Arc<ComponentData>,
    registry: Arc<MessageTypeRegistry>,
    services: RwLock<Vec<MessageService>>,
    commands: Arc<CommandDispatcher>,
    replies: CommandReplyDispatcher,
    events: EventDispatcher,
    router: MessageRouter,
    network: NetworkEngine,
    queue: Mutex<VecDeque<Queued>>,
    draining: AtomicBool,
    stats: BusStats,
    shutdown: CancellationToken,
}

/// The orchestrator every message passes through.
///
/// `dispatch` is the single entry point for messages composed here and messages
/// decoded from the network. Delivery runs to completion on the calling thread;
/// messages emitted while a message is being delivered are queued and delivered
/// right after it, in order. Cloning the bus is cheap and clones share all state.
///
/// ```rust,ignore
/// let registry = Arc::new(MessageTypeRegistry::new());
/// registry.register::<PingCommand>()?;
/// registry.register::<PingReply>()?;
///
/// let bus = MessageBus::new(ComponentData::from_config(BusConfig::load()), registry)?;
/// bus.add_service(MessageService::new("ping").on::<PingCommand>(|_, ctx| {
///     ctx.reply(PingReply, true, "PONG")?;
///     Ok(())
/// }));
/// bus.builder().build_command(PingCommand).timeout(5).emit(Channel::Local)?;
/// bus.run().await?;
/// ```
#[derive(Clone)]
pub struct MessageBus {
    inner: Arc<BusInner>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("component", self.inner.component.id())
            .field("services", &self.inner.services.read().len())
            .field("in_flight", &self.inner.commands.in_flight())
            .finish_non_exhaustive()
    }
}

/// Clears the draining flag even if delivery unwinds.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl MessageBus {
    /// Creates a bus for `component` and registers the built-in message types.
    ///
    /// # Errors
    ///
    /// [`MessageError::DuplicateTypeRegistration`] if `registry` already binds a
    /// built-in name to another type.
    pub fn new(component: ComponentData, registry: Arc<MessageTypeRegistry>) -> Result<Self, MessageError> {
        registry.register_builtin_message_types()?;
        let id = component.id().clone();
        let commands = Arc::new(CommandDispatcher::new());
        let network = NetworkEngine::new(id.clone(), Arc::clone(&registry), component.config().network.clone());
        debug!(component = %id, "message bus created");
        Ok(Self {
            inner: Arc::new(BusInner {
                component: Arc::new(component),
                registry,
                services: RwLock::new(Vec::new()),
                replies: CommandReplyDispatcher::new(Arc::clone(&commands)),
                commands,
                events: EventDispatcher,
                router: MessageRouter::new(id),
                network,
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                stats: BusStats::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Creates a bus whose identity comes from the `[component]` section.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::new`].
    pub fn from_config(config: BusConfig, registry: Arc<MessageTypeRegistry>) -> Result<Self, MessageError> {
        Self::new(ComponentData::from_config(config), registry)
    }

    /// Unit id of this component.
    #[must_use]
    pub fn component_id(&self) -> &UnitId {
        self.inner.component.id()
    }

    /// Identity and configuration of this component.
    #[must_use]
    pub fn component_data(&self) -> Arc<ComponentData> {
        Arc::clone(&self.inner.component)
    }

    /// Configuration of this component.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        self.inner.component.config()
    }

    /// The message type registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<MessageTypeRegistry> {
        &self.inner.registry
    }

    /// The network engine.
    #[must_use]
    pub fn network(&self) -> &NetworkEngine {
        &self.inner.network
    }

    /// Delivery statistics.
    #[must_use]
    pub fn stats(&self) -> &BusStats {
        &self.inner.stats
    }

    /// The command dispatcher, which owns the in-flight registry.
    #[must_use]
    pub fn command_dispatcher(&self) -> &CommandDispatcher {
        &self.inner.commands
    }

    /// A fresh builder for composing messages from this component.
    #[must_use]
    pub fn builder(&self) -> MessageBuilder {
        MessageBuilder::new(self.clone())
    }

    /// Registers a service. Its handlers run after those of services registered
    /// earlier.
    pub fn add_service(&self, service: MessageService) {
        debug!(service = service.name(), handlers = service.handlers().len(), "service added");
        self.inner.services.write().push(service);
    }

    /// Removes every service called `name`. Returns `true` if one was removed.
    pub fn remove_service(&self, name: &str) -> bool {
        let mut services = self.inner.services.write();
        let before = services.len();
        services.retain(|service| service.name() != name);
        before != services.len()
    }

    /// Submits a message for delivery.
    ///
    /// Never fails: illegal messages are logged and dropped, handler failures are
    /// contained per handler.
    pub fn dispatch(&self, message: Message, meta: MessageMetaInformation) {
        self.inner.queue.lock().push_back((message, meta));
        loop {
            if self.inner.draining.swap(true, Ordering::AcqRel) {
                return;
            }
            {
                let _guard = DrainGuard(&self.inner.draining);
                while let Some((message, meta)) = self.next_queued() {
                    self.deliver(message, meta);
                }
            }
            if self.inner.queue.lock().is_empty() {
                return;
            }
        }
    }

    fn next_queued(&self) -> Option<Queued> {
        self.inner.queue.lock().pop_front()
    }

    fn dispatcher(&self, category: MessageCategory) -> &dyn MessageDispatcher {
        match category {
            MessageCategory::Command => &*self.inner.commands,
            MessageCategory::CommandReply => &self.inner.replies,
            MessageCategory::Event => &self.inner.events,
        }
    }

    #[instrument(skip_all, fields(message_name = message.name(), trace = message.trace()))]
    fn deliver(&self, message: Message, meta: MessageMetaInformation) {
        let inner = &self.inner;
        BusStats::record(&inner.stats.dispatched);

        if let Err(err) = inner.router.verify_message(&message, &meta) {
            BusStats::record(&inner.stats.routing_errors);
            error!(
                origin = %message.origin(),
                target = ?message.target(),
                entrypoint = ?meta.entrypoint(),
                "message rejected: {err}"
            );
            return;
        }

        if inner.router.check_remote_routing(&message, &meta) {
            match inner.network.send(&message) {
                Ok(()) => BusStats::record(&inner.stats.forwarded),
                Err(err) => {
                    BusStats::record(&inner.stats.routing_errors);
                    error!(target = ?message.target(), "forwarding failed: {err}");
                }
            }
        }

        let dispatcher = self.dispatcher(message.category());
        if let Err(err) = dispatcher.pre_dispatch(&message, &meta) {
            BusStats::record(&inner.stats.routing_errors);
            error!("pre-dispatch failed: {err}");
            return;
        }

        if inner.router.check_local_routing(&message, &meta) {
            let handlers = self.matching_handlers(message.name());
            if handlers.is_empty() {
                BusStats::record(&inner.stats.unhandled);
                if message.category() == MessageCategory::CommandReply {
                    debug!("no handler registered for reply");
                } else {
                    warn!(category = %message.category(), "no handler registered for message");
                }
            }
            for (service, handler) in handlers {
                BusStats::record(&inner.stats.handler_invocations);
                let mut context = MessageContext::new(self, &message, &meta, &service);
                if !dispatcher.dispatch(&message, &meta, &handler, &mut context) {
                    BusStats::record(&inner.stats.handler_errors);
                }
            }
        }

        dispatcher.post_dispatch(&message, &meta);
    }

    fn matching_handlers(&self, name: &str) -> Vec<(String, MessageHandler)> {
        self.inner
            .services
            .read()
            .iter()
            .flat_map(|service| {
                service
                    .matching(name)
                    .map(|handler| (service.name().to_string(), handler.clone()))
            })
            .collect()
    }

    /// Decodes a frame received from the network and dispatches it.
    pub fn receive(&self, bytes: &[u8]) {
        BusStats::record(&self.inner.stats.received);
        match self.inner.network.decode_inbound(bytes) {
            Ok((message, meta)) => self.dispatch(message, meta),
            Err(err) => {
                BusStats::record(&self.inner.stats.routing_errors);
                error!("inbound message dropped: {err}");
            }
        }
    }

    /// Runs one tick: dispatcher sweeps and transport keep-alive.
    pub fn process(&self) {
        for category in MessageCategory::ALL {
            self.dispatcher(category).process();
        }
        self.inner.network.process();
    }

    /// Turns a transport event into bus activity.
    pub fn handle_client_event(&self, event: ClientEvent) {
        let server = self.inner.network.server_address().unwrap_or_default().to_string();
        let builder = self.builder();
        let emitted = match event {
            ClientEvent::Frame(bytes) => {
                self.receive(&bytes);
                return;
            }
            ClientEvent::Connected => {
                self.inner.network.set_connected(true);
                builder.build_event(ClientConnectedEvent { server }).emit(Channel::Local)
            }
            ClientEvent::Disconnected => {
                self.inner.network.set_connected(false);
                builder.build_event(ClientDisconnectedEvent { server }).emit(Channel::Local)
            }
            ClientEvent::ConnectionError(reason) => builder
                .build_event(ClientConnectionErrorEvent { server, reason })
                .emit(Channel::Local),
        };
        if let Err(err) = emitted {
            error!("failed to raise client event: {err}");
        }
    }

    /// Starts the transport client and ticks [`process`](Self::process) until
    /// [`shutdown`](Self::shutdown) is called.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok(())` after shutdown.
    pub async fn run(&self) -> Result<(), MessageError> {
        let mut client_events = self.inner.network.start();
        let mut client_open = client_events.is_some();
        let mut ticker = tokio::time::interval(self.config().messaging.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(component = %self.component_id(), "message bus running");

        loop {
            tokio::select! {
                () = self.inner.shutdown.cancelled() => break,
                _ = ticker.tick() => self.process(),
                event = next_client_event(&mut client_events), if client_open => match event {
                    Some(event) => self.handle_client_event(event),
                    None => client_open = false,
                },
            }
        }

        info!(component = %self.component_id(), "message bus stopped");
        Ok(())
    }

    /// Stops [`run`](Self::run) and the transport client.
    pub fn shutdown(&self) {
        trace!("shutdown requested");
        self.inner.shutdown.cancel();
        self.inner.network.shutdown();
    }
}

async fn next_client_event(events: &mut Option<UnboundedReceiver<ClientEvent>>) -> Option<ClientEvent> {
    match events {
        Some(events) => events.recv().await,
        None => future::pending().await,
    }
}
