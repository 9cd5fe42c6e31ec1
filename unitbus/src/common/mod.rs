//! Component identity, configuration and the message bus itself.
//!
//! # Key Re-exported Components:
//!
//! *   [`MessageBus`]: The orchestrator every message passes through.
//! *   [`MessageService`]: A named group of handlers registered with the bus.
//! *   [`BusConfig`]: Configuration loaded from TOML, with defaults for every key.
//! *   [`UnitId`] and [`Channel`]: Addressing of components and messages.

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
pub use bus::MessageBus;
pub use bus_stats::BusStats;
pub use channel::Channel;
pub use component::ComponentData;
pub use config::{
    BusConfig, ComponentConfig, ConfigError, MessagingConfig, NetworkConfig, TracingConfig,
};
pub use logging::init_tracing;
pub use service::{HandlerFn, MessageHandler, MessageService};
pub use unit_id::UnitId;

// --- Submodules ---

/// Defines [`MessageBus`].
mod bus;
/// Defines [`BusStats`].
mod bus_stats;
mod channel;
/// Defines [`ComponentData`].
mod component;
/// Defines the configuration system.
pub mod config;
mod logging;
/// Defines [`MessageService`] and handler matching.
mod service;
/// Defines [`UnitId`].
mod unit_id;
