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
#![allow(dead_code)]

use std::sync::{Arc, Once};

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use unitbus::prelude::*;

pub mod messages;

use messages::register_test_messages;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests.
///
/// `RUST_LOG` overrides the default `unitbus=trace` filter.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,unitbus=trace"));

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_env_filter(filter)
            .with_test_writer()
            .compact()
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    });
}

/// Configuration for a component called `component/<unit>`.
pub fn test_config(unit: &str) -> BusConfig {
    let mut config = BusConfig::default();
    config.component.unit = unit.to_string();
    config
}

/// A bus for `component/<unit>` with every test message registered.
pub fn test_bus(unit: &str) -> anyhow::Result<MessageBus> {
    test_bus_with(test_config(unit))
}

/// A bus built from `config` with every test message registered.
pub fn test_bus_with(config: BusConfig) -> anyhow::Result<MessageBus> {
    initialize_tracing();
    let registry = Arc::new(MessageTypeRegistry::new());
    register_test_messages(&registry)?;
    Ok(MessageBus::from_config(config, registry)?)
}
