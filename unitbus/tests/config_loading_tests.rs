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
use std::io::Write;
use std::time::Duration;

use unitbus::common::{BusConfig, ConfigError};
use unitbus::prelude::*;

mod setup;

#[test]
fn loads_a_complete_file() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[component]
type = "component"
unit = "projects"
instance = "tab-1"

[messaging]
command_timeout_secs = 10
tick_interval_ms = 250

[network]
server_address = "127.0.0.1:9000"
reconnect_delay_ms = 500
keepalive_interval_ms = 0
max_frame_size = 1048576

[tracing]
level = "debug"
"#
    )?;

    let config = BusConfig::load_from(file.path())?;

    assert_eq!(
        config.component.unit_id(),
        UnitId::with_instance("component", "projects", "tab-1")
    );
    assert_eq!(config.component.unit_id().to_string(), "component/projects/tab-1");
    assert_eq!(config.messaging.command_timeout_secs, 10);
    assert_eq!(config.messaging.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.network.server_address.as_deref(), Some("127.0.0.1:9000"));
    assert_eq!(config.network.reconnect_delay(), Duration::from_millis(500));
    assert_eq!(config.network.keepalive_interval(), None);
    assert_eq!(config.network.max_frame_size, 1_048_576);
    assert_eq!(config.tracing.level, "debug");
    assert!(config.tracing.log_directory.is_none());
    Ok(())
}

#[test]
fn missing_sections_fall_back_to_defaults() -> anyhow::Result<()> {
    let config = BusConfig::from_toml_str(
        r#"
[messaging]
command_timeout_secs = 5
"#,
    )?;

    assert_eq!(config.messaging.command_timeout_secs, 5);
    assert_eq!(config.messaging.tick_interval_ms, 1_000);
    assert_eq!(config.component, BusConfig::default().component);
    assert_eq!(config.network, BusConfig::default().network);
    assert_eq!(
        config.network.keepalive_interval(),
        Some(Duration::from_millis(15_000))
    );
    Ok(())
}

#[test]
fn malformed_files_report_a_parse_error() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "[messaging\ncommand_timeout_secs = ")?;

    let result = BusConfig::load_from(file.path());

    assert!(matches!(result, Err(ConfigError::Parse { ref path, .. }) if path == file.path()));
    Ok(())
}

#[test]
fn missing_files_report_a_read_error() -> anyhow::Result<()> {
    let directory = tempfile::tempdir()?;
    let path = directory.path().join("absent.toml");

    let result = BusConfig::load_from(&path);

    assert!(matches!(result, Err(ConfigError::Read { .. })));
    Ok(())
}

#[test]
fn bus_identity_comes_from_the_component_section() -> anyhow::Result<()> {
    let config = BusConfig::from_toml_str(
        r#"
[component]
type = "service"
unit = "indexer"
"#,
    )?;

    let bus = setup::test_bus_with(config)?;

    assert_eq!(bus.component_id(), &UnitId::new("service", "indexer"));
    assert_eq!(bus.config().messaging.command_timeout_secs, 30);
    Ok(())
}
