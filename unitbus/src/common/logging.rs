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

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::common::TracingConfig;

/// Installs the global tracing subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over `config.level`. With a log directory set, output
/// goes to a daily rolling `unitbus.log` through a non-blocking writer and the
/// returned guard must be kept alive for the lifetime of the process. Returns `None`
/// when logging goes to stdout or a subscriber is already installed.
#[must_use]
pub fn init_tracing(config: &TracingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NONE)
        .compact();

    match &config.log_directory {
        Some(directory) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, directory, "unitbus.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = builder.with_writer(writer).with_ansi(false).finish();
            tracing::subscriber::set_global_default(subscriber)
                .ok()
                .map(|()| guard)
        }
        None => {
            let subscriber = builder.finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            None
        }
    }
}
