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

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters describing what a [`MessageBus`](crate::common::MessageBus) has done.
///
/// All counters are monotonic and updated with relaxed ordering; they are for
/// diagnostics, not synchronization.
#[derive(Debug, Default)]
pub struct BusStats {
    /// Messages that entered `dispatch`.
    pub dispatched: AtomicUsize,
    /// Handler invocations, successful or not.
    pub handler_invocations: AtomicUsize,
    /// Handler invocations that returned an error or panicked.
    pub handler_errors: AtomicUsize,
    /// Messages abandoned because a router rejected them.
    pub routing_errors: AtomicUsize,
    /// Locally routed messages that matched no handler.
    pub unhandled: AtomicUsize,
    /// Messages handed to the network engine.
    pub forwarded: AtomicUsize,
    /// Frames received from the network.
    pub received: AtomicUsize,
}

impl BusStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages that entered `dispatch`.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Handler invocations.
    #[must_use]
    pub fn handler_invocations(&self) -> usize {
        self.handler_invocations.load(Ordering::Relaxed)
    }

    /// Failed handler invocations.
    #[must_use]
    pub fn handler_errors(&self) -> usize {
        self.handler_errors.load(Ordering::Relaxed)
    }

    /// Messages rejected by a router.
    #[must_use]
    pub fn routing_errors(&self) -> usize {
        self.routing_errors.load(Ordering::Relaxed)
    }

    /// Locally routed messages nobody handled.
    #[must_use]
    pub fn unhandled(&self) -> usize {
        self.unhandled.load(Ordering::Relaxed)
    }

    /// Messages forwarded to the network.
    #[must_use]
    pub fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Frames received from the network.
    #[must_use]
    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }
}
