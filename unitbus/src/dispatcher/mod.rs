//! Per-category dispatch hooks.

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

pub use command_dispatcher::{CommandDispatcher, COMMAND_TIMED_OUT};
pub use command_reply_dispatcher::CommandReplyDispatcher;
pub use event_dispatcher::EventDispatcher;
pub use message_dispatcher::MessageDispatcher;

mod command_dispatcher;
mod command_reply_dispatcher;
mod event_dispatcher;
mod message_dispatcher;
