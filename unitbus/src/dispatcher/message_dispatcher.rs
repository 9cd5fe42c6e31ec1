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

use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};

use crate::common::MessageHandler;
use crate::message::{Message, MessageCategory, MessageContext, MessageError, MessageMetaInformation};

/// Category-specific dispatch logic, one shared instance per category.
///
/// For every message the bus calls [`pre_dispatch`](Self::pre_dispatch) once,
/// [`dispatch`](Self::dispatch) once per matching handler, then
/// [`post_dispatch`](Self::post_dispatch). [`process`](Self::process) runs on every
/// bus tick.
pub trait MessageDispatcher: Send + Sync + Debug {
    /// The category this dispatcher serves.
    fn category(&self) -> MessageCategory;

    /// Rejects meta information built for another category.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidMetaInformationType`] on mismatch.
    fn verify_meta(&self, meta: &MessageMetaInformation) -> Result<(), MessageError> {
        if meta.category() == self.category() {
            Ok(())
        } else {
            Err(MessageError::InvalidMetaInformationType {
                expected: self.category(),
                found: meta.category(),
            })
        }
    }

    /// Runs before any handler sees the message.
    ///
    /// # Errors
    ///
    /// An error abandons delivery of the message.
    fn pre_dispatch(&self, _message: &Message, meta: &MessageMetaInformation) -> Result<(), MessageError> {
        self.verify_meta(meta)
    }

    /// Runs one handler as a unit of work. Handler errors and panics are reported
    /// through the context and [`context_error`](Self::context_error); they never
    /// escape.
    ///
    /// Returns `false` when the handler failed.
    fn dispatch(
        &self,
        message: &Message,
        meta: &MessageMetaInformation,
        handler: &MessageHandler,
        context: &mut MessageContext,
    ) -> bool {
        context.begin(meta.requires_reply());
        let outcome = {
            let context: &MessageContext = context;
            let _entered = context.span().enter();
            panic::catch_unwind(AssertUnwindSafe(|| handler.call(message, context)))
        };
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(panic) => Some(anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref()))),
        };
        let succeeded = failure.is_none();
        if let Some(err) = failure {
            context.report_error(&err);
            self.context_error(message, meta, context, &err);
        }
        context.end();
        succeeded
    }

    /// Runs after all handlers.
    fn post_dispatch(&self, _message: &Message, _meta: &MessageMetaInformation) {}

    /// Periodic hook driven by the bus tick.
    fn process(&self) {}

    /// Called when a handler for `message` failed. `context` still holds what the
    /// handler emitted before failing.
    fn context_error(
        &self,
        _message: &Message,
        _meta: &MessageMetaInformation,
        _context: &MessageContext,
        _error: &anyhow::Error,
    ) {
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
