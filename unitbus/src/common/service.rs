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

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use glob::{MatchOptions, Pattern};

use crate::message::{Message, MessageContext, MessageError};
use crate::traits::BusMessage;

/// Boxed handler body.
pub type HandlerFn = Arc<dyn Fn(&Message, &MessageContext) -> anyhow::Result<()> + Send + Sync>;

/// `*` and `?` stay within one `/`-separated segment of a message name.
const NAME_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Clone)]
enum NameFilter {
    Exact(String),
    Pattern(Pattern),
}

impl NameFilter {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == name,
            Self::Pattern(pattern) => pattern.matches_with(name, NAME_MATCH),
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Exact(exact) => exact,
            Self::Pattern(pattern) => pattern.as_str(),
        }
    }
}

/// One entry of a service's handler table.
#[derive(Clone)]
pub struct MessageHandler {
    filter: NameFilter,
    expects: &'static str,
    handler: HandlerFn,
}

impl MessageHandler {
    /// The name or pattern the handler was registered for.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.filter.as_str()
    }

    /// Rust type the handler expects as body, or `"Message"` for envelope-level
    /// handlers.
    #[must_use]
    pub const fn expects(&self) -> &'static str {
        self.expects
    }

    /// Returns `true` if the handler wants messages called `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.filter.matches(name)
    }

    pub(crate) fn call(&self, message: &Message, context: &MessageContext) -> anyhow::Result<()> {
        (self.handler)(message, context)
    }
}

impl fmt::Debug for MessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHandler")
            .field("pattern", &self.pattern())
            .field("expects", &self.expects)
            .finish_non_exhaustive()
    }
}

/// A named collection of message handlers registered with the bus.
///
/// ```rust,ignore
/// let service = MessageService::new("projects")
///     .on::<CreateProjectCommand>(|command, ctx| {
///         ctx.reply(CreateProjectReply { id: store(command)? }, true, "created")?;
///         Ok(())
///     })
///     .on_pattern("event/project/*", |message, _ctx| {
///         tracing::info!(name = message.name(), "project changed");
///         Ok(())
///     })?;
/// bus.add_service(service);
/// ```
#[derive(Clone, Debug)]
pub struct MessageService {
    name: String,
    handlers: Vec<MessageHandler>,
}

impl MessageService {
    /// Creates a service without handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Handles messages of type `M`, receiving the typed body.
    #[must_use]
    pub fn on<M: BusMessage>(
        mut self,
        handler: impl Fn(&M, &MessageContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        let typed: HandlerFn = Arc::new(move |message: &Message, context: &MessageContext| {
            let body = message
                .body_as::<M>()
                .ok_or_else(|| MessageError::UnexpectedBodyType {
                    name: message.name().to_string(),
                    expected: type_name::<M>(),
                })?;
            handler(body, context)
        });
        self.handlers.push(MessageHandler {
            filter: NameFilter::Exact(M::NAME.to_string()),
            expects: type_name::<M>(),
            handler: typed,
        });
        self
    }

    /// Handles every message whose name matches `pattern`, receiving the envelope.
    ///
    /// Patterns use glob syntax; `*` matches within one segment, so
    /// `event/project/*` matches `event/project/list` but not
    /// `event/network/client-connected`.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidPattern`] if the pattern does not compile.
    pub fn on_pattern(
        mut self,
        pattern: &str,
        handler: impl Fn(&Message, &MessageContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Result<Self, MessageError> {
        let compiled = Pattern::new(pattern).map_err(|err| MessageError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })?;
        self.handlers.push(MessageHandler {
            filter: NameFilter::Pattern(compiled),
            expects: "Message",
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handlers in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[MessageHandler] {
        &self.handlers
    }

    /// Handlers that want messages called `name`, in registration order.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MessageHandler> + 'a {
        self.handlers.iter().filter(move |handler| handler.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Message, _: &MessageContext) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn wildcards_stay_within_a_segment() -> anyhow::Result<()> {
        let service = MessageService::new("projects")
            .on_pattern("event/project/*", noop)?
            .on_pattern("event/*", noop)?;

        let project: Vec<&str> = service.matching("event/project/list").map(MessageHandler::pattern).collect();
        assert_eq!(project, vec!["event/project/*"]);
        assert_eq!(service.matching("event/project/logbook").count(), 1);
        assert_eq!(service.matching("event/network/client-connected").count(), 0);
        assert_eq!(service.matching("event/started").count(), 1);
        Ok(())
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        let result = MessageService::new("broken").on_pattern("event/[project", noop);
        assert!(matches!(result, Err(MessageError::InvalidPattern { .. })));
    }
}
