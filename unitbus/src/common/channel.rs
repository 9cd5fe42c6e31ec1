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

use serde::{Deserialize, Serialize};

use crate::common::UnitId;

/// The destination of a message.
///
/// `Local` messages never leave the process. `Direct` messages go to one named
/// component, which may be this one or a remote peer reached through the network
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Channel {
    /// Delivered only within the originating process.
    Local,
    /// Delivered to the component named by `target`.
    Direct {
        /// Unit id of the receiving component, in `type/unit[/instance]` form.
        target: String,
    },
}

impl Channel {
    /// Creates a direct channel to the given component.
    pub fn direct(target: impl ToString) -> Self {
        Self::Direct {
            target: target.to_string(),
        }
    }

    /// Returns `true` for the local channel.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    /// Resolves the target string of a direct channel.
    ///
    /// Returns `None` for the local channel and for targets that do not parse.
    #[must_use]
    pub fn unit_id(&self) -> Option<UnitId> {
        match self {
            Self::Local => None,
            Self::Direct { target } => target.parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_matches_envelope_contract() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_value(Channel::Local)?,
            serde_json::json!({ "type": "local" })
        );
        assert_eq!(
            serde_json::to_value(Channel::direct("server/gate"))?,
            serde_json::json!({ "type": "direct", "target": "server/gate" })
        );
        Ok(())
    }

    #[test]
    fn resolves_direct_targets() {
        let channel = Channel::direct(UnitId::new("server", "gate"));
        assert_eq!(channel.unit_id(), Some(UnitId::new("server", "gate")));
        assert!(Channel::Local.unit_id().is_none());
        assert!(Channel::direct("not-a-unit").unit_id().is_none());
    }
}
