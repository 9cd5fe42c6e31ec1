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

use crate::common::{BusConfig, UnitId};

/// Identity and configuration shared by everything running inside one component.
#[derive(Debug, Clone)]
pub struct ComponentData {
    id: UnitId,
    config: BusConfig,
}

impl ComponentData {
    /// Creates component data with an explicit id.
    #[must_use]
    pub const fn new(id: UnitId, config: BusConfig) -> Self {
        Self { id, config }
    }

    /// Creates component data whose id comes from the `[component]` section.
    #[must_use]
    pub fn from_config(config: BusConfig) -> Self {
        Self {
            id: config.component.unit_id(),
            config,
        }
    }

    /// Unit id of the component.
    #[must_use]
    pub const fn id(&self) -> &UnitId {
        &self.id
    }

    /// Configuration the component was started with.
    #[must_use]
    pub const fn config(&self) -> &BusConfig {
        &self.config
    }
}
